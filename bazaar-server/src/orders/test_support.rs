//! Shared fixtures for order workflow tests

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use shared::PaymentMethod;

use crate::db::models::{
    CategoryCreate, OrderCreate, OrderItemInput, ProductCreate, ShippingAddress, VariantCreate,
};
use crate::db::repository::{CategoryRepository, ProductRepository, VariantRepository};
use crate::db::testing::memory_db;
use crate::gateway::mock::MockGateway;
use crate::notify::testing::CountingSink;
use crate::shipping::NoopShippingProvider;

use super::manager::OrderManager;

pub struct TestRig {
    pub db: Surreal<Db>,
    pub manager: OrderManager,
    pub gateway: Arc<MockGateway>,
    pub notify: Arc<CountingSink>,
    /// product id (bare, no table prefix)
    pub product_id: String,
}

/// Memory database with one product ("Kurta", GST 12%) in two variants:
/// KUR-M at 500.00 with stock 10, KUR-L at 500.00 with stock 2.
pub async fn rig_with_gateway(gateway: MockGateway) -> TestRig {
    let db = memory_db().await;

    let category = CategoryRepository::new(db.clone())
        .create(CategoryCreate {
            name: "Clothing".to_string(),
            sort_order: None,
        })
        .await
        .unwrap();
    let category_id = category.id.unwrap().id.to_string();

    let product = ProductRepository::new(db.clone())
        .create(&ProductCreate {
            name: "Kurta".to_string(),
            description: None,
            category: category_id,
            images: None,
            gst_rate: Some(12),
            variants: vec![],
        })
        .await
        .unwrap();
    let product_id = product.id.unwrap().id.to_string();

    let variants = VariantRepository::new(db.clone());
    for (sku, stock) in [("KUR-M", 10), ("KUR-L", 2)] {
        variants
            .create(
                &product_id,
                &VariantCreate {
                    sku: sku.to_string(),
                    selling_price: 500.0,
                    mrp: 700.0,
                    stock,
                    attributes: None,
                },
            )
            .await
            .unwrap();
    }

    let gateway = Arc::new(gateway);
    let notify = Arc::new(CountingSink::default());
    let manager = OrderManager::new(
        db.clone(),
        gateway.clone(),
        Arc::new(NoopShippingProvider),
        notify.clone(),
    );

    TestRig {
        db,
        manager,
        gateway,
        notify,
        product_id,
    }
}

pub async fn rig() -> TestRig {
    rig_with_gateway(MockGateway::pending()).await
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        name: "Asha Rao".to_string(),
        phone: "9999000011".to_string(),
        line1: "12 MG Road".to_string(),
        line2: None,
        city: "Bengaluru".to_string(),
        state: "KA".to_string(),
        pincode: "560001".to_string(),
        country: "IN".to_string(),
        email: Some("asha@example.com".to_string()),
    }
}

pub fn order_input(product_id: &str, sku: &str, quantity: i32, method: PaymentMethod) -> OrderCreate {
    OrderCreate {
        items: vec![OrderItemInput {
            product_id: product_id.to_string(),
            variant_sku: Some(sku.to_string()),
            quantity,
            size: None,
            color: None,
        }],
        shipping_address: address(),
        payment_method: method,
        coupon_code: None,
        guest_session_id: None,
    }
}
