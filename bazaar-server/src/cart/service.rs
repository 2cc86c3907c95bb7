//! Cart operations

use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::warn;

use crate::coupons::CouponEngine;
use crate::db::models::{Cart, CartItem, CartItemInput, Variant};
use crate::db::repository::{
    CartRepository, ProductRepository, VariantRepository, strip_table_prefix,
};
use crate::utils::money::{round_money, to_decimal, to_f64};
use crate::utils::time::now_millis;
use crate::utils::{AppError, AppResult};

/// Build the cart owner key from exactly one of user id / guest session.
pub fn owner_key(user_id: Option<&str>, guest_session_id: Option<&str>) -> AppResult<String> {
    match (user_id, guest_session_id) {
        (Some(user), None) => Ok(format!("user:{user}")),
        (None, Some(guest)) => Ok(format!("guest:{guest}")),
        (Some(_), Some(_)) => Err(AppError::validation(
            "Provide either a user identity or a guest session, not both",
        )),
        (None, None) => Err(AppError::validation(
            "A user identity or guest session is required",
        )),
    }
}

/// Cart as returned to clients: refreshed items plus computed totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub subtotal: f64,
    pub coupon_code: Option<String>,
    pub discount: f64,
    pub total: f64,
    pub updated_at: i64,
}

#[derive(Clone)]
pub struct CartService {
    carts: CartRepository,
    products: ProductRepository,
    variants: VariantRepository,
    engine: CouponEngine,
}

impl CartService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            carts: CartRepository::new(db.clone()),
            products: ProductRepository::new(db.clone()),
            variants: VariantRepository::new(db.clone()),
            engine: CouponEngine::new(db),
        }
    }

    /// Resolve which variant an item payload refers to.
    ///
    /// Preference order: exact SKU, then attribute match on size/color,
    /// then the product's first variant. The last step exists for
    /// legacy clients that send no variant information at all; it can
    /// pick the wrong variant, so it is logged.
    pub async fn resolve_variant(&self, input: &CartItemInput) -> AppResult<Variant> {
        if let Some(sku) = &input.variant_sku {
            let variant = self
                .variants
                .find_by_sku(sku)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Variant {} not found", sku)))?;
            // A SKU from a different product must not be priced under
            // this product id.
            let requested = strip_table_prefix("product", &input.product_id);
            if variant.product.id.to_string() != requested {
                return Err(AppError::validation(format!(
                    "Variant {} does not belong to product {}",
                    sku, input.product_id
                )));
            }
            return Ok(variant);
        }

        let product_id = strip_table_prefix("product", &input.product_id);
        let candidates = self.variants.find_by_product(product_id).await?;
        if candidates.is_empty() {
            return Err(AppError::not_found(format!(
                "Product {} has no variants",
                input.product_id
            )));
        }

        if input.size.is_some() || input.color.is_some() {
            let matched = candidates.iter().find(|v| {
                let size_ok = input
                    .size
                    .as_ref()
                    .is_none_or(|s| v.attributes.get("size") == Some(s));
                let color_ok = input
                    .color
                    .as_ref()
                    .is_none_or(|c| v.attributes.get("color") == Some(c));
                size_ok && color_ok
            });
            if let Some(v) = matched {
                return Ok(v.clone());
            }
        }

        let first = candidates[0].clone();
        warn!(
            product = %input.product_id,
            resolved_sku = %first.sku,
            "No SKU or attribute match in cart payload, substituting first variant"
        );
        Ok(first)
    }

    /// Parent product for a resolved variant.
    pub async fn load_product(&self, variant: &Variant) -> AppResult<crate::db::models::Product> {
        self.products
            .find_by_id(&variant.product.id.to_string())
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))
    }

    pub async fn get_cart(&self, owner: &str) -> AppResult<CartView> {
        let cart = match self.carts.find_by_owner(owner).await? {
            Some(cart) => cart,
            None => return Ok(Self::empty_view()),
        };
        let refreshed = self.refresh(cart).await?;
        self.view(refreshed).await
    }

    pub async fn add_item(&self, owner: &str, input: CartItemInput) -> AppResult<CartView> {
        if input.quantity < 1 {
            return Err(AppError::validation("Quantity must be at least 1"));
        }
        let variant = self.resolve_variant(&input).await?;
        let product = self
            .products
            .find_by_id(&variant.product.id.to_string())
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))?;

        let mut cart = self
            .carts
            .find_by_owner(owner)
            .await?
            .unwrap_or_else(|| Self::new_cart(owner));

        match cart.items.iter_mut().find(|i| i.variant_sku == variant.sku) {
            Some(line) => line.quantity += input.quantity,
            None => cart.items.push(CartItem {
                product: variant.product.clone(),
                variant_sku: variant.sku.clone(),
                quantity: input.quantity,
                product_name: product.name.clone(),
                image: product.images.first().cloned(),
                unit_price: variant.selling_price,
                gst_rate: product.gst_rate,
                in_stock: variant.stock > 0,
            }),
        }

        let saved = self.carts.upsert(cart).await?;
        let refreshed = self.refresh(saved).await?;
        self.view(refreshed).await
    }

    /// Set a line's quantity; 0 removes the line.
    pub async fn update_item(&self, owner: &str, sku: &str, quantity: i32) -> AppResult<CartView> {
        if quantity < 0 {
            return Err(AppError::validation("Quantity cannot be negative"));
        }
        let mut cart = self
            .carts
            .find_by_owner(owner)
            .await?
            .ok_or_else(|| AppError::not_found("Cart not found"))?;

        if quantity == 0 {
            cart.items.retain(|i| i.variant_sku != sku);
        } else {
            let line = cart
                .items
                .iter_mut()
                .find(|i| i.variant_sku == sku)
                .ok_or_else(|| AppError::not_found(format!("Item {} not in cart", sku)))?;
            line.quantity = quantity;
        }

        let saved = self.carts.upsert(cart).await?;
        let refreshed = self.refresh(saved).await?;
        self.view(refreshed).await
    }

    pub async fn remove_item(&self, owner: &str, sku: &str) -> AppResult<CartView> {
        self.update_item(owner, sku, 0).await
    }

    pub async fn clear(&self, owner: &str) -> AppResult<()> {
        self.carts.delete_by_owner(owner).await?;
        Ok(())
    }

    /// Preview a coupon against the refreshed subtotal. Stores the code
    /// on the cart but never consumes a use.
    pub async fn apply_coupon(&self, owner: &str, code: &str) -> AppResult<CartView> {
        let mut cart = self
            .carts
            .find_by_owner(owner)
            .await?
            .ok_or_else(|| AppError::not_found("Cart not found"))?;
        cart = self.refresh(cart).await?;

        let subtotal = Self::subtotal(&cart.items);
        let (_, quote) = self.engine.validate(code, subtotal).await?;

        cart.coupon_code = Some(quote.code.clone());
        cart.discount_preview = quote.discount;
        let saved = self.carts.upsert(cart).await?;
        self.view(saved).await
    }

    pub async fn remove_coupon(&self, owner: &str) -> AppResult<CartView> {
        let mut cart = self
            .carts
            .find_by_owner(owner)
            .await?
            .ok_or_else(|| AppError::not_found("Cart not found"))?;
        cart.coupon_code = None;
        cart.discount_preview = 0.0;
        let saved = self.carts.upsert(cart).await?;
        let refreshed = self.refresh(saved).await?;
        self.view(refreshed).await
    }

    fn new_cart(owner: &str) -> Cart {
        let (user_id, guest_session_id) = match owner.split_once(':') {
            Some(("user", id)) => (Some(id.to_string()), None),
            Some(("guest", sid)) => (None, Some(sid.to_string())),
            _ => (None, None),
        };
        Cart {
            id: None,
            owner_key: owner.to_string(),
            user_id,
            guest_session_id,
            items: Vec::new(),
            coupon_code: None,
            discount_preview: 0.0,
            updated_at: now_millis(),
        }
    }

    fn empty_view() -> CartView {
        CartView {
            items: Vec::new(),
            subtotal: 0.0,
            coupon_code: None,
            discount: 0.0,
            total: 0.0,
            updated_at: now_millis(),
        }
    }

    fn subtotal(items: &[CartItem]) -> f64 {
        let sum = items
            .iter()
            .map(|i| to_decimal(i.unit_price) * rust_decimal::Decimal::from(i.quantity))
            .sum();
        round_money(to_f64(sum))
    }

    /// Pull current price, stock and gst for every line. Lines whose
    /// variant disappeared are dropped. Persists the refreshed snapshot.
    async fn refresh(&self, mut cart: Cart) -> AppResult<Cart> {
        let mut refreshed = Vec::with_capacity(cart.items.len());
        for mut item in cart.items {
            let Some(variant) = self.variants.find_by_sku(&item.variant_sku).await? else {
                warn!(sku = %item.variant_sku, "Dropping cart line for removed variant");
                continue;
            };
            if let Some(product) = self
                .products
                .find_by_id(&variant.product.id.to_string())
                .await?
            {
                item.product_name = product.name;
                item.image = product.images.first().cloned();
                item.gst_rate = product.gst_rate;
            }
            item.unit_price = variant.selling_price;
            item.in_stock = variant.is_active && variant.stock >= item.quantity;
            refreshed.push(item);
        }
        cart.items = refreshed;
        self.carts.upsert(cart).await.map_err(AppError::from)
    }

    async fn view(&self, cart: Cart) -> AppResult<CartView> {
        let subtotal = Self::subtotal(&cart.items);

        // Re-check the stored coupon against the refreshed subtotal; a
        // coupon that no longer qualifies shows a zero preview rather
        // than failing the read.
        let (coupon_code, discount) = match &cart.coupon_code {
            Some(code) => match self.engine.validate(code, subtotal).await {
                Ok((_, quote)) => (Some(quote.code), quote.discount),
                Err(AppError::Coupon(rej)) => {
                    warn!(code = %code, reason = %rej, "Stored cart coupon no longer valid");
                    (Some(code.clone()), 0.0)
                }
                Err(e) => return Err(e),
            },
            None => (None, 0.0),
        };

        let total = round_money(to_f64(to_decimal(subtotal) - to_decimal(discount)));
        Ok(CartView {
            items: cart.items,
            subtotal,
            coupon_code,
            discount,
            total,
            updated_at: cart.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CategoryCreate, CouponCreate, ProductCreate, VariantCreate};
    use crate::db::repository::{CategoryRepository, CouponRepository};
    use crate::db::testing::memory_db;
    use shared::DiscountType;
    use std::collections::BTreeMap;

    async fn seed_product(db: &Surreal<Db>) -> (String, String, String) {
        let category = CategoryRepository::new(db.clone())
            .create(CategoryCreate {
                name: "Shirts".to_string(),
                sort_order: None,
            })
            .await
            .unwrap();
        let cat_id = category.id.unwrap().id.to_string();

        let products = ProductRepository::new(db.clone());
        let product = products
            .create(&ProductCreate {
                name: "Oxford Shirt".to_string(),
                description: None,
                category: cat_id.clone(),
                images: Some(vec!["shirt.jpg".to_string()]),
                gst_rate: Some(12),
                variants: vec![],
            })
            .await
            .unwrap();
        let product_id = product.id.unwrap().id.to_string();

        let variants = VariantRepository::new(db.clone());
        let mut attrs_m = BTreeMap::new();
        attrs_m.insert("size".to_string(), "M".to_string());
        variants
            .create(
                &product_id,
                &VariantCreate {
                    sku: "OXF-M".to_string(),
                    selling_price: 999.0,
                    mrp: 1299.0,
                    stock: 10,
                    attributes: Some(attrs_m),
                },
            )
            .await
            .unwrap();
        let mut attrs_l = BTreeMap::new();
        attrs_l.insert("size".to_string(), "L".to_string());
        variants
            .create(
                &product_id,
                &VariantCreate {
                    sku: "OXF-L".to_string(),
                    selling_price: 999.0,
                    mrp: 1299.0,
                    stock: 0,
                    attributes: Some(attrs_l),
                },
            )
            .await
            .unwrap();

        (cat_id, product_id, "OXF-M".to_string())
    }

    #[test]
    fn owner_key_requires_exactly_one_identity() {
        assert_eq!(owner_key(Some("u1"), None).unwrap(), "user:u1");
        assert_eq!(owner_key(None, Some("g1")).unwrap(), "guest:g1");
        assert!(owner_key(None, None).is_err());
        assert!(owner_key(Some("u1"), Some("g1")).is_err());
    }

    #[tokio::test]
    async fn sku_from_another_product_is_rejected() {
        let db = memory_db().await;
        let (cat_id, product_id, sku) = seed_product(&db).await;

        let other = ProductRepository::new(db.clone())
            .create(&ProductCreate {
                name: "Linen Shirt".to_string(),
                description: None,
                category: cat_id,
                images: None,
                gst_rate: Some(12),
                variants: vec![],
            })
            .await
            .unwrap();
        let other_id = other.id.unwrap().id.to_string();

        let service = CartService::new(db);
        let err = service
            .resolve_variant(&CartItemInput {
                product_id: other_id,
                variant_sku: Some(sku.clone()),
                quantity: 1,
                size: None,
                color: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // The matching pair still resolves.
        let variant = service
            .resolve_variant(&CartItemInput {
                product_id,
                variant_sku: Some(sku.clone()),
                quantity: 1,
                size: None,
                color: None,
            })
            .await
            .unwrap();
        assert_eq!(variant.sku, sku);
    }

    #[tokio::test]
    async fn add_merges_same_sku_and_totals_refresh() {
        let db = memory_db().await;
        let (_, product_id, sku) = seed_product(&db).await;
        let service = CartService::new(db);

        let input = CartItemInput {
            product_id: product_id.clone(),
            variant_sku: Some(sku.clone()),
            quantity: 1,
            size: None,
            color: None,
        };
        service.add_item("user:u1", input.clone()).await.unwrap();
        let view = service.add_item("user:u1", input).await.unwrap();

        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 2);
        assert_eq!(view.subtotal, 1998.0);
        assert_eq!(view.total, 1998.0);
    }

    #[tokio::test]
    async fn attribute_match_beats_first_variant() {
        let db = memory_db().await;
        let (_, product_id, _) = seed_product(&db).await;
        let service = CartService::new(db);

        let variant = service
            .resolve_variant(&CartItemInput {
                product_id,
                variant_sku: None,
                quantity: 1,
                size: Some("L".to_string()),
                color: None,
            })
            .await
            .unwrap();
        assert_eq!(variant.sku, "OXF-L");
    }

    #[tokio::test]
    async fn missing_attributes_fall_back_to_first_variant() {
        let db = memory_db().await;
        let (_, product_id, _) = seed_product(&db).await;
        let service = CartService::new(db);

        let variant = service
            .resolve_variant(&CartItemInput {
                product_id,
                variant_sku: None,
                quantity: 1,
                size: None,
                color: None,
            })
            .await
            .unwrap();
        // Deterministic only in that it picks some variant of the product.
        assert!(variant.sku.starts_with("OXF-"));
    }

    #[tokio::test]
    async fn out_of_stock_line_is_flagged_not_removed() {
        let db = memory_db().await;
        let (_, product_id, _) = seed_product(&db).await;
        let service = CartService::new(db);

        let view = service
            .add_item(
                "guest:g1",
                CartItemInput {
                    product_id,
                    variant_sku: Some("OXF-L".to_string()),
                    quantity: 1,
                    size: None,
                    color: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(view.items.len(), 1);
        assert!(!view.items[0].in_stock);
    }

    #[tokio::test]
    async fn coupon_preview_does_not_consume_usage() {
        let db = memory_db().await;
        let (_, product_id, sku) = seed_product(&db).await;
        let coupons = CouponRepository::new(db.clone());
        coupons
            .create(&CouponCreate {
                code: "FLAT100".to_string(),
                discount_type: DiscountType::Fixed,
                value: 100.0,
                max_discount: None,
                min_order_value: None,
                usage_limit: Some(5),
                valid_from: None,
                valid_until: None,
            })
            .await
            .unwrap();

        let service = CartService::new(db.clone());
        service
            .add_item(
                "user:u2",
                CartItemInput {
                    product_id,
                    variant_sku: Some(sku),
                    quantity: 1,
                    size: None,
                    color: None,
                },
            )
            .await
            .unwrap();

        let view = service.apply_coupon("user:u2", "flat100").await.unwrap();
        assert_eq!(view.discount, 100.0);
        assert_eq!(view.total, 899.0);

        let coupon = coupons.find_by_code("FLAT100").await.unwrap().unwrap();
        assert_eq!(coupon.used_count, 0);

        let view = service.remove_coupon("user:u2").await.unwrap();
        assert_eq!(view.discount, 0.0);
        assert_eq!(view.total, 999.0);
    }
}
