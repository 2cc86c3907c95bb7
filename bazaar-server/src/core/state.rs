//! Shared server state

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::cart::CartService;
use crate::coupons::CouponEngine;
use crate::gateway::PaymentGateway;
use crate::notify::NotificationSink;
use crate::orders::OrderManager;
use crate::shipping::ShippingProvider;

/// Cloned into every handler; everything inside is cheap to clone.
#[derive(Clone)]
pub struct ServerState {
    db: Surreal<Db>,
    jwt: Arc<JwtService>,
    orders: OrderManager,
    cart: CartService,
    coupons: CouponEngine,
    shipping: Arc<dyn ShippingProvider>,
}

impl ServerState {
    pub fn new(
        db: Surreal<Db>,
        jwt: JwtService,
        gateway: Arc<dyn PaymentGateway>,
        shipping: Arc<dyn ShippingProvider>,
        notify: Arc<dyn NotificationSink>,
    ) -> Self {
        let orders = OrderManager::new(db.clone(), gateway, shipping.clone(), notify);
        let cart = CartService::new(db.clone());
        let coupons = CouponEngine::new(db.clone());
        Self {
            db,
            jwt: Arc::new(jwt),
            orders,
            cart,
            coupons,
            shipping,
        }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub fn orders(&self) -> &OrderManager {
        &self.orders
    }

    pub fn cart(&self) -> &CartService {
        &self.cart
    }

    pub fn coupons(&self) -> &CouponEngine {
        &self.coupons
    }

    pub fn shipping(&self) -> &Arc<dyn ShippingProvider> {
        &self.shipping
    }
}
