//! Order manager: construction, lookup and ownership helpers, plus the
//! small standalone operations (delete, guest reassignment).

use std::sync::Arc;

use rand::Rng;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::info;

use shared::{OrderStatus, PaymentStatus};

use crate::auth::CurrentUser;
use crate::cart::CartService;
use crate::coupons::CouponEngine;
use crate::db::models::Order;
use crate::db::repository::{OrderQuery, OrderRepository, VariantRepository};
use crate::gateway::PaymentGateway;
use crate::notify::NotificationSink;
use crate::shipping::ShippingProvider;
use crate::utils::time::now_millis;
use crate::utils::{AppError, AppResult};

/// Who is performing an order operation.
#[derive(Debug, Clone, Default)]
pub struct Actor {
    pub user_id: Option<String>,
    pub guest_session_id: Option<String>,
    pub is_admin: bool,
}

impl Actor {
    pub fn admin() -> Self {
        Self {
            user_id: None,
            guest_session_id: None,
            is_admin: true,
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self {
            user_id: Some(id.into()),
            guest_session_id: None,
            is_admin: false,
        }
    }

    pub fn guest(session: impl Into<String>) -> Self {
        Self {
            user_id: None,
            guest_session_id: Some(session.into()),
            is_admin: false,
        }
    }

    pub fn from_current_user(user: &CurrentUser) -> Self {
        Self {
            user_id: Some(user.user_id.clone()),
            guest_session_id: None,
            is_admin: user.is_admin(),
        }
    }
}

#[derive(Clone)]
pub struct OrderManager {
    pub(super) orders: OrderRepository,
    pub(super) variants: VariantRepository,
    pub(super) cart_service: CartService,
    pub(super) coupons: CouponEngine,
    pub(super) gateway: Arc<dyn PaymentGateway>,
    pub(super) shipping: Arc<dyn ShippingProvider>,
    pub(super) notify: Arc<dyn NotificationSink>,
}

impl OrderManager {
    pub fn new(
        db: Surreal<Db>,
        gateway: Arc<dyn PaymentGateway>,
        shipping: Arc<dyn ShippingProvider>,
        notify: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            orders: OrderRepository::new(db.clone()),
            variants: VariantRepository::new(db.clone()),
            cart_service: CartService::new(db.clone()),
            coupons: CouponEngine::new(db),
            gateway,
            shipping,
            notify,
        }
    }

    /// Generate a new order number: ORD-<millis>-<4 random digits>.
    /// Also used as the gateway-side order reference.
    pub(super) fn next_order_number() -> String {
        let suffix: u16 = rand::thread_rng().gen_range(1000..10000);
        format!("ORD-{}-{}", now_millis(), suffix)
    }

    pub async fn get_order(&self, order_number: &str) -> AppResult<Order> {
        self.orders
            .find_by_order_number(order_number)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {} not found", order_number)))
    }

    /// Owner-or-admin gate used by cancel, returns and order reads.
    pub(super) fn require_access(&self, order: &Order, actor: &Actor) -> AppResult<()> {
        if actor.is_admin {
            return Ok(());
        }
        if order.is_owned_by(actor.user_id.as_deref(), actor.guest_session_id.as_deref()) {
            return Ok(());
        }
        Err(AppError::forbidden("You do not have access to this order"))
    }

    pub async fn get_order_for(&self, order_number: &str, actor: &Actor) -> AppResult<Order> {
        let order = self.get_order(order_number).await?;
        self.require_access(&order, actor)?;
        Ok(order)
    }

    pub async fn list_orders(&self, filter: &OrderQuery) -> AppResult<(Vec<Order>, u64)> {
        Ok(self.orders.list(filter).await?)
    }

    /// Hard delete, only while payment is still PENDING. Restores stock
    /// so abandoned checkouts do not leave it reserved forever; a
    /// cancelled order already restored its stock at cancellation and
    /// must not restore it twice.
    pub async fn delete_order(&self, order_number: &str) -> AppResult<()> {
        let order = self.get_order(order_number).await?;
        if order.payment.status != PaymentStatus::Pending {
            return Err(AppError::state_conflict(
                "Only orders with pending payment can be deleted",
            ));
        }
        if order.status != OrderStatus::Cancelled {
            for item in &order.items {
                self.variants
                    .restore_stock(&item.variant_sku, item.quantity)
                    .await?;
            }
        }
        self.orders.delete(order_number).await?;
        info!(order_number, "Deleted order");
        Ok(())
    }

    /// Claim guest orders for a freshly authenticated user. Returns the
    /// number of orders moved.
    pub async fn claim_guest_orders(
        &self,
        guest_session_id: &str,
        user_id: &str,
    ) -> AppResult<u64> {
        let moved = self
            .orders
            .reassign_guest_orders(guest_session_id, user_id)
            .await?;
        if moved > 0 {
            info!(guest_session_id, user_id, moved, "Reassigned guest orders");
        }
        Ok(moved)
    }
}
