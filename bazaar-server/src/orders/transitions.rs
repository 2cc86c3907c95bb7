//! Fulfillment status transitions

use tracing::{info, warn};

use shared::OrderStatus;

use crate::db::models::Order;
use crate::notify::Recipient;
use crate::utils::{AppError, AppResult};

use super::manager::OrderManager;

impl OrderManager {
    /// Move an order along the fulfillment path. Rejected transitions
    /// report the statuses the order would have to be in, so the error
    /// is actionable for the operator.
    pub async fn update_status(
        &self,
        order_number: &str,
        next: OrderStatus,
        note: Option<String>,
    ) -> AppResult<Order> {
        let order = self.get_order(order_number).await?;
        if !order.status.can_transition_to(next) {
            return Err(Self::transition_error(order.status, next));
        }

        let updated = self
            .orders
            .transition(order_number, order.status, next, note)
            .await?;
        let Some(updated) = updated else {
            // The order moved between our read and the guarded update.
            let current = self.get_order(order_number).await?;
            return Err(Self::transition_error(current.status, next));
        };
        info!(order_number, status = %next, "Order status updated");

        self.notify_shipping_update(&updated).await;
        Ok(updated)
    }

    pub async fn mark_processing(&self, order_number: &str) -> AppResult<Order> {
        self.update_status(order_number, OrderStatus::Processing, None)
            .await
    }

    pub async fn mark_shipped(&self, order_number: &str, note: Option<String>) -> AppResult<Order> {
        self.update_status(order_number, OrderStatus::Shipped, note)
            .await
    }

    pub async fn mark_out_for_delivery(&self, order_number: &str) -> AppResult<Order> {
        self.update_status(order_number, OrderStatus::OutForDelivery, None)
            .await
    }

    pub async fn mark_delivered(&self, order_number: &str) -> AppResult<Order> {
        self.update_status(order_number, OrderStatus::Delivered, None)
            .await
    }

    fn transition_error(current: OrderStatus, next: OrderStatus) -> AppError {
        let allowed = OrderStatus::allowed_predecessors(next)
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        AppError::state_conflict(format!(
            "Order must be in one of these statuses to be marked as {}: {} (currently {})",
            next, allowed, current
        ))
    }

    async fn notify_shipping_update(&self, order: &Order) {
        if !matches!(
            order.status,
            OrderStatus::Shipped | OrderStatus::OutForDelivery | OrderStatus::Delivered
        ) {
            return;
        }
        let recipient = Recipient::from_order(order);
        if let Err(e) = self
            .notify
            .send_shipping_update(
                &recipient,
                &order.order_number,
                &order.status.to_string(),
                order.tracking.tracking_code.as_deref(),
            )
            .await
        {
            warn!(order_number = %order.order_number, error = %e, "Shipping update notification failed");
        }
    }
}
