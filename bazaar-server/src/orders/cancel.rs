//! Order cancellation

use tracing::{info, warn};

use shared::{PaymentStatus, RefundStatus};

use crate::db::models::Order;
use crate::utils::{AppError, AppResult};

use super::manager::{Actor, OrderManager};

impl OrderManager {
    /// Cancel an order on behalf of its owner or an admin. Stock is
    /// restored for every line; a captured payment gets a best-effort
    /// refund that never blocks the cancellation itself.
    pub async fn cancel_order(
        &self,
        order_number: &str,
        actor: &Actor,
        reason: Option<String>,
    ) -> AppResult<Order> {
        let order = self.get_order(order_number).await?;
        self.require_access(&order, actor)?;

        if !order.status.is_cancellable() {
            return Err(AppError::state_conflict(format!(
                "Order cannot be cancelled from status {}",
                order.status
            )));
        }

        let note = match &reason {
            Some(r) => format!("Cancelled: {r}"),
            None => "Cancelled".to_string(),
        };
        // The guard re-checks cancellability inside the update, so a
        // racing shipment wins over a stale cancel request.
        let Some(cancelled) = self.orders.mark_cancelled(order_number, Some(note)).await? else {
            let current = self.get_order(order_number).await?;
            return Err(AppError::state_conflict(format!(
                "Order cannot be cancelled from status {}",
                current.status
            )));
        };
        info!(order_number, "Order cancelled");

        for item in &cancelled.items {
            if let Err(e) = self
                .variants
                .restore_stock(&item.variant_sku, item.quantity)
                .await
            {
                warn!(order_number, sku = %item.variant_sku, error = %e, "Stock restore failed during cancellation");
            }
        }

        if cancelled.payment.status == PaymentStatus::Paid {
            self.refund_best_effort(&cancelled, cancelled.total, "Order cancelled")
                .await;
        }

        self.get_order(order_number).await
    }

    /// Initiate a gateway refund and record it on the order. Failures
    /// are logged with a FAILED refund record left behind for manual
    /// follow-up.
    pub(super) async fn refund_best_effort(&self, order: &Order, amount: f64, reason: &str) {
        match self
            .gateway
            .initiate_refund(&order.order_number, amount, reason)
            .await
        {
            Ok(reference) => {
                info!(order_number = %order.order_number, amount, reference, "Refund initiated");
                if let Err(e) = self
                    .orders
                    .set_refund(
                        &order.order_number,
                        RefundStatus::Initiated,
                        amount,
                        Some(reference),
                    )
                    .await
                {
                    warn!(order_number = %order.order_number, error = %e, "Failed to record refund");
                }
            }
            Err(e) => {
                warn!(order_number = %order.order_number, amount, error = %e, "Refund initiation failed");
                if let Err(e) = self
                    .orders
                    .set_refund(&order.order_number, RefundStatus::Failed, amount, None)
                    .await
                {
                    warn!(order_number = %order.order_number, error = %e, "Failed to record failed refund");
                }
            }
        }
    }
}
