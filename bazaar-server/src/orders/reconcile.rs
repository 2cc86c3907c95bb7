//! Payment reconciliation
//!
//! Callback and webhook both end up here with a normalized payload.
//! The inbound payload is only a trigger: the gateway's status-query
//! API is the source of truth, which defends against forged or stale
//! notifications. Every path is idempotent; receiving the same event
//! twice, out of order, or on two instances at once converges on the
//! same final order state.

use tracing::{info, warn};

use shared::PaymentStatus;

use crate::db::models::{Order, TrackingInfo};
use crate::gateway::{CallbackData, GatewayPaymentStatus};
use crate::notify::Recipient;
use crate::utils::AppResult;

use super::manager::OrderManager;

/// What a payment event did to the order.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// Payment verified and the order moved to CONFIRMED just now.
    Confirmed(Order),
    /// Order was already PAID; nothing changed, nothing re-sent.
    AlreadyPaid(Order),
    /// Verified failure; order is in PAYMENT_FAILED.
    Failed(Order),
    /// Gateway still reports the payment in flight (or could not be
    /// reached); no state change.
    Pending(Order),
    /// Payment was captured for an order cancelled before settlement;
    /// the order stays CANCELLED and a refund was initiated.
    PaidAfterCancel(Order),
    /// Payload referenced an order we do not have.
    UnknownOrder,
}

impl ReconcileOutcome {
    pub fn order(&self) -> Option<&Order> {
        match self {
            ReconcileOutcome::Confirmed(o)
            | ReconcileOutcome::AlreadyPaid(o)
            | ReconcileOutcome::Failed(o)
            | ReconcileOutcome::Pending(o)
            | ReconcileOutcome::PaidAfterCancel(o) => Some(o),
            ReconcileOutcome::UnknownOrder => None,
        }
    }
}

impl OrderManager {
    /// Single reconciliation path shared by the redirect callback and
    /// the server-to-server webhook.
    pub async fn reconcile_payment(&self, event: &CallbackData) -> AppResult<ReconcileOutcome> {
        let Some(order) = self.orders.find_by_order_number(&event.order_id).await? else {
            warn!(order_id = %event.order_id, "Payment event for unknown order");
            return Ok(ReconcileOutcome::UnknownOrder);
        };

        if order.payment.status == PaymentStatus::Paid {
            return Ok(ReconcileOutcome::AlreadyPaid(order));
        }

        // Re-verify with the gateway instead of trusting the payload.
        let verified = match self.gateway.fetch_status(&order.order_number).await {
            Ok(status) => status,
            Err(e) => {
                warn!(
                    order_number = %order.order_number,
                    claimed = event.claimed_status.as_deref().unwrap_or("-"),
                    error = %e,
                    "Could not verify payment status with gateway, leaving order untouched"
                );
                return Ok(ReconcileOutcome::Pending(order));
            }
        };

        match verified {
            GatewayPaymentStatus::Paid { transaction_id } => {
                self.settle_paid(order, &transaction_id).await
            }
            GatewayPaymentStatus::Failed { reason } => {
                // The guard only fires from PENDING, so a verified
                // failure never downgrades an order that paid in the
                // meantime.
                let updated = self
                    .orders
                    .mark_payment_failed(&order.order_number, Some(reason.clone()))
                    .await?;
                match updated {
                    Some(order) => {
                        info!(order_number = %order.order_number, reason, "Payment failed");
                        Ok(ReconcileOutcome::Failed(order))
                    }
                    // Guard did not fire: the order paid, already
                    // recorded the failure, or left CREATED (e.g.
                    // cancelled) in the meantime.
                    None => {
                        let current = self.get_order(&order.order_number).await?;
                        match current.payment.status {
                            PaymentStatus::Paid => Ok(ReconcileOutcome::AlreadyPaid(current)),
                            PaymentStatus::Failed => Ok(ReconcileOutcome::Failed(current)),
                            _ => Ok(ReconcileOutcome::Pending(current)),
                        }
                    }
                }
            }
            GatewayPaymentStatus::Pending => Ok(ReconcileOutcome::Pending(order)),
        }
    }

    /// Mark the order paid exactly once, then run the post-payment side
    /// effects. The conditional update decides the winner when two
    /// events race; only the winner sends notifications and creates the
    /// shipment. FAILED -> PAID recovery is legal here: a payment can
    /// succeed after an initial failure report.
    async fn settle_paid(&self, order: Order, transaction_id: &str) -> AppResult<ReconcileOutcome> {
        let Some(confirmed) = self
            .orders
            .mark_paid(&order.order_number, transaction_id)
            .await?
        else {
            let current = self.get_order(&order.order_number).await?;
            if current.payment.status == PaymentStatus::Paid {
                // Lost the race; the other event already settled it.
                return Ok(ReconcileOutcome::AlreadyPaid(current));
            }
            // The gateway captured money for an order that left the
            // payable states, i.e. it was cancelled before settlement.
            // The order stays where it is and the capture is refunded.
            warn!(
                order_number = %current.order_number,
                status = %current.status,
                transaction_id,
                "Payment captured for a non-payable order, initiating refund"
            );
            self.refund_best_effort(&current, current.total, "Payment captured after cancellation")
                .await;
            return Ok(ReconcileOutcome::PaidAfterCancel(
                self.get_order(&current.order_number).await?,
            ));
        };
        info!(
            order_number = %confirmed.order_number,
            transaction_id,
            "Payment confirmed"
        );

        let recipient = Recipient::from_order(&confirmed);
        if let Err(e) = self
            .notify
            .send_order_confirmation(&recipient, &confirmed)
            .await
        {
            warn!(order_number = %confirmed.order_number, error = %e, "Confirmation notification failed");
        }

        // Shipment creation is best-effort: its failure must never fail
        // an already-confirmed payment.
        let confirmed = self.create_shipment_best_effort(confirmed).await;
        Ok(ReconcileOutcome::Confirmed(confirmed))
    }

    async fn create_shipment_best_effort(&self, order: Order) -> Order {
        let shipment_id = match self.shipping.create_shipment(&order).await {
            Ok(id) => id,
            Err(e) => {
                warn!(order_number = %order.order_number, error = %e, "Shipment creation failed");
                return order;
            }
        };
        let tracking_code = match self.shipping.generate_tracking_number(&shipment_id).await {
            Ok(code) => Some(code),
            Err(e) => {
                warn!(order_number = %order.order_number, shipment_id, error = %e, "Tracking number generation failed");
                None
            }
        };

        let tracking = TrackingInfo {
            shipment_id: Some(shipment_id),
            tracking_code,
        };
        match self.orders.set_tracking(&order.order_number, tracking).await {
            Ok(Some(updated)) => updated,
            Ok(None) => order,
            Err(e) => {
                warn!(order_number = %order.order_number, error = %e, "Failed to persist tracking info");
                order
            }
        }
    }
}
