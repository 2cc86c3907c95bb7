//! Return and exchange requests

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use shared::{OrderStatus, PaymentStatus, ReturnKind, ReturnStatus, StatusHistoryEntry};

use crate::db::models::{Order, ReturnItem, ReturnRequest};
use crate::utils::money::{round_money, to_decimal, to_f64};
use crate::utils::time::now_millis;
use crate::utils::{AppError, AppResult};

use super::manager::{Actor, OrderManager};

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnRequestInput {
    pub kind: ReturnKind,
    pub reason: String,
    pub items: Vec<ReturnItem>,
    /// Explicit refund amount; computed from returned items when absent
    pub refund_amount: Option<f64>,
}

/// Admin decision on a pending/approved request.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessReturnAction {
    Approve,
    Reject,
    Complete,
}

impl OrderManager {
    /// File a return or exchange request against a delivered order.
    /// Only one open request at a time; quantities are bounded by what
    /// the order actually contains.
    pub async fn request_return_exchange(
        &self,
        order_number: &str,
        actor: &Actor,
        input: ReturnRequestInput,
    ) -> AppResult<Order> {
        let order = self.get_order(order_number).await?;
        self.require_access(&order, actor)?;

        if order.status != OrderStatus::Delivered {
            return Err(AppError::state_conflict(
                "Only delivered orders can be returned or exchanged",
            ));
        }
        if input.items.is_empty() {
            return Err(AppError::validation("Select at least one item to return"));
        }
        for item in &input.items {
            if item.quantity < 1 {
                return Err(AppError::validation("Return quantity must be at least 1"));
            }
            let ordered = order.ordered_quantity(&item.variant_sku);
            if ordered == 0 {
                return Err(AppError::validation(format!(
                    "Item {} is not part of this order",
                    item.variant_sku
                )));
            }
            if item.quantity > ordered {
                return Err(AppError::validation(format!(
                    "Cannot return {} of {}, only {} ordered",
                    item.quantity, item.variant_sku, ordered
                )));
            }
        }

        let request = ReturnRequest {
            kind: input.kind,
            reason: input.reason,
            items: input.items,
            status: ReturnStatus::Pending,
            // Captured so rejection restores exactly this status, no
            // history scanning involved.
            previous_status: order.status,
            refund_amount: input.refund_amount,
            history: vec![StatusHistoryEntry::new(
                order.status,
                Some("Return/exchange requested".to_string()),
            )],
            requested_at: now_millis(),
        };

        let Some(updated) = self.orders.set_return_request(order_number, request).await? else {
            return Err(AppError::state_conflict(
                "A return/exchange request is already open for this order",
            ));
        };
        info!(order_number, "Return/exchange request filed");
        Ok(updated)
    }

    /// Admin processing of the open request.
    pub async fn process_return_exchange(
        &self,
        order_number: &str,
        actor: &Actor,
        action: ProcessReturnAction,
    ) -> AppResult<Order> {
        if !actor.is_admin {
            return Err(AppError::forbidden(
                "Only admins can process return/exchange requests",
            ));
        }
        let order = self.get_order(order_number).await?;
        let request = order
            .return_request
            .clone()
            .ok_or_else(|| AppError::not_found("No return/exchange request on this order"))?;

        match action {
            ProcessReturnAction::Approve => self.approve_return(&order, &request).await,
            ProcessReturnAction::Reject => self.reject_return(&order, &request).await,
            ProcessReturnAction::Complete => self.complete_return(&order, &request).await,
        }
    }

    async fn approve_return(&self, order: &Order, request: &ReturnRequest) -> AppResult<Order> {
        let updated = self
            .orders
            .update_return_status(&order.order_number, ReturnStatus::Pending, ReturnStatus::Approved)
            .await?;
        if updated.is_none() {
            return Err(AppError::state_conflict(
                "Request is not pending and cannot be approved",
            ));
        }

        let next = match request.kind {
            ReturnKind::Return => OrderStatus::ReturnApproved,
            ReturnKind::Exchange => OrderStatus::ExchangeApproved,
        };
        let note = Some("Request approved".to_string());
        match self
            .orders
            .transition(&order.order_number, OrderStatus::Delivered, next, note)
            .await?
        {
            Some(updated) => Ok(updated),
            None => self.get_order(&order.order_number).await,
        }
    }

    /// Rejection restores the status captured when the request was
    /// filed and closes the request.
    async fn reject_return(&self, order: &Order, request: &ReturnRequest) -> AppResult<Order> {
        let updated = self
            .orders
            .update_return_status(&order.order_number, ReturnStatus::Pending, ReturnStatus::Rejected)
            .await?;
        if updated.is_none() {
            return Err(AppError::state_conflict(
                "Request is not pending and cannot be rejected",
            ));
        }

        if order.status != request.previous_status {
            self.orders
                .append_history(
                    &order.order_number,
                    StatusHistoryEntry::new(
                        request.previous_status,
                        Some("Return/exchange request rejected".to_string()),
                    ),
                )
                .await?;
        }
        info!(order_number = %order.order_number, "Return/exchange request rejected");
        self.get_order(&order.order_number).await
    }

    async fn complete_return(&self, order: &Order, request: &ReturnRequest) -> AppResult<Order> {
        let updated = self
            .orders
            .update_return_status(
                &order.order_number,
                ReturnStatus::Approved,
                ReturnStatus::Completed,
            )
            .await?;
        if updated.is_none() {
            return Err(AppError::state_conflict(
                "Request must be approved before completion",
            ));
        }

        match request.kind {
            ReturnKind::Return => {
                let refund_amount = request
                    .refund_amount
                    .unwrap_or_else(|| Self::computed_refund(order, request));
                if order.payment.status == PaymentStatus::Paid && refund_amount > 0.0 {
                    self.refund_best_effort(order, refund_amount, "Return completed")
                        .await;
                }
                for item in &request.items {
                    if let Err(e) = self
                        .variants
                        .restore_stock(&item.variant_sku, item.quantity)
                        .await
                    {
                        warn!(order_number = %order.order_number, sku = %item.variant_sku, error = %e, "Stock restore failed for returned item");
                    }
                }
                match self
                    .orders
                    .transition(
                        &order.order_number,
                        OrderStatus::ReturnApproved,
                        OrderStatus::Returned,
                        Some("Return completed".to_string()),
                    )
                    .await?
                {
                    Some(updated) => Ok(updated),
                    None => self.get_order(&order.order_number).await,
                }
            }
            // Exchange completion only flips status; fulfilling the
            // replacement item is a separate order.
            ReturnKind::Exchange => match self
                .orders
                .transition(
                    &order.order_number,
                    OrderStatus::ExchangeApproved,
                    OrderStatus::Exchanged,
                    Some("Exchange completed".to_string()),
                )
                .await?
            {
                Some(updated) => Ok(updated),
                None => self.get_order(&order.order_number).await,
            },
        }
    }

    /// Default refund: sum of unit price x returned quantity per item.
    fn computed_refund(order: &Order, request: &ReturnRequest) -> f64 {
        let sum = request
            .items
            .iter()
            .filter_map(|r| {
                order
                    .items
                    .iter()
                    .find(|i| i.variant_sku == r.variant_sku)
                    .map(|i| to_decimal(i.unit_price) * Decimal::from(r.quantity))
            })
            .sum();
        round_money(to_f64(sum))
    }
}
