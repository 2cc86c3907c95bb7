//! Order status model
//!
//! The order status field is canonical: every transition is checked against
//! [`OrderStatus::can_transition_to`] and recorded as an appended
//! [`StatusHistoryEntry`] in the same update. History is audit/display only.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Created,
    Confirmed,
    Processing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    PaymentFailed,
    ReturnApproved,
    ExchangeApproved,
    Returned,
    Exchanged,
}

impl OrderStatus {
    /// Legal forward edges of the order state machine.
    ///
    /// `PaymentFailed -> Confirmed` is deliberate: a gateway can report a
    /// failure first and a verified success later, and reconciliation must
    /// be able to recover the order.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Created, Confirmed) | (Created, PaymentFailed) => true,
            (PaymentFailed, Confirmed) => true,
            (Confirmed, Processing) => true,
            (Confirmed, Shipped) | (Processing, Shipped) => true,
            (Shipped, OutForDelivery) => true,
            (Shipped, Delivered) | (OutForDelivery, Delivered) => true,
            (Created, Cancelled)
            | (Confirmed, Cancelled)
            | (Processing, Cancelled)
            | (PaymentFailed, Cancelled) => true,
            (Delivered, ReturnApproved) | (Delivered, ExchangeApproved) => true,
            (ReturnApproved, Returned) => true,
            (ExchangeApproved, Exchanged) => true,
            _ => false,
        }
    }

    /// Statuses from which an order may still be cancelled
    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            OrderStatus::Created
                | OrderStatus::Confirmed
                | OrderStatus::Processing
                | OrderStatus::PaymentFailed
        )
    }

    /// Terminal statuses (no further transitions)
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Cancelled | OrderStatus::Returned | OrderStatus::Exchanged
        )
    }

    /// All statuses that are allowed to transition into `next`.
    ///
    /// Used to build actionable error messages ("Order must be in one of
    /// these statuses to ...").
    pub fn allowed_predecessors(next: OrderStatus) -> Vec<OrderStatus> {
        use OrderStatus::*;
        [
            Created,
            Confirmed,
            Processing,
            Shipped,
            OutForDelivery,
            Delivered,
            Cancelled,
            PaymentFailed,
            ReturnApproved,
            ExchangeApproved,
            Returned,
            Exchanged,
        ]
        .into_iter()
        .filter(|prev| prev.can_transition_to(next))
        .collect()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::PaymentFailed => "PAYMENT_FAILED",
            OrderStatus::ReturnApproved => "RETURN_APPROVED",
            OrderStatus::ExchangeApproved => "EXCHANGE_APPROVED",
            OrderStatus::Returned => "RETURNED",
            OrderStatus::Exchanged => "EXCHANGED",
        };
        f.write_str(s)
    }
}

/// Payment status of the order's payment sub-record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Payment method chosen at checkout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash on delivery; confirmed immediately at creation
    Cod,
    /// Online payment through the gateway; confirmed by reconciliation
    Online,
}

/// Refund progress on a cancelled/returned order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    Initiated,
    Completed,
    Failed,
}

/// Kind of a return/exchange request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnKind {
    Return,
    Exchange,
}

/// Status of a return/exchange request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

/// Append-only status history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub note: Option<String>,
}

impl StatusHistoryEntry {
    /// Entry stamped with the current time.
    pub fn new(status: OrderStatus, note: Option<String>) -> Self {
        Self {
            status,
            timestamp: Utc::now().timestamp_millis(),
            note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_cannot_jump_to_delivered() {
        assert!(!OrderStatus::Created.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn delivered_is_not_cancellable() {
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn payment_failed_can_recover_to_confirmed() {
        assert!(OrderStatus::PaymentFailed.can_transition_to(OrderStatus::Confirmed));
    }

    #[test]
    fn deliver_predecessors_are_shipping_states() {
        let prev = OrderStatus::allowed_predecessors(OrderStatus::Delivered);
        assert_eq!(prev, vec![OrderStatus::Shipped, OrderStatus::OutForDelivery]);
    }

    #[test]
    fn terminal_states_have_no_exits() {
        use OrderStatus::*;
        for terminal in [Cancelled, Returned, Exchanged] {
            for next in [
                Created, Confirmed, Processing, Shipped, OutForDelivery, Delivered, Cancelled,
                PaymentFailed, ReturnApproved, ExchangeApproved, Returned, Exchanged,
            ] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn history_entry_is_stamped_on_construction() {
        let entry = StatusHistoryEntry::new(OrderStatus::Created, Some("Order created".to_string()));
        assert_eq!(entry.status, OrderStatus::Created);
        assert_eq!(entry.note.as_deref(), Some("Order created"));
        // 2024-01-01 in millis
        assert!(entry.timestamp > 1_704_067_200_000);

        let bare = StatusHistoryEntry::new(OrderStatus::Cancelled, None);
        assert!(bare.note.is_none());
    }

    #[test]
    fn status_serializes_screaming_snake() {
        let s = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(s, "\"OUT_FOR_DELIVERY\"");
    }
}
