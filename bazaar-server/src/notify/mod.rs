//! Notification dispatcher
//!
//! Fire-and-forget from order workflows: the caller logs a failure and
//! moves on, a notification error never aborts an order operation.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::db::models::Order;
use crate::utils::time::millis_to_rfc3339;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Where a notification goes: email, phone, or both.
#[derive(Debug, Clone, Default)]
pub struct Recipient {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Recipient {
    pub fn from_order(order: &Order) -> Self {
        Self {
            email: order.shipping_address.email.clone(),
            phone: Some(order.shipping_address.phone.clone()),
        }
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_order_confirmation(
        &self,
        recipient: &Recipient,
        order: &Order,
    ) -> Result<(), NotifyError>;

    async fn send_shipping_update(
        &self,
        recipient: &Recipient,
        order_number: &str,
        status: &str,
        tracking_code: Option<&str>,
    ) -> Result<(), NotifyError>;
}

/// Structured-log sink. Stands in for email/SMS providers in dev; the
/// trait is the seam a real provider plugs into.
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn send_order_confirmation(
        &self,
        recipient: &Recipient,
        order: &Order,
    ) -> Result<(), NotifyError> {
        info!(
            target: "notify",
            order_number = %order.order_number,
            email = recipient.email.as_deref().unwrap_or("-"),
            phone = recipient.phone.as_deref().unwrap_or("-"),
            total = order.total,
            placed_at = %millis_to_rfc3339(order.created_at),
            "Order confirmation"
        );
        Ok(())
    }

    async fn send_shipping_update(
        &self,
        recipient: &Recipient,
        order_number: &str,
        status: &str,
        tracking_code: Option<&str>,
    ) -> Result<(), NotifyError> {
        info!(
            target: "notify",
            order_number,
            status,
            tracking = tracking_code.unwrap_or("-"),
            phone = recipient.phone.as_deref().unwrap_or("-"),
            "Shipping update"
        );
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    //! Counting sink for asserting notification traffic in tests

    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    pub struct CountingSink {
        pub confirmations: AtomicUsize,
        pub shipping_updates: AtomicUsize,
    }

    impl CountingSink {
        pub fn confirmations_sent(&self) -> usize {
            self.confirmations.load(Ordering::SeqCst)
        }

        pub fn shipping_updates_sent(&self) -> usize {
            self.shipping_updates.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NotificationSink for CountingSink {
        async fn send_order_confirmation(
            &self,
            _recipient: &Recipient,
            _order: &Order,
        ) -> Result<(), NotifyError> {
            self.confirmations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn send_shipping_update(
            &self,
            _recipient: &Recipient,
            _order_number: &str,
            _status: &str,
            _tracking_code: Option<&str>,
        ) -> Result<(), NotifyError> {
            self.shipping_updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
