//! Payment gateway adapter
//!
//! One trait for order workflows plus a reqwest implementation against a
//! hosted-checkout gateway (Cashfree-style contract). The trait is the
//! seam tests replace with a scripted mock.

pub mod http;
pub mod normalize;

#[cfg(test)]
pub mod mock;

pub use http::HttpPaymentGateway;
pub use normalize::{CallbackData, CallbackQuery, normalize_callback};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    Request(String),

    #[error("Gateway returned an unexpected response: {0}")]
    BadResponse(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Request(e.to_string())
    }
}

/// Hosted checkout session returned to the client for online payments.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaymentSession {
    /// Gateway-side order reference
    pub gateway_order_id: String,
    /// Token the client hands to the gateway's checkout widget
    pub session_token: String,
}

/// Gateway-truth payment status for an order reference.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayPaymentStatus {
    Paid { transaction_id: String },
    Failed { reason: String },
    Pending,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a checkout session for `order_number` over `amount`.
    async fn create_session(
        &self,
        order_number: &str,
        amount: f64,
        customer_phone: &str,
    ) -> Result<PaymentSession, GatewayError>;

    /// Query the authoritative payment status. Callback and webhook
    /// payloads are only triggers; this is the source of truth.
    async fn fetch_status(&self, order_number: &str) -> Result<GatewayPaymentStatus, GatewayError>;

    /// Start a refund against a captured payment.
    async fn initiate_refund(
        &self,
        order_number: &str,
        amount: f64,
        reason: &str,
    ) -> Result<String, GatewayError>;
}
