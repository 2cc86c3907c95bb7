//! Scripted gateway for order workflow tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{GatewayError, GatewayPaymentStatus, PaymentGateway, PaymentSession};

/// Returns a fixed status for every `fetch_status` call and counts
/// interactions so tests can assert on gateway traffic.
pub struct MockGateway {
    status: Mutex<GatewayPaymentStatus>,
    pub sessions_created: AtomicUsize,
    pub status_queries: AtomicUsize,
    pub refunds: AtomicUsize,
    pub fail_session_creation: bool,
}

impl MockGateway {
    pub fn paying(transaction_id: &str) -> Self {
        Self::with_status(GatewayPaymentStatus::Paid {
            transaction_id: transaction_id.to_string(),
        })
    }

    pub fn failing(reason: &str) -> Self {
        Self::with_status(GatewayPaymentStatus::Failed {
            reason: reason.to_string(),
        })
    }

    pub fn pending() -> Self {
        Self::with_status(GatewayPaymentStatus::Pending)
    }

    pub fn with_status(status: GatewayPaymentStatus) -> Self {
        Self {
            status: Mutex::new(status),
            sessions_created: AtomicUsize::new(0),
            status_queries: AtomicUsize::new(0),
            refunds: AtomicUsize::new(0),
            fail_session_creation: false,
        }
    }

    pub fn set_status(&self, status: GatewayPaymentStatus) {
        *self.status.lock().unwrap() = status;
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_session(
        &self,
        order_number: &str,
        _amount: f64,
        _customer_phone: &str,
    ) -> Result<PaymentSession, GatewayError> {
        if self.fail_session_creation {
            return Err(GatewayError::Request("session refused".to_string()));
        }
        self.sessions_created.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentSession {
            gateway_order_id: format!("cf_{order_number}"),
            session_token: format!("session_{order_number}"),
        })
    }

    async fn fetch_status(&self, _order_number: &str) -> Result<GatewayPaymentStatus, GatewayError> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.status.lock().unwrap().clone())
    }

    async fn initiate_refund(
        &self,
        order_number: &str,
        _amount: f64,
        _reason: &str,
    ) -> Result<String, GatewayError> {
        self.refunds.fetch_add(1, Ordering::SeqCst);
        Ok(format!("refund_{order_number}"))
    }
}
