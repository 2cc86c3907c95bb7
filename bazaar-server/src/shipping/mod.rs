//! Shipping adapter
//!
//! Every call is best-effort from the order workflow's perspective: a
//! shipping failure is logged and never rolls back a confirmed payment.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::db::models::Order;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ShippingError {
    #[error("Shipping request failed: {0}")]
    Request(String),

    #[error("Shipping provider returned an unexpected response: {0}")]
    BadResponse(String),
}

impl From<reqwest::Error> for ShippingError {
    fn from(e: reqwest::Error) -> Self {
        ShippingError::Request(e.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PincodeCheck {
    pub serviceable: bool,
    pub estimated_days: Option<u32>,
}

#[async_trait]
pub trait ShippingProvider: Send + Sync {
    /// Register a shipment for a confirmed order, returns the provider's
    /// shipment id.
    async fn create_shipment(&self, order: &Order) -> Result<String, ShippingError>;

    async fn generate_tracking_number(&self, shipment_id: &str) -> Result<String, ShippingError>;

    async fn check_pincode(&self, pincode: &str) -> Result<PincodeCheck, ShippingError>;
}

/// Client for a shipping aggregator API.
pub struct HttpShippingProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpShippingProvider {
    pub fn new(base_url: String, api_key: String) -> Result<Self, ShippingError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl ShippingProvider for HttpShippingProvider {
    async fn create_shipment(&self, order: &Order) -> Result<String, ShippingError> {
        let url = format!("{}/shipments", self.base_url);
        let body = json!({
            "order_id": order.order_number,
            "consignee": {
                "name": order.shipping_address.name,
                "phone": order.shipping_address.phone,
                "address": order.shipping_address.line1,
                "city": order.shipping_address.city,
                "state": order.shipping_address.state,
                "pincode": order.shipping_address.pincode,
            },
            "items": order.items.iter().map(|i| json!({
                "sku": i.variant_sku,
                "name": i.product_name,
                "quantity": i.quantity,
            })).collect::<Vec<_>>(),
            "cod": order.payment.method == shared::PaymentMethod::Cod,
            "amount": order.total,
        });

        let response: Value = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let shipment_id = response
            .get("shipment_id")
            .and_then(Value::as_str)
            .ok_or_else(|| ShippingError::BadResponse("missing shipment_id".to_string()))?
            .to_string();
        debug!(order_number = %order.order_number, shipment_id, "Created shipment");
        Ok(shipment_id)
    }

    async fn generate_tracking_number(&self, shipment_id: &str) -> Result<String, ShippingError> {
        let url = format!("{}/shipments/{}/tracking", self.base_url, shipment_id);
        let response: Value = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .get("tracking_code")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .ok_or_else(|| ShippingError::BadResponse("missing tracking_code".to_string()))
    }

    async fn check_pincode(&self, pincode: &str) -> Result<PincodeCheck, ShippingError> {
        let url = format!("{}/serviceability/{}", self.base_url, pincode);
        let response: Value = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(PincodeCheck {
            serviceable: response
                .get("serviceable")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            estimated_days: response
                .get("estimated_days")
                .and_then(Value::as_u64)
                .map(|d| d as u32),
        })
    }
}

/// Logging stand-in used in dev and when no provider is configured.
pub struct NoopShippingProvider;

#[async_trait]
impl ShippingProvider for NoopShippingProvider {
    async fn create_shipment(&self, order: &Order) -> Result<String, ShippingError> {
        debug!(order_number = %order.order_number, "Noop shipping: create_shipment");
        Ok(format!("ship_{}", order.order_number))
    }

    async fn generate_tracking_number(&self, shipment_id: &str) -> Result<String, ShippingError> {
        debug!(shipment_id, "Noop shipping: generate_tracking_number");
        Ok(format!("trk_{shipment_id}"))
    }

    async fn check_pincode(&self, _pincode: &str) -> Result<PincodeCheck, ShippingError> {
        Ok(PincodeCheck {
            serviceable: true,
            estimated_days: Some(5),
        })
    }
}
