//! Reqwest-backed gateway client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{GatewayError, GatewayPaymentStatus, PaymentGateway, PaymentSession};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    app_id: String,
    secret: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: String, app_id: String, secret: String) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id,
            secret,
        })
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("x-client-id", &self.app_id)
            .header("x-client-secret", &self.secret)
            .header("x-api-version", "2023-08-01")
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_session(
        &self,
        order_number: &str,
        amount: f64,
        customer_phone: &str,
    ) -> Result<PaymentSession, GatewayError> {
        let url = format!("{}/orders", self.base_url);
        let body = json!({
            "order_id": order_number,
            "order_amount": amount,
            "order_currency": "INR",
            "customer_details": {
                "customer_id": order_number,
                "customer_phone": customer_phone,
            },
        });

        let response: Value = self
            .authed(self.client.post(&url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let session_token = response
            .get("payment_session_id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                GatewayError::BadResponse("missing payment_session_id".to_string())
            })?
            .to_string();
        let gateway_order_id = response
            .get("cf_order_id")
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| order_number.to_string());

        debug!(order_number, "Created gateway checkout session");
        Ok(PaymentSession {
            gateway_order_id,
            session_token,
        })
    }

    async fn fetch_status(&self, order_number: &str) -> Result<GatewayPaymentStatus, GatewayError> {
        let url = format!("{}/orders/{}/payments", self.base_url, order_number);
        let payments: Value = self
            .authed(self.client.get(&url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(list) = payments.as_array() else {
            return Err(GatewayError::BadResponse(
                "payments response is not a list".to_string(),
            ));
        };

        // Any successful attempt wins; otherwise report the latest failure.
        let mut last_failure: Option<String> = None;
        for payment in list {
            let status = payment
                .get("payment_status")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_uppercase();
            match status.as_str() {
                "SUCCESS" => {
                    let transaction_id = payment
                        .get("cf_payment_id")
                        .and_then(|v| match v {
                            Value::String(s) => Some(s.clone()),
                            Value::Number(n) => Some(n.to_string()),
                            _ => None,
                        })
                        .unwrap_or_default();
                    return Ok(GatewayPaymentStatus::Paid { transaction_id });
                }
                "FAILED" | "USER_DROPPED" | "CANCELLED" => {
                    last_failure = Some(
                        payment
                            .get("payment_message")
                            .and_then(Value::as_str)
                            .unwrap_or("Payment failed")
                            .to_string(),
                    );
                }
                _ => {}
            }
        }

        match last_failure {
            Some(reason) => Ok(GatewayPaymentStatus::Failed { reason }),
            None => Ok(GatewayPaymentStatus::Pending),
        }
    }

    async fn initiate_refund(
        &self,
        order_number: &str,
        amount: f64,
        reason: &str,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/orders/{}/refunds", self.base_url, order_number);
        let refund_id = format!("refund_{}", order_number);
        let body = json!({
            "refund_id": refund_id,
            "refund_amount": amount,
            "refund_note": reason,
        });

        let response: Value = self
            .authed(self.client.post(&url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let reference = response
            .get("cf_refund_id")
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or(refund_id);

        if response.get("refund_status").and_then(Value::as_str) == Some("ERROR") {
            warn!(order_number, "Gateway reported refund error state");
        }
        Ok(reference)
    }
}
