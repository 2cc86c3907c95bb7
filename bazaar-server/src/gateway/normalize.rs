//! Callback/webhook payload normalization
//!
//! The gateway delivers order references and statuses under several
//! shapes depending on event version and path (redirect callback vs
//! server webhook). This module is the only place that knows the
//! fallback chain; both HTTP paths feed through it.

use serde::Deserialize;
use serde_json::Value;

/// Minimal normalized view of a callback/webhook payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackData {
    pub order_id: String,
    /// Status string as claimed by the payload, uppercase. Only a hint;
    /// reconciliation re-verifies against the gateway.
    pub claimed_status: Option<String>,
    pub reference_id: Option<String>,
}

fn string_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut cur = value;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_str().filter(|s| !s.is_empty())
}

/// Extract order id, claimed status and payment reference from any of
/// the known payload shapes. Returns None when no order id is present
/// in any known location.
pub fn normalize_callback(payload: &Value) -> Option<CallbackData> {
    let order_id = string_at(payload, &["data", "order", "order_id"])
        .or_else(|| string_at(payload, &["order", "order_id"]))
        .or_else(|| string_at(payload, &["order_id"]))
        .or_else(|| string_at(payload, &["orderId"]))?
        .to_string();

    let claimed_status = string_at(payload, &["data", "payment", "payment_status"])
        .or_else(|| string_at(payload, &["payment", "payment_status"]))
        .or_else(|| string_at(payload, &["payment_status"]))
        .or_else(|| string_at(payload, &["txStatus"]))
        .map(|s| s.to_uppercase());

    let reference_id = string_at(payload, &["data", "payment", "cf_payment_id"])
        .or_else(|| string_at(payload, &["payment", "cf_payment_id"]))
        .or_else(|| string_at(payload, &["cf_payment_id"]))
        .or_else(|| string_at(payload, &["referenceId"]))
        .map(|s| s.to_string());

    Some(CallbackData {
        order_id,
        claimed_status,
        reference_id,
    })
}

/// Query-string form of the redirect callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(alias = "orderId")]
    pub order_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn webhook_v2_shape() {
        let payload = json!({
            "data": {
                "order": { "order_id": "ORD-123" },
                "payment": { "payment_status": "SUCCESS", "cf_payment_id": "cf_991" }
            }
        });
        let data = normalize_callback(&payload).unwrap();
        assert_eq!(data.order_id, "ORD-123");
        assert_eq!(data.claimed_status.as_deref(), Some("SUCCESS"));
        assert_eq!(data.reference_id.as_deref(), Some("cf_991"));
    }

    #[test]
    fn flat_legacy_shape() {
        let payload = json!({ "orderId": "ORD-9", "txStatus": "failed", "referenceId": "r1" });
        let data = normalize_callback(&payload).unwrap();
        assert_eq!(data.order_id, "ORD-9");
        assert_eq!(data.claimed_status.as_deref(), Some("FAILED"));
        assert_eq!(data.reference_id.as_deref(), Some("r1"));
    }

    #[test]
    fn missing_order_id_is_none() {
        let payload = json!({ "payment_status": "SUCCESS" });
        assert!(normalize_callback(&payload).is_none());
    }

    #[test]
    fn empty_order_id_is_none() {
        let payload = json!({ "order_id": "" });
        assert!(normalize_callback(&payload).is_none());
    }
}
