//! Payment callback and webhook handlers

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::core::ServerState;
use crate::gateway::{CallbackData, CallbackQuery, normalize_callback};
use crate::orders::ReconcileOutcome;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
    pub message: String,
}

/// POST /api/payments/webhook
///
/// Always 200, whatever happened internally; the gateway only needs the
/// receipt acknowledged. Reconciliation verifies against the gateway
/// before touching the order.
pub async fn webhook(
    State(state): State<ServerState>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<WebhookAck>) {
    let ack = |success: bool, message: &str| {
        (
            StatusCode::OK,
            Json(WebhookAck {
                success,
                message: message.to_string(),
            }),
        )
    };

    let Some(event) = normalize_callback(&payload) else {
        warn!("Webhook payload carried no recognizable order id");
        return ack(false, "Unrecognized payload");
    };

    match state.orders().reconcile_payment(&event).await {
        Ok(ReconcileOutcome::Confirmed(order)) => {
            info!(order_number = %order.order_number, "Webhook confirmed payment");
            ack(true, "Payment confirmed")
        }
        Ok(ReconcileOutcome::AlreadyPaid(_)) => ack(true, "Already processed"),
        Ok(ReconcileOutcome::Failed(_)) => ack(true, "Payment failure recorded"),
        Ok(ReconcileOutcome::Pending(_)) => ack(true, "Payment still pending"),
        Ok(ReconcileOutcome::PaidAfterCancel(_)) => {
            ack(true, "Order was cancelled; refund initiated")
        }
        Ok(ReconcileOutcome::UnknownOrder) => ack(false, "Unknown order"),
        Err(e) => {
            warn!(error = %e, order_id = %event.order_id, "Webhook reconciliation failed");
            ack(false, "Internal error")
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CallbackStatus {
    pub order_id: String,
    pub payment_status: String,
    pub order_status: Option<String>,
}

fn outcome_label(outcome: &ReconcileOutcome) -> &'static str {
    match outcome {
        ReconcileOutcome::Confirmed(_) | ReconcileOutcome::AlreadyPaid(_) => "PAID",
        ReconcileOutcome::Failed(_) => "FAILED",
        ReconcileOutcome::Pending(_) => "PENDING",
        ReconcileOutcome::PaidAfterCancel(_) => "REFUNDED",
        ReconcileOutcome::UnknownOrder => "UNKNOWN",
    }
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

async fn reconcile_redirect_event(
    state: &ServerState,
    headers: &HeaderMap,
    order_id: Option<String>,
) -> Response {
    let Some(order_id) = order_id.filter(|s| !s.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(WebhookAck {
                success: false,
                message: "Missing order_id".to_string(),
            }),
        )
            .into_response();
    };

    // The redirect carries no trustworthy status; reconciliation asks
    // the gateway.
    let event = CallbackData {
        order_id: order_id.clone(),
        claimed_status: None,
        reference_id: None,
    };

    let status = match state.orders().reconcile_payment(&event).await {
        Ok(outcome) => CallbackStatus {
            order_id,
            payment_status: outcome_label(&outcome).to_string(),
            order_status: outcome.order().map(|o| o.status.to_string()),
        },
        Err(e) => {
            warn!(error = %e, order_id = %order_id, "Callback reconciliation failed");
            CallbackStatus {
                order_id,
                payment_status: "PENDING".to_string(),
                order_status: None,
            }
        }
    };

    if wants_html(headers) {
        // Browser flow: hand the user back to the storefront's order page.
        let target = format!(
            "/orders/{}?payment={}",
            status.order_id,
            status.payment_status.to_lowercase()
        );
        return Redirect::to(&target).into_response();
    }
    Json(status).into_response()
}

/// GET /api/payments/callback - browser redirect after checkout
pub async fn callback(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    reconcile_redirect_event(&state, &headers, query.order_id).await
}

/// POST /api/payments/callback - some gateway configurations post the
/// redirect as a form/JSON body instead of query parameters
pub async fn callback_post(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
    payload: Option<Json<Value>>,
) -> Response {
    let order_id = query.order_id.or_else(|| {
        payload
            .as_ref()
            .and_then(|Json(p)| normalize_callback(p))
            .map(|d| d.order_id)
    });
    reconcile_redirect_event(&state, &headers, order_id).await
}
