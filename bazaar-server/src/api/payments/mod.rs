//! Payment callback/webhook API
//!
//! Two inbound paths share one reconciliation routine: the browser
//! redirect after checkout and the gateway's server-to-server webhook.
//! The webhook always answers 200 so the gateway stops retrying;
//! verification happens against the gateway, never the payload.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/webhook", post(handler::webhook))
        .route("/callback", get(handler::callback).post(handler::callback_post))
}
