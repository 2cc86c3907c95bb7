//! Shipping serviceability API

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/shipping/pincode/{pincode}", get(handler::check_pincode))
}
