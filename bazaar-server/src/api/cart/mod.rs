//! Cart API
//!
//! Works for both authenticated users and guests. Guests identify
//! themselves with the `X-Guest-Session` header; a bearer token wins
//! when both are present.

mod handler;

use axum::{Router, routing::get, routing::post, routing::put};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get_cart).delete(handler::clear))
        .route("/items", post(handler::add_item))
        .route(
            "/items/{sku}",
            put(handler::update_item).delete(handler::remove_item),
        )
        .route("/coupon", post(handler::apply_coupon).delete(handler::remove_coupon))
}
