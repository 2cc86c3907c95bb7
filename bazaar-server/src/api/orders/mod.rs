//! Order API
//!
//! Creation accepts both authenticated and guest traffic. Lifecycle
//! management (status, delete, return processing) is admin-only;
//! cancellation and return requests are owner-or-admin.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/my", get(handler::my_orders))
        .route("/stats", get(handler::stats))
        .route("/claim", post(handler::claim))
        .route("/{order_number}", get(handler::get).delete(handler::delete))
        .route("/{order_number}/status", post(handler::update_status))
        .route("/{order_number}/cancel", post(handler::cancel))
        .route("/{order_number}/return", post(handler::request_return))
        .route(
            "/{order_number}/return/process",
            post(handler::process_return),
        )
}
