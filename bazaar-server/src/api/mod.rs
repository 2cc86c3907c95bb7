//! API route modules
//!
//! One module per resource: `mod.rs` builds the router, `handler.rs`
//! holds the handlers. Everything is nested under `/api/...` and
//! renders through the `{code, message, data}` envelope.

pub mod convert;

pub mod cart;
pub mod categories;
pub mod coupons;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod promotions;
pub mod shipping;

use axum::Router;

use crate::core::ServerState;

pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(coupons::router())
        .merge(promotions::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(shipping::router())
        .with_state(state)
}
