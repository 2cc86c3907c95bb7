//! Health handler

use axum::Json;
use serde::Serialize;

use shared::response::ApiResponse;

use crate::utils::ok;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<ApiResponse<Health>> {
    ok(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
