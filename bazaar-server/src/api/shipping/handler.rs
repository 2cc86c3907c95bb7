//! Shipping handlers

use axum::{
    Json,
    extract::{Path, State},
};

use shared::response::ApiResponse;

use crate::core::ServerState;
use crate::shipping::PincodeCheck;
use crate::utils::{AppError, AppResult, ok};

/// GET /api/shipping/pincode/{pincode} - public serviceability check
pub async fn check_pincode(
    State(state): State<ServerState>,
    Path(pincode): Path<String>,
) -> AppResult<Json<ApiResponse<PincodeCheck>>> {
    let pincode = pincode.trim();
    if pincode.len() != 6 || !pincode.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("Pincode must be 6 digits"));
    }
    let check = state
        .shipping()
        .check_pincode(pincode)
        .await
        .map_err(|e| AppError::internal(format!("Serviceability check failed: {e}")))?;
    Ok(ok(check))
}
