//! Coupon handlers
//!
//! `validate` is the public preview endpoint used at checkout; it never
//! consumes a use. Management endpoints are admin-only.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use shared::response::ApiResponse;

use crate::api::convert::CouponView;
use crate::auth::{CurrentUser, require_admin};
use crate::core::ServerState;
use crate::coupons::DiscountQuote;
use crate::db::models::{CouponCreate, CouponUpdate};
use crate::db::repository::CouponRepository;
use crate::utils::{AppError, AppResult, ok, ok_with_message};

/// GET /api/coupons - admin
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<CouponView>>>> {
    require_admin(&user)?;
    let coupons = CouponRepository::new(state.db().clone()).find_all().await?;
    Ok(ok(coupons.into_iter().map(Into::into).collect()))
}

/// POST /api/coupons - admin
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CouponCreate>,
) -> AppResult<Json<ApiResponse<CouponView>>> {
    require_admin(&user)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let coupon = CouponRepository::new(state.db().clone()).create(&payload).await?;
    Ok(ok(coupon.into()))
}

/// PUT /api/coupons/{id} - admin
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<CouponUpdate>,
) -> AppResult<Json<ApiResponse<CouponView>>> {
    require_admin(&user)?;
    let coupon = CouponRepository::new(state.db().clone())
        .update(&id, payload)
        .await?;
    Ok(ok(coupon.into()))
}

/// DELETE /api/coupons/{id} - admin
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    require_admin(&user)?;
    CouponRepository::new(state.db().clone()).delete(&id).await?;
    Ok(ok_with_message((), "Coupon deleted"))
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub code: String,
    pub order_value: f64,
}

/// POST /api/coupons/validate - public preview
///
/// Rejections surface with their domain code (INVALID_COUPON,
/// INACTIVE_COUPON, COUPON_USAGE_EXCEEDED, ORDER_VALUE_TOO_LOW).
pub async fn validate(
    State(state): State<ServerState>,
    Json(payload): Json<ValidateRequest>,
) -> AppResult<Json<ApiResponse<DiscountQuote>>> {
    let (_, quote) = state
        .coupons()
        .validate(&payload.code, payload.order_value)
        .await?;
    Ok(ok(quote))
}
