//! Promotion handlers
//!
//! All endpoints are admin-only. `generate` mints a batch of coupons
//! carrying the promotion's terms under its code prefix.

use axum::{
    Json,
    extract::{Path, State},
};

use shared::response::ApiResponse;

use crate::api::convert::{CouponView, PromotionView};
use crate::auth::{CurrentUser, require_admin};
use crate::core::ServerState;
use crate::coupons::generate_promotion_coupons;
use crate::db::models::{GenerateCoupons, PromotionCreate, PromotionUpdate};
use crate::db::repository::PromotionRepository;
use crate::utils::{AppError, AppResult, ok, ok_with_message};

/// GET /api/promotions
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<PromotionView>>>> {
    require_admin(&user)?;
    let promotions = PromotionRepository::new(state.db().clone())
        .find_all()
        .await?;
    Ok(ok(promotions.into_iter().map(Into::into).collect()))
}

/// POST /api/promotions
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PromotionCreate>,
) -> AppResult<Json<ApiResponse<PromotionView>>> {
    require_admin(&user)?;
    if payload.code_prefix.trim().is_empty() {
        return Err(AppError::validation("code_prefix must not be empty"));
    }
    if payload.value <= 0.0 {
        return Err(AppError::validation("value must be positive"));
    }
    let promotion = PromotionRepository::new(state.db().clone())
        .create(&payload)
        .await?;
    Ok(ok(promotion.into()))
}

/// PUT /api/promotions/{id}
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<PromotionUpdate>,
) -> AppResult<Json<ApiResponse<PromotionView>>> {
    require_admin(&user)?;
    let promotion = PromotionRepository::new(state.db().clone())
        .update(&id, payload)
        .await?;
    Ok(ok(promotion.into()))
}

/// DELETE /api/promotions/{id}
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    require_admin(&user)?;
    PromotionRepository::new(state.db().clone())
        .delete(&id)
        .await?;
    Ok(ok_with_message((), "Promotion deleted"))
}

/// POST /api/promotions/{id}/generate
pub async fn generate(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<GenerateCoupons>,
) -> AppResult<Json<ApiResponse<Vec<CouponView>>>> {
    require_admin(&user)?;
    if payload.count == 0 || payload.count > 1000 {
        return Err(AppError::validation("count must be between 1 and 1000"));
    }
    let coupons = generate_promotion_coupons(state.db().clone(), &id, payload.count).await?;
    Ok(ok(coupons.into_iter().map(Into::into).collect()))
}
