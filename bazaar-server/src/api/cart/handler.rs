//! Cart handlers
//!
//! Every handler resolves the cart owner first: the bearer token's user
//! id when present, otherwise the `X-Guest-Session` header. Neither
//! present is a validation error.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;

use shared::response::ApiResponse;

use crate::auth::OptionalUser;
use crate::cart::{CartView, owner_key};
use crate::core::ServerState;
use crate::db::models::CartItemInput;
use crate::utils::{AppResult, ok, ok_with_message};

const GUEST_SESSION_HEADER: &str = "x-guest-session";

fn resolve_owner(user: &OptionalUser, headers: &HeaderMap) -> AppResult<String> {
    let guest = headers
        .get(GUEST_SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty());
    owner_key(user.0.as_ref().map(|u| u.user_id.as_str()), guest)
}

/// GET /api/cart
pub async fn get_cart(
    State(state): State<ServerState>,
    user: OptionalUser,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let owner = resolve_owner(&user, &headers)?;
    let view = state.cart().get_cart(&owner).await?;
    Ok(ok(view))
}

/// POST /api/cart/items
pub async fn add_item(
    State(state): State<ServerState>,
    user: OptionalUser,
    headers: HeaderMap,
    Json(payload): Json<CartItemInput>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let owner = resolve_owner(&user, &headers)?;
    let view = state.cart().add_item(&owner, payload).await?;
    Ok(ok(view))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// PUT /api/cart/items/{sku}
pub async fn update_item(
    State(state): State<ServerState>,
    user: OptionalUser,
    headers: HeaderMap,
    Path(sku): Path<String>,
    Json(payload): Json<UpdateItemRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let owner = resolve_owner(&user, &headers)?;
    let view = state
        .cart()
        .update_item(&owner, &sku, payload.quantity)
        .await?;
    Ok(ok(view))
}

/// DELETE /api/cart/items/{sku}
pub async fn remove_item(
    State(state): State<ServerState>,
    user: OptionalUser,
    headers: HeaderMap,
    Path(sku): Path<String>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let owner = resolve_owner(&user, &headers)?;
    let view = state.cart().remove_item(&owner, &sku).await?;
    Ok(ok(view))
}

/// DELETE /api/cart
pub async fn clear(
    State(state): State<ServerState>,
    user: OptionalUser,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<()>>> {
    let owner = resolve_owner(&user, &headers)?;
    state.cart().clear(&owner).await?;
    Ok(ok_with_message((), "Cart cleared"))
}

#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    pub code: String,
}

/// POST /api/cart/coupon
pub async fn apply_coupon(
    State(state): State<ServerState>,
    user: OptionalUser,
    headers: HeaderMap,
    Json(payload): Json<ApplyCouponRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let owner = resolve_owner(&user, &headers)?;
    let view = state.cart().apply_coupon(&owner, &payload.code).await?;
    Ok(ok(view))
}

/// DELETE /api/cart/coupon
pub async fn remove_coupon(
    State(state): State<ServerState>,
    user: OptionalUser,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let owner = resolve_owner(&user, &headers)?;
    let view = state.cart().remove_coupon(&owner).await?;
    Ok(ok(view))
}
