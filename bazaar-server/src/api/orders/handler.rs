//! Order handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;

use shared::OrderStatus;
use shared::response::{ApiResponse, PaginatedResponse, Pagination};

use crate::api::convert::{CreatedOrderView, OrderView};
use crate::auth::{CurrentUser, OptionalUser, require_admin};
use crate::core::ServerState;
use crate::db::models::OrderCreate;
use crate::db::repository::OrderQuery;
use crate::orders::{Actor, ProcessReturnAction, ReturnRequestInput};
use crate::utils::{AppResult, ok, ok_with_message};

const GUEST_SESSION_HEADER: &str = "x-guest-session";

fn actor_for(user: &OptionalUser, headers: &HeaderMap) -> Actor {
    if let Some(user) = &user.0 {
        return Actor::from_current_user(user);
    }
    headers
        .get(GUEST_SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(Actor::guest)
        .unwrap_or_default()
}

/// POST /api/orders
///
/// Guests may identify via the `X-Guest-Session` header or the payload's
/// `guest_session_id`. Responds 201 with the order and, for online
/// payment, the gateway session the client completes payment against.
pub async fn create(
    State(state): State<ServerState>,
    user: OptionalUser,
    headers: HeaderMap,
    Json(payload): Json<OrderCreate>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatedOrderView>>)> {
    let actor = actor_for(&user, &headers);
    let created = state.orders().create_order(&actor, payload).await?;
    Ok((StatusCode::CREATED, ok(created.into())))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<OrderStatus>,
    pub user_id: Option<String>,
    pub guest_session_id: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/orders - admin listing with filters
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<OrderView>>>> {
    require_admin(&user)?;
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    let filter = OrderQuery {
        status: params.status,
        user_id: params.user_id,
        guest_session_id: params.guest_session_id,
        page,
        per_page,
    };
    let (orders, total) = state.orders().list_orders(&filter).await?;
    let items: Vec<OrderView> = orders.into_iter().map(Into::into).collect();
    Ok(ok(PaginatedResponse {
        items,
        pagination: Pagination::new(page, per_page, total),
    }))
}

/// GET /api/orders/my - the caller's own orders
pub async fn my_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<OrderView>>>> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    let filter = OrderQuery {
        status: params.status,
        user_id: Some(user.user_id.clone()),
        guest_session_id: None,
        page,
        per_page,
    };
    let (orders, total) = state.orders().list_orders(&filter).await?;
    let items: Vec<OrderView> = orders.into_iter().map(Into::into).collect();
    Ok(ok(PaginatedResponse {
        items,
        pagination: Pagination::new(page, per_page, total),
    }))
}

/// GET /api/orders/{order_number} - owner or admin
pub async fn get(
    State(state): State<ServerState>,
    user: OptionalUser,
    headers: HeaderMap,
    Path(order_number): Path<String>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let actor = actor_for(&user, &headers);
    let order = state.orders().get_order_for(&order_number, &actor).await?;
    Ok(ok(order.into()))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
    pub note: Option<String>,
}

/// POST /api/orders/{order_number}/status - admin
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_number): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    require_admin(&user)?;
    let order = state
        .orders()
        .update_status(&order_number, payload.status, payload.note)
        .await?;
    Ok(ok(order.into()))
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// POST /api/orders/{order_number}/cancel - owner or admin
pub async fn cancel(
    State(state): State<ServerState>,
    user: OptionalUser,
    headers: HeaderMap,
    Path(order_number): Path<String>,
    payload: Option<Json<CancelRequest>>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let actor = actor_for(&user, &headers);
    let reason = payload.and_then(|Json(p)| p.reason);
    let order = state
        .orders()
        .cancel_order(&order_number, &actor, reason)
        .await?;
    Ok(ok(order.into()))
}

/// POST /api/orders/{order_number}/return - owner or admin
pub async fn request_return(
    State(state): State<ServerState>,
    user: OptionalUser,
    headers: HeaderMap,
    Path(order_number): Path<String>,
    Json(payload): Json<ReturnRequestInput>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let actor = actor_for(&user, &headers);
    let order = state
        .orders()
        .request_return_exchange(&order_number, &actor, payload)
        .await?;
    Ok(ok(order.into()))
}

#[derive(Debug, Deserialize)]
pub struct ProcessReturnRequest {
    pub action: ProcessReturnAction,
}

/// POST /api/orders/{order_number}/return/process - admin
pub async fn process_return(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_number): Path<String>,
    Json(payload): Json<ProcessReturnRequest>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    require_admin(&user)?;
    let actor = Actor::from_current_user(&user);
    let order = state
        .orders()
        .process_return_exchange(&order_number, &actor, payload.action)
        .await?;
    Ok(ok(order.into()))
}

/// DELETE /api/orders/{order_number} - admin, payment-pending orders only
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_number): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    require_admin(&user)?;
    state.orders().delete_order(&order_number).await?;
    Ok(ok_with_message((), "Order deleted"))
}

/// GET /api/orders/stats - admin dashboard aggregates
pub async fn stats(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<crate::orders::OrderStats>>> {
    require_admin(&user)?;
    let stats = state.orders().order_stats(5).await?;
    Ok(ok(stats))
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub guest_session_id: String,
}

#[derive(Debug, serde::Serialize)]
pub struct ClaimResult {
    pub claimed: u64,
}

/// POST /api/orders/claim - attach guest orders to the authenticated user
pub async fn claim(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ClaimRequest>,
) -> AppResult<Json<ApiResponse<ClaimResult>>> {
    let claimed = state
        .orders()
        .claim_guest_orders(&payload.guest_session_id, &user.user_id)
        .await?;
    Ok(ok(ClaimResult { claimed }))
}
