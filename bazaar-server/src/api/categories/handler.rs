//! Category handlers

use axum::{
    Json,
    extract::{Path, State},
};

use shared::response::ApiResponse;

use crate::api::convert::CategoryView;
use crate::auth::{CurrentUser, require_admin};
use crate::core::ServerState;
use crate::db::models::{CategoryCreate, CategoryUpdate};
use crate::db::repository::CategoryRepository;
use crate::utils::{AppResult, ok, ok_with_message};

/// GET /api/categories - public listing
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<Vec<CategoryView>>>> {
    let categories = CategoryRepository::new(state.db().clone()).find_all().await?;
    Ok(ok(categories.into_iter().map(Into::into).collect()))
}

/// POST /api/categories - admin
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<Json<ApiResponse<CategoryView>>> {
    require_admin(&user)?;
    let category = CategoryRepository::new(state.db().clone()).create(payload).await?;
    Ok(ok(category.into()))
}

/// PUT /api/categories/{id} - admin
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<ApiResponse<CategoryView>>> {
    require_admin(&user)?;
    let category = CategoryRepository::new(state.db().clone())
        .update(&id, payload)
        .await?;
    Ok(ok(category.into()))
}

/// DELETE /api/categories/{id} - admin
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    require_admin(&user)?;
    CategoryRepository::new(state.db().clone()).delete(&id).await?;
    Ok(ok_with_message((), "Category deleted"))
}
