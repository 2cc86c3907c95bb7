//! Product handlers
//!
//! Listing and detail are public; everything that mutates the catalog
//! is admin-only. Creating a product also creates its variants, so a
//! product is never listed without at least one purchasable SKU.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use validator::Validate;

use shared::response::{ApiResponse, PaginatedResponse, Pagination};

use crate::api::convert::{ProductDetail, ProductView, VariantView};
use crate::auth::{CurrentUser, OptionalUser, require_admin};
use crate::core::ServerState;
use crate::db::models::{ProductCreate, ProductUpdate, VariantCreate, VariantUpdate};
use crate::db::repository::{ProductQuery, ProductRepository, VariantRepository};
use crate::utils::{AppError, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/products - public listing with filters and pagination
pub async fn list(
    State(state): State<ServerState>,
    OptionalUser(user): OptionalUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<ProductView>>>> {
    // Inactive products are only visible to admins.
    let include_inactive =
        params.include_inactive && user.as_ref().is_some_and(|u| u.is_admin());

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    let filter = ProductQuery {
        category: params.category,
        search: params.search,
        include_inactive,
        page,
        per_page,
    };

    let (products, total) = ProductRepository::new(state.db().clone()).list(&filter).await?;
    let items: Vec<ProductView> = products.into_iter().map(Into::into).collect();
    Ok(ok(PaginatedResponse {
        items,
        pagination: Pagination::new(page, per_page, total),
    }))
}

/// GET /api/products/{id} - product with variants
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let product = ProductRepository::new(state.db().clone())
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", id)))?;
    let variants = VariantRepository::new(state.db().clone())
        .find_by_product(&id)
        .await?;

    Ok(ok(ProductDetail {
        product: product.into(),
        variants: variants.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/products - admin, creates product plus variants
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    require_admin(&user)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    if payload.variants.is_empty() {
        return Err(AppError::validation("Product needs at least one variant"));
    }

    let products = ProductRepository::new(state.db().clone());
    let variants_repo = VariantRepository::new(state.db().clone());

    let product = products.create(&payload).await?;
    let product_id = product
        .id
        .as_ref()
        .map(|t| t.id.to_string())
        .unwrap_or_default();

    let mut variants = Vec::with_capacity(payload.variants.len());
    for variant in &payload.variants {
        variants.push(variants_repo.create(&product_id, variant).await?);
    }

    Ok(ok(ProductDetail {
        product: product.into(),
        variants: variants.into_iter().map(Into::into).collect(),
    }))
}

/// PUT /api/products/{id} - admin
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<ApiResponse<ProductView>>> {
    require_admin(&user)?;
    let product = ProductRepository::new(state.db().clone())
        .update(&id, payload)
        .await?;
    Ok(ok(product.into()))
}

/// DELETE /api/products/{id} - admin soft delete
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    require_admin(&user)?;
    ProductRepository::new(state.db().clone()).deactivate(&id).await?;
    Ok(ok_with_message((), "Product deactivated"))
}

/// POST /api/products/{id}/variants - admin
pub async fn add_variant(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<VariantCreate>,
) -> AppResult<Json<ApiResponse<VariantView>>> {
    require_admin(&user)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let variant = VariantRepository::new(state.db().clone())
        .create(&id, &payload)
        .await?;
    Ok(ok(variant.into()))
}

/// PUT /api/products/variants/{sku} - admin price/stock/attribute update
pub async fn update_variant(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(sku): Path<String>,
    Json(payload): Json<VariantUpdate>,
) -> AppResult<Json<ApiResponse<VariantView>>> {
    require_admin(&user)?;
    let variant = VariantRepository::new(state.db().clone())
        .update(&sku, payload)
        .await?;
    Ok(ok(variant.into()))
}
