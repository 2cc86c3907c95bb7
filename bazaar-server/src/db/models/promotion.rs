//! Promotion model
//!
//! A promotion is a campaign definition used to mass-generate coupons with a
//! shared code prefix. It never applies a discount directly; unknown codes
//! matching an active promotion's prefix are materialized into coupon
//! records on first validation.

use serde::{Deserialize, Serialize};
use shared::DiscountType;
use surrealdb::sql::Thing;

use super::default_true;

/// Promotion entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: Option<Thing>,
    pub name: String,
    pub discount_type: DiscountType,
    pub value: f64,
    pub max_discount: Option<f64>,
    #[serde(default)]
    pub min_order_value: f64,
    /// Per-generated-coupon usage limit (None = unlimited)
    pub usage_limit: Option<i64>,
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
    /// Uppercase code prefix for generated coupons, e.g. "DIWALI"
    pub code_prefix: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Option<i64>,
}

/// Create promotion payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionCreate {
    pub name: String,
    pub discount_type: DiscountType,
    pub value: f64,
    pub max_discount: Option<f64>,
    pub min_order_value: Option<f64>,
    pub usage_limit: Option<i64>,
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
    pub code_prefix: String,
}

/// Update promotion payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionUpdate {
    pub name: Option<String>,
    pub value: Option<f64>,
    pub max_discount: Option<f64>,
    pub min_order_value: Option<f64>,
    pub usage_limit: Option<i64>,
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
    pub is_active: Option<bool>,
}

/// Bulk coupon generation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCoupons {
    pub count: u32,
}
