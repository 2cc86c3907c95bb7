//! Coupon model

use serde::{Deserialize, Serialize};
use shared::DiscountType;
use surrealdb::sql::Thing;
use validator::Validate;

use super::default_true;

/// Coupon entity
///
/// Invariants: `code` is globally unique and stored uppercase;
/// `used_count <= usage_limit` when a limit is set (enforced by the
/// conditional redeem update, never by read-check-write).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Option<Thing>,
    /// Uppercase-normalized unique code
    pub code: String,
    pub discount_type: DiscountType,
    /// Percent (e.g. 10 = 10%) or flat amount, per `discount_type`
    pub value: f64,
    /// Cap for percent-type discounts
    pub max_discount: Option<f64>,
    #[serde(default)]
    pub min_order_value: f64,
    /// None = unlimited
    pub usage_limit: Option<i64>,
    #[serde(default)]
    pub used_count: i64,
    /// Validity window, Unix millis; open-ended when None
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
    /// Record link to the promotion that generated this coupon, if any
    pub promotion: Option<Thing>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Option<i64>,
}

/// Create coupon payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CouponCreate {
    #[validate(length(min = 3, max = 32))]
    pub code: String,
    pub discount_type: DiscountType,
    #[validate(range(min = 0.0))]
    pub value: f64,
    pub max_discount: Option<f64>,
    pub min_order_value: Option<f64>,
    pub usage_limit: Option<i64>,
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
}

/// Update coupon payload (`used_count` is not client-settable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponUpdate {
    pub value: Option<f64>,
    pub max_discount: Option<f64>,
    pub min_order_value: Option<f64>,
    pub usage_limit: Option<i64>,
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
    pub is_active: Option<bool>,
}
