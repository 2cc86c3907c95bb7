//! Coupon model types
//!
//! Discount type and the rejection reasons a coupon validation can surface.
//! Rejection codes are part of the wire contract: clients branch on them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coupon discount type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// `value` percent off the order value
    Percent,
    /// `value` flat amount off
    Fixed,
}

/// Why a coupon was rejected
///
/// All of these are non-fatal domain outcomes reported to the caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CouponRejection {
    #[error("Coupon code not found")]
    InvalidCoupon,

    #[error("Coupon is not active at this time")]
    InactiveCoupon,

    #[error("Coupon usage limit exceeded")]
    UsageExceeded,

    #[error("Order value must be at least {min:.2} to use this coupon")]
    OrderValueTooLow { min: f64 },
}

impl CouponRejection {
    /// Stable wire code for the rejection
    pub fn code(&self) -> &'static str {
        match self {
            CouponRejection::InvalidCoupon => "INVALID_COUPON",
            CouponRejection::InactiveCoupon => "INACTIVE_COUPON",
            CouponRejection::UsageExceeded => "COUPON_USAGE_EXCEEDED",
            CouponRejection::OrderValueTooLow { .. } => "ORDER_VALUE_TOO_LOW",
        }
    }

    /// Unknown codes are 404, everything else is a 400-class rejection
    pub fn is_not_found(&self) -> bool {
        matches!(self, CouponRejection::InvalidCoupon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_codes_are_stable() {
        assert_eq!(CouponRejection::InvalidCoupon.code(), "INVALID_COUPON");
        assert_eq!(
            CouponRejection::OrderValueTooLow { min: 500.0 }.code(),
            "ORDER_VALUE_TOO_LOW"
        );
    }

    #[test]
    fn only_unknown_code_maps_to_not_found() {
        assert!(CouponRejection::InvalidCoupon.is_not_found());
        assert!(!CouponRejection::UsageExceeded.is_not_found());
    }
}
