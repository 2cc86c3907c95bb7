//! Coupon engine
//!
//! Validation is a pure preview: it never consumes a use. The single
//! point that consumes usage is [`CouponEngine::redeem`], called from
//! order creation after stock is reserved.

pub mod engine;
pub mod promotions;

pub use engine::{CouponEngine, DiscountQuote, compute_discount};
pub use promotions::generate_promotion_coupons;
