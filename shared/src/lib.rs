//! Shared wire-level types for the Bazaar commerce platform
//!
//! Types in this crate cross the HTTP boundary and are used by both the
//! server and its clients:
//!
//! - [`response`]: unified API response envelope and pagination
//! - [`models`]: order/payment/coupon status enums and their transition rules

pub mod models;
pub mod response;

pub use models::coupon::{CouponRejection, DiscountType};
pub use models::order::{
    OrderStatus, PaymentMethod, PaymentStatus, RefundStatus, ReturnKind, ReturnStatus,
    StatusHistoryEntry,
};
pub use response::{ApiResponse, PaginatedResponse, Pagination};
