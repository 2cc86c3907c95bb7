//! Shared model types
//!
//! Status enums and small value types used in both API payloads and stored
//! records. Database entities themselves live server-side.

pub mod coupon;
pub mod order;
