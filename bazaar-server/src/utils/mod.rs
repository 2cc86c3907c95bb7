//! Utility module
//!
//! - [`AppError`] / [`AppResult`] - application error type and handler result
//! - [`logger`] - tracing setup
//! - [`money`] - decimal-backed money arithmetic
//! - [`time`] - timestamp helpers

pub mod error;
pub mod logger;
pub mod money;
pub mod time;

pub use error::{AppError, AppResult, ok, ok_with_message};
