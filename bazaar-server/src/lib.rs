//! Bazaar Server - e-commerce backend
//!
//! # Module structure
//!
//! ```text
//! bazaar-server/src/
//! ├── core/          # config, shared state, server wiring
//! ├── auth/          # JWT validation, request extractors
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # embedded SurrealDB, models, repositories
//! ├── cart/          # cart aggregation and snapshot refresh
//! ├── coupons/       # coupon validation/redemption, promotions
//! ├── orders/        # order lifecycle, payment reconciliation
//! ├── gateway/       # payment gateway client and payload normalization
//! ├── shipping/      # shipment creation / tracking providers
//! ├── notify/        # customer notification sinks
//! └── utils/         # errors, logging, money, time
//! ```

pub mod api;
pub mod auth;
pub mod cart;
pub mod core;
pub mod coupons;
pub mod db;
pub mod gateway;
pub mod notify;
pub mod orders;
pub mod shipping;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, ServerState};
pub use utils::{AppError, AppResult};

pub use utils::logger::{init_logger, init_logger_with_file};
