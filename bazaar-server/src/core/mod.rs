//! Core module
//!
//! - [`Config`] - environment-driven configuration
//! - [`ServerState`] - shared state handed to every handler
//! - [`server`] - HTTP server assembly and startup

pub mod config;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::run;
pub use state::ServerState;
