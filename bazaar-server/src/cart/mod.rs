//! Cart aggregator
//!
//! Snapshots are refreshed from the catalog on every read; the stored
//! cart only caches display data. Coupon application here is a pure
//! preview, usage is consumed at order creation.

pub mod service;

pub use service::{CartService, CartView, owner_key};
