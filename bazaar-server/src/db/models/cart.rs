//! Cart model
//!
//! One cart per owner key (`user:<id>` XOR `guest:<session>`), created
//! lazily on first add. Item snapshots (price, stock, gst) are refreshed
//! from the catalog on every read; the stored copy is only a cache.

use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

/// Cart entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: Option<Thing>,
    /// "user:<id>" or "guest:<session>", unique per cart
    pub owner_key: String,
    pub user_id: Option<String>,
    pub guest_session_id: Option<String>,
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Applied coupon code (preview only; no usage is consumed here)
    pub coupon_code: Option<String>,
    /// Discount preview computed at last read, against the refreshed subtotal
    #[serde(default)]
    pub discount_preview: f64,
    pub updated_at: i64,
}

/// Cart line item with cached display snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Record link to product
    pub product: Thing,
    pub variant_sku: String,
    pub quantity: i32,
    // Snapshot fields below are refreshed from the catalog at read time.
    pub product_name: String,
    pub image: Option<String>,
    pub unit_price: f64,
    pub gst_rate: i32,
    pub in_stock: bool,
}

/// Add/update item payload
///
/// `variant_sku` is preferred; `size`/`color` drive the legacy
/// attribute-matching fallback when the SKU is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemInput {
    /// Product id as "product:xyz" string
    pub product_id: String,
    pub variant_sku: Option<String>,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}
