//! Product and Variant models
//!
//! Variants live in their own table (not embedded in the product) so stock
//! mutations can be expressed as single-statement conditional updates on the
//! variant record, which SurrealDB applies atomically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use surrealdb::sql::Thing;
use validator::Validate;

use super::default_true;

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<Thing>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Record link to category
    pub category: Thing,
    #[serde(default)]
    pub images: Vec<String>,
    /// GST rate in percent (e.g. 18 = 18%), price-inclusive
    #[serde(default)]
    pub gst_rate: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Option<i64>,
}

/// Product variant entity
///
/// Invariant: `stock` never goes negative. It is only mutated through the
/// conditional decrement / unconditional restore in `VariantRepository`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: Option<Thing>,
    /// Record link to product
    pub product: Thing,
    /// Unique SKU
    pub sku: String,
    pub selling_price: f64,
    pub mrp: f64,
    pub stock: i32,
    /// Attribute map, e.g. {"size": "M", "color": "blue"}
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductCreate {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    /// Category id as "category:xyz" string
    pub category: String,
    pub images: Option<Vec<String>>,
    #[validate(range(min = 0, max = 100))]
    pub gst_rate: Option<i32>,
    /// Variants created alongside the product
    #[validate(nested)]
    pub variants: Vec<VariantCreate>,
}

/// Update product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub gst_rate: Option<i32>,
    pub is_active: Option<bool>,
}

/// Create variant payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VariantCreate {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(range(min = 0.0))]
    pub selling_price: f64,
    #[validate(range(min = 0.0))]
    pub mrp: f64,
    #[validate(range(min = 0))]
    pub stock: i32,
    pub attributes: Option<BTreeMap<String, String>>,
}

/// Update variant payload
///
/// `stock` here is an absolute admin restock; order operations never use it
/// and always go through the conditional decrement/restore path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantUpdate {
    pub selling_price: Option<f64>,
    pub mrp: Option<f64>,
    pub stock: Option<i32>,
    pub attributes: Option<BTreeMap<String, String>>,
    pub is_active: Option<bool>,
}
