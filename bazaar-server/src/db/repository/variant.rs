//! Variant Repository
//!
//! Variants live in their own table so stock can be decremented with a
//! single conditional UPDATE instead of read-modify-write on the parent
//! product document.

use super::{BaseRepository, RepoError, RepoResult, make_thing};
use crate::db::models::{Variant, VariantCreate, VariantUpdate};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const VARIANT_TABLE: &str = "variant";

#[derive(Clone)]
pub struct VariantRepository {
    base: BaseRepository,
}

impl VariantRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_sku(&self, sku: &str) -> RepoResult<Option<Variant>> {
        let variants: Vec<Variant> = self
            .base
            .db()
            .query("SELECT * FROM variant WHERE sku = $sku")
            .bind(("sku", sku.to_string()))
            .await?
            .take(0)?;
        Ok(variants.into_iter().next())
    }

    pub async fn find_by_product(&self, product_id: &str) -> RepoResult<Vec<Variant>> {
        let variants: Vec<Variant> = self
            .base
            .db()
            .query("SELECT * FROM variant WHERE product = $product AND is_active = true")
            .bind(("product", make_thing("product", product_id)))
            .await?
            .take(0)?;
        Ok(variants)
    }

    pub async fn create(&self, product_id: &str, data: &VariantCreate) -> RepoResult<Variant> {
        if self.find_by_sku(&data.sku).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "SKU {} already exists",
                data.sku
            )));
        }
        let variant = Variant {
            id: None,
            product: make_thing("product", product_id),
            sku: data.sku.clone(),
            selling_price: data.selling_price,
            mrp: data.mrp,
            stock: data.stock,
            attributes: data.attributes.clone().unwrap_or_default(),
            is_active: true,
        };
        let created: Option<Variant> =
            self.base.db().create(VARIANT_TABLE).content(variant).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create variant".to_string()))
    }

    pub async fn update(&self, sku: &str, data: VariantUpdate) -> RepoResult<Variant> {
        let mut set_parts: Vec<&str> = Vec::new();
        if data.selling_price.is_some() {
            set_parts.push("selling_price = $selling_price");
        }
        if data.mrp.is_some() {
            set_parts.push("mrp = $mrp");
        }
        if data.stock.is_some() {
            set_parts.push("stock = $stock");
        }
        if data.attributes.is_some() {
            set_parts.push("attributes = $attributes");
        }
        if data.is_active.is_some() {
            set_parts.push("is_active = $is_active");
        }

        if set_parts.is_empty() {
            return self
                .find_by_sku(sku)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Variant {} not found", sku)));
        }

        let query_str = format!(
            "UPDATE variant SET {} WHERE sku = $sku RETURN AFTER",
            set_parts.join(", ")
        );
        let mut query = self
            .base
            .db()
            .query(&query_str)
            .bind(("sku", sku.to_string()));
        if let Some(v) = data.selling_price {
            query = query.bind(("selling_price", v));
        }
        if let Some(v) = data.mrp {
            query = query.bind(("mrp", v));
        }
        if let Some(v) = data.stock {
            query = query.bind(("stock", v));
        }
        if let Some(v) = data.attributes {
            query = query.bind(("attributes", v));
        }
        if let Some(v) = data.is_active {
            query = query.bind(("is_active", v));
        }

        let variants: Vec<Variant> = query.await?.take(0)?;
        variants
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Variant {} not found", sku)))
    }

    /// Atomically reserve stock. Returns false when remaining stock is
    /// insufficient, leaving the row untouched.
    pub async fn try_decrement_stock(&self, sku: &str, quantity: i32) -> RepoResult<bool> {
        let updated: Vec<Variant> = self
            .base
            .db()
            .query("UPDATE variant SET stock -= $qty WHERE sku = $sku AND stock >= $qty RETURN AFTER")
            .bind(("sku", sku.to_string()))
            .bind(("qty", quantity))
            .await?
            .take(0)?;
        Ok(!updated.is_empty())
    }

    /// Compensating restore for a prior decrement (failed multi-line
    /// reservation, cancellation, approved return).
    pub async fn restore_stock(&self, sku: &str, quantity: i32) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE variant SET stock += $qty WHERE sku = $sku")
            .bind(("sku", sku.to_string()))
            .bind(("qty", quantity))
            .await?;
        Ok(())
    }
}
