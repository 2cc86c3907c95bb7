//! Promotion Repository

use super::{BaseRepository, RepoError, RepoResult, make_thing, strip_table_prefix};
use crate::db::models::{Promotion, PromotionCreate, PromotionUpdate};
use crate::utils::time::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const PROMOTION_TABLE: &str = "promotion";

#[derive(Clone)]
pub struct PromotionRepository {
    base: BaseRepository,
}

impl PromotionRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Promotion>> {
        let pure_id = strip_table_prefix(PROMOTION_TABLE, id);
        let promotion: Option<Promotion> = self.base.db().select((PROMOTION_TABLE, pure_id)).await?;
        Ok(promotion)
    }

    /// Active promotions whose code_prefix matches the given code, used
    /// as a fallback when a coupon code is not materialized yet.
    pub async fn find_by_prefix_match(&self, code: &str) -> RepoResult<Option<Promotion>> {
        let promotions: Vec<Promotion> = self
            .base
            .db()
            .query(
                "SELECT * FROM promotion \
                 WHERE is_active = true AND code_prefix != '' \
                 AND string::starts_with($code, code_prefix)",
            )
            .bind(("code", code.trim().to_uppercase()))
            .await?
            .take(0)?;
        // Longest prefix wins if several promotions share a stem.
        Ok(promotions
            .into_iter()
            .max_by_key(|p| p.code_prefix.len()))
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Promotion>> {
        let promotions: Vec<Promotion> = self
            .base
            .db()
            .query("SELECT * FROM promotion ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(promotions)
    }

    pub async fn create(&self, data: &PromotionCreate) -> RepoResult<Promotion> {
        let promotion = Promotion {
            id: None,
            name: data.name.clone(),
            discount_type: data.discount_type,
            value: data.value,
            max_discount: data.max_discount,
            min_order_value: data.min_order_value.unwrap_or(0.0),
            usage_limit: data.usage_limit,
            valid_from: data.valid_from,
            valid_until: data.valid_until,
            code_prefix: data.code_prefix.trim().to_uppercase(),
            is_active: true,
            created_at: Some(now_millis()),
        };
        let created: Option<Promotion> = self
            .base
            .db()
            .create(PROMOTION_TABLE)
            .content(promotion)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create promotion".to_string()))
    }

    pub async fn update(&self, id: &str, data: PromotionUpdate) -> RepoResult<Promotion> {
        let thing = make_thing(PROMOTION_TABLE, id);

        let mut set_parts: Vec<&str> = Vec::new();
        if data.name.is_some() {
            set_parts.push("name = $name");
        }
        if data.value.is_some() {
            set_parts.push("value = $value");
        }
        if data.max_discount.is_some() {
            set_parts.push("max_discount = $max_discount");
        }
        if data.min_order_value.is_some() {
            set_parts.push("min_order_value = $min_order_value");
        }
        if data.usage_limit.is_some() {
            set_parts.push("usage_limit = $usage_limit");
        }
        if data.valid_from.is_some() {
            set_parts.push("valid_from = $valid_from");
        }
        if data.valid_until.is_some() {
            set_parts.push("valid_until = $valid_until");
        }
        if data.is_active.is_some() {
            set_parts.push("is_active = $is_active");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Promotion {} not found", id)));
        }

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(&query_str).bind(("thing", thing));
        if let Some(v) = data.name {
            query = query.bind(("name", v));
        }
        if let Some(v) = data.value {
            query = query.bind(("value", v));
        }
        if let Some(v) = data.max_discount {
            query = query.bind(("max_discount", v));
        }
        if let Some(v) = data.min_order_value {
            query = query.bind(("min_order_value", v));
        }
        if let Some(v) = data.usage_limit {
            query = query.bind(("usage_limit", v));
        }
        if let Some(v) = data.valid_from {
            query = query.bind(("valid_from", v));
        }
        if let Some(v) = data.valid_until {
            query = query.bind(("valid_until", v));
        }
        if let Some(v) = data.is_active {
            query = query.bind(("is_active", v));
        }

        let promotions: Vec<Promotion> = query.await?.take(0)?;
        promotions
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Promotion {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let pure_id = strip_table_prefix(PROMOTION_TABLE, id);
        let result: Option<Promotion> =
            self.base.db().delete((PROMOTION_TABLE, pure_id)).await?;
        if result.is_none() {
            return Err(RepoError::NotFound(format!("Promotion {} not found", id)));
        }
        Ok(())
    }
}
