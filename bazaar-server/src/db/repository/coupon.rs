//! Coupon Repository

use super::{BaseRepository, RepoError, RepoResult, make_thing, strip_table_prefix};
use crate::db::models::{Coupon, CouponCreate, CouponUpdate};
use crate::utils::time::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const COUPON_TABLE: &str = "coupon";

#[derive(Clone)]
pub struct CouponRepository {
    base: BaseRepository,
}

impl CouponRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Codes are stored uppercase; lookups normalize to match.
    pub async fn find_by_code(&self, code: &str) -> RepoResult<Option<Coupon>> {
        let coupons: Vec<Coupon> = self
            .base
            .db()
            .query("SELECT * FROM coupon WHERE code = $code")
            .bind(("code", code.trim().to_uppercase()))
            .await?
            .take(0)?;
        Ok(coupons.into_iter().next())
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Coupon>> {
        let pure_id = strip_table_prefix(COUPON_TABLE, id);
        let coupon: Option<Coupon> = self.base.db().select((COUPON_TABLE, pure_id)).await?;
        Ok(coupon)
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Coupon>> {
        let coupons: Vec<Coupon> = self
            .base
            .db()
            .query("SELECT * FROM coupon ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(coupons)
    }

    pub async fn create(&self, data: &CouponCreate) -> RepoResult<Coupon> {
        let code = data.code.trim().to_uppercase();
        if self.find_by_code(&code).await?.is_some() {
            return Err(RepoError::Duplicate(format!("Coupon {} already exists", code)));
        }
        let coupon = Coupon {
            id: None,
            code,
            discount_type: data.discount_type,
            value: data.value,
            max_discount: data.max_discount,
            min_order_value: data.min_order_value.unwrap_or(0.0),
            usage_limit: data.usage_limit,
            used_count: 0,
            valid_from: data.valid_from,
            valid_until: data.valid_until,
            promotion: None,
            is_active: true,
            created_at: Some(now_millis()),
        };
        let created: Option<Coupon> = self.base.db().create(COUPON_TABLE).content(coupon).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create coupon".to_string()))
    }

    /// Insert a promotion-generated coupon with an already-built row.
    pub async fn insert(&self, coupon: Coupon) -> RepoResult<Coupon> {
        let created: Option<Coupon> = self.base.db().create(COUPON_TABLE).content(coupon).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create coupon".to_string()))
    }

    pub async fn update(&self, id: &str, data: CouponUpdate) -> RepoResult<Coupon> {
        let thing = make_thing(COUPON_TABLE, id);

        let mut set_parts: Vec<&str> = Vec::new();
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
                .ok_or_else(|| RepoError::NotFound(format!("Coupon {} not found", id)));
        }

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(&query_str).bind(("thing", thing));
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

        let coupons: Vec<Coupon> = query.await?.take(0)?;
        coupons
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Coupon {} not found", id)))
    }

    /// Consume one use, guarding the limit in the same statement.
    /// Returns false when the limit was already reached by a concurrent
    /// order.
    pub async fn increment_usage(&self, code: &str) -> RepoResult<bool> {
        let updated: Vec<Coupon> = self
            .base
            .db()
            .query(
                "UPDATE coupon SET used_count += 1 \
                 WHERE code = $code AND (usage_limit = NONE OR used_count < usage_limit) \
                 RETURN AFTER",
            )
            .bind(("code", code.trim().to_uppercase()))
            .await?
            .take(0)?;
        Ok(!updated.is_empty())
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let pure_id = strip_table_prefix(COUPON_TABLE, id);
        let result: Option<Coupon> = self.base.db().delete((COUPON_TABLE, pure_id)).await?;
        if result.is_none() {
            return Err(RepoError::NotFound(format!("Coupon {} not found", id)));
        }
        Ok(())
    }
}
