//! Coupon validation and redemption

use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::info;

use shared::{CouponRejection, DiscountType};

use crate::db::models::Coupon;
use crate::db::repository::{CouponRepository, PromotionRepository};
use crate::utils::money::{round_money, to_decimal, to_f64};
use crate::utils::time::now_millis;
use crate::utils::{AppError, AppResult};

/// Result of a successful validation, attached to carts as a preview
/// and to orders as the applied discount.
#[derive(Debug, Clone, Serialize)]
pub struct DiscountQuote {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount: f64,
}

/// Discount amount for the given terms against an order value, rounded
/// to 2dp. Percent discounts are capped by `max_discount`; no discount
/// ever exceeds the order value.
pub fn compute_discount(
    discount_type: DiscountType,
    value: f64,
    max_discount: Option<f64>,
    order_value: f64,
) -> f64 {
    let order = to_decimal(order_value);
    let raw = match discount_type {
        DiscountType::Percent => {
            let pct = to_decimal(value) / rust_decimal::Decimal::from(100);
            let discount = order * pct;
            match max_discount {
                Some(cap) => discount.min(to_decimal(cap)),
                None => discount,
            }
        }
        DiscountType::Fixed => to_decimal(value),
    };
    round_money(to_f64(raw.min(order).max(rust_decimal::Decimal::ZERO)))
}

#[derive(Clone)]
pub struct CouponEngine {
    coupons: CouponRepository,
    promotions: PromotionRepository,
}

impl CouponEngine {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            coupons: CouponRepository::new(db.clone()),
            promotions: PromotionRepository::new(db),
        }
    }

    /// Validate `code` against `order_value` without consuming a use.
    ///
    /// Checks run in a fixed order so the client always sees the most
    /// fundamental failure first: existence, then validity window, then
    /// usage, then minimum order value.
    pub async fn validate(&self, code: &str, order_value: f64) -> AppResult<(Coupon, DiscountQuote)> {
        let coupon = self.resolve(code).await?;
        let now = now_millis();

        if !coupon.is_active {
            return Err(CouponRejection::InactiveCoupon.into());
        }
        if let Some(from) = coupon.valid_from {
            if now < from {
                return Err(CouponRejection::InactiveCoupon.into());
            }
        }
        if let Some(until) = coupon.valid_until {
            if now >= until {
                return Err(CouponRejection::InactiveCoupon.into());
            }
        }
        if let Some(limit) = coupon.usage_limit {
            if coupon.used_count >= limit {
                return Err(CouponRejection::UsageExceeded.into());
            }
        }
        if order_value < coupon.min_order_value {
            return Err(CouponRejection::OrderValueTooLow {
                min: coupon.min_order_value,
            }
            .into());
        }

        let discount = compute_discount(
            coupon.discount_type,
            coupon.value,
            coupon.max_discount,
            order_value,
        );
        let quote = DiscountQuote {
            code: coupon.code.clone(),
            discount_type: coupon.discount_type,
            discount,
        };
        Ok((coupon, quote))
    }

    /// Consume one use of a validated coupon. Fails with UsageExceeded
    /// when a concurrent order took the last slot between validation
    /// and redemption.
    pub async fn redeem(&self, code: &str) -> AppResult<()> {
        if self.coupons.increment_usage(code).await? {
            Ok(())
        } else {
            Err(CouponRejection::UsageExceeded.into())
        }
    }

    /// Find the coupon row for `code`, falling back to promotion
    /// prefix matching. A prefix hit materializes a real coupon record
    /// carrying the promotion's terms, so subsequent lookups and usage
    /// counting work like any other coupon.
    async fn resolve(&self, code: &str) -> AppResult<Coupon> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(CouponRejection::InvalidCoupon.into());
        }
        if let Some(coupon) = self.coupons.find_by_code(&code).await? {
            return Ok(coupon);
        }

        let Some(promo) = self.promotions.find_by_prefix_match(&code).await? else {
            return Err(CouponRejection::InvalidCoupon.into());
        };
        // A bare prefix is the campaign stem, not a coupon.
        if code == promo.code_prefix {
            return Err(CouponRejection::InvalidCoupon.into());
        }

        let coupon = Coupon {
            id: None,
            code: code.clone(),
            discount_type: promo.discount_type,
            value: promo.value,
            max_discount: promo.max_discount,
            min_order_value: promo.min_order_value,
            usage_limit: promo.usage_limit,
            used_count: 0,
            valid_from: promo.valid_from,
            valid_until: promo.valid_until,
            promotion: promo.id.clone(),
            is_active: true,
            created_at: Some(now_millis()),
        };
        info!(code = %code, promotion = %promo.name, "Materialized coupon from promotion prefix");
        match self.coupons.insert(coupon).await {
            Ok(created) => Ok(created),
            // Lost a race on the unique code index; the winner's row is
            // just as good.
            Err(e) => match self.coupons.find_by_code(&code).await? {
                Some(existing) => Ok(existing),
                None => Err(e.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CouponCreate, PromotionCreate};
    use crate::db::testing::memory_db;

    fn percent_coupon(code: &str) -> CouponCreate {
        CouponCreate {
            code: code.to_string(),
            discount_type: DiscountType::Percent,
            value: 10.0,
            max_discount: Some(100.0),
            min_order_value: Some(500.0),
            usage_limit: Some(2),
            valid_from: None,
            valid_until: None,
        }
    }

    #[test]
    fn percent_discount_is_capped() {
        assert_eq!(
            compute_discount(DiscountType::Percent, 10.0, Some(100.0), 2000.0),
            100.0
        );
        assert_eq!(
            compute_discount(DiscountType::Percent, 10.0, Some(100.0), 800.0),
            80.0
        );
    }

    #[test]
    fn fixed_discount_never_exceeds_order_value() {
        assert_eq!(compute_discount(DiscountType::Fixed, 200.0, None, 150.0), 150.0);
        assert_eq!(compute_discount(DiscountType::Fixed, 200.0, None, 600.0), 200.0);
    }

    #[tokio::test]
    async fn validate_enforces_check_order() {
        let db = memory_db().await;
        let engine = CouponEngine::new(db.clone());
        let repo = CouponRepository::new(db);
        repo.create(&percent_coupon("SAVE10")).await.unwrap();

        // Unknown code
        let err = engine.validate("NOPE", 1000.0).await.unwrap_err();
        assert!(matches!(err, AppError::Coupon(CouponRejection::InvalidCoupon)));

        // Below minimum
        let err = engine.validate("SAVE10", 100.0).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Coupon(CouponRejection::OrderValueTooLow { .. })
        ));

        // Lowercase input normalizes
        let (_, quote) = engine.validate("save10", 1000.0).await.unwrap();
        assert_eq!(quote.discount, 100.0);
    }

    #[tokio::test]
    async fn expired_coupon_is_inactive() {
        let db = memory_db().await;
        let engine = CouponEngine::new(db.clone());
        let repo = CouponRepository::new(db);
        let mut create = percent_coupon("OLD10");
        create.valid_until = Some(now_millis() - 1);
        repo.create(&create).await.unwrap();

        let err = engine.validate("OLD10", 1000.0).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Coupon(CouponRejection::InactiveCoupon)
        ));
    }

    #[tokio::test]
    async fn redeem_counts_down_to_limit() {
        let db = memory_db().await;
        let engine = CouponEngine::new(db.clone());
        let repo = CouponRepository::new(db);
        repo.create(&percent_coupon("TWICE")).await.unwrap();

        engine.redeem("TWICE").await.unwrap();
        engine.redeem("TWICE").await.unwrap();
        let err = engine.redeem("TWICE").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Coupon(CouponRejection::UsageExceeded)
        ));

        // Validation now reports the exhausted limit too.
        let err = engine.validate("TWICE", 1000.0).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Coupon(CouponRejection::UsageExceeded)
        ));
    }

    #[tokio::test]
    async fn prefix_fallback_materializes_coupon() {
        let db = memory_db().await;
        let engine = CouponEngine::new(db.clone());
        let promos = PromotionRepository::new(db.clone());
        promos
            .create(&PromotionCreate {
                name: "Diwali".to_string(),
                discount_type: DiscountType::Fixed,
                value: 50.0,
                max_discount: None,
                min_order_value: None,
                usage_limit: Some(1),
                valid_from: None,
                valid_until: None,
                code_prefix: "DIWALI".to_string(),
            })
            .await
            .unwrap();

        let (coupon, quote) = engine.validate("DIWALI-A1B2", 400.0).await.unwrap();
        assert_eq!(quote.discount, 50.0);
        assert!(coupon.promotion.is_some());

        // Materialized row is now a normal coupon with its own counter.
        let repo = CouponRepository::new(db);
        assert!(repo.find_by_code("DIWALI-A1B2").await.unwrap().is_some());

        // The bare prefix itself is not a valid code.
        let err = engine.validate("DIWALI", 400.0).await.unwrap_err();
        assert!(matches!(err, AppError::Coupon(CouponRejection::InvalidCoupon)));
    }
}
