//! Bulk coupon generation for promotions

use rand::Rng;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::info;

use crate::db::models::Coupon;
use crate::db::repository::{CouponRepository, PromotionRepository};
use crate::utils::time::now_millis;
use crate::utils::{AppError, AppResult};

const CODE_SUFFIX_LEN: usize = 6;
// Ambiguous glyphs (0/O, 1/I) excluded, codes get read out loud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_SUFFIX_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Generate `count` coupons carrying the promotion's terms, each with a
/// unique `PREFIX-XXXXXX` code. Collisions with existing codes are
/// retried with a fresh suffix.
pub async fn generate_promotion_coupons(
    db: Surreal<Db>,
    promotion_id: &str,
    count: u32,
) -> AppResult<Vec<Coupon>> {
    let promotions = PromotionRepository::new(db.clone());
    let coupons = CouponRepository::new(db);

    let promo = promotions
        .find_by_id(promotion_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Promotion {} not found", promotion_id)))?;
    if promo.code_prefix.is_empty() {
        return Err(AppError::validation(
            "Promotion has no code prefix to generate from",
        ));
    }

    let mut generated = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let mut attempts = 0;
        loop {
            let code = format!("{}-{}", promo.code_prefix, random_suffix());
            if coupons.find_by_code(&code).await?.is_some() {
                attempts += 1;
                if attempts > 10 {
                    return Err(AppError::internal("Could not generate a unique coupon code"));
                }
                continue;
            }
            let coupon = Coupon {
                id: None,
                code,
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
            generated.push(coupons.insert(coupon).await?);
            break;
        }
    }

    info!(
        promotion = %promo.name,
        count = generated.len(),
        "Generated promotion coupons"
    );
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::PromotionCreate;
    use crate::db::testing::memory_db;
    use shared::DiscountType;

    #[test]
    fn suffix_uses_unambiguous_alphabet() {
        for _ in 0..50 {
            let s = random_suffix();
            assert_eq!(s.len(), CODE_SUFFIX_LEN);
            assert!(s.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[tokio::test]
    async fn generates_distinct_prefixed_codes() {
        let db = memory_db().await;
        let promos = PromotionRepository::new(db.clone());
        let promo = promos
            .create(&PromotionCreate {
                name: "Summer".to_string(),
                discount_type: DiscountType::Percent,
                value: 15.0,
                max_discount: Some(200.0),
                min_order_value: None,
                usage_limit: Some(1),
                valid_from: None,
                valid_until: None,
                code_prefix: "SUMMER".to_string(),
            })
            .await
            .unwrap();

        let id = promo.id.as_ref().unwrap().id.to_string();
        let generated = generate_promotion_coupons(db, &id, 5).await.unwrap();
        assert_eq!(generated.len(), 5);

        let mut codes: Vec<&str> = generated.iter().map(|c| c.code.as_str()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 5);
        assert!(codes.iter().all(|c| c.starts_with("SUMMER-")));
    }
}
