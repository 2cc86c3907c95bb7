//! Money arithmetic helpers
//!
//! Amounts cross the wire as f64 but all arithmetic happens in
//! [`Decimal`] and is rounded to 2 decimal places on the way out.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Round to 2dp, half away from zero.
pub fn round_money(value: f64) -> f64 {
    to_f64(to_decimal(value).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(10.125), 10.13);
        assert_eq!(round_money(10.124), 10.12);
    }

    #[test]
    fn f64_round_trip_is_exact_at_2dp() {
        assert_eq!(to_f64(to_decimal(999.99)), 999.99);
        assert_eq!(round_money(0.1 + 0.2), 0.3);
    }
}
