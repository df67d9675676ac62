//! Explicit-direction rounding for the withholding pipeline.
//!
//! The withholding flowchart names a scale and a direction for every
//! intermediate value. There is no global rounding mode: each call site picks
//! one of the methods of [`RoundExt`].

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounding with an explicit direction and number of decimal places.
///
/// # Example
///
/// ```
/// use lohnsteuer_engine::calculation::RoundExt;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let value = Decimal::from_str("12.341").unwrap();
/// assert_eq!(value.round_down(2), Decimal::from_str("12.34").unwrap());
/// assert_eq!(value.round_up(2), Decimal::from_str("12.35").unwrap());
/// assert_eq!(value.round_half_up(2), Decimal::from_str("12.34").unwrap());
/// ```
pub trait RoundExt {
    /// Truncates towards zero (ROUND_DOWN).
    fn round_down(self, dp: u32) -> Self;
    /// Rounds away from zero (ROUND_UP).
    fn round_up(self, dp: u32) -> Self;
    /// Commercial rounding, ties away from zero.
    fn round_half_up(self, dp: u32) -> Self;
}

impl RoundExt for Decimal {
    fn round_down(self, dp: u32) -> Self {
        self.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
    }

    fn round_up(self, dp: u32) -> Self {
        self.round_dp_with_strategy(dp, RoundingStrategy::AwayFromZero)
    }

    fn round_half_up(self, dp: u32) -> Self {
        self.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_down_truncates() {
        assert_eq!(dec("1.999").round_down(2), dec("1.99"));
        assert_eq!(dec("1.999").round_down(0), dec("1"));
        assert_eq!(dec("0.0000009").round_down(6), dec("0"));
    }

    #[test]
    fn test_round_down_negative_moves_towards_zero() {
        assert_eq!(dec("-1.999").round_down(2), dec("-1.99"));
        assert_eq!(dec("-0.5").round_down(0), dec("0"));
    }

    #[test]
    fn test_round_up_moves_away_from_zero() {
        assert_eq!(dec("1.001").round_up(2), dec("1.01"));
        assert_eq!(dec("101.01").round_up(0), dec("102"));
        assert_eq!(dec("-1.001").round_up(2), dec("-1.01"));
    }

    #[test]
    fn test_exact_values_are_unchanged() {
        assert_eq!(dec("12.30").round_up(2), dec("12.30"));
        assert_eq!(dec("12.30").round_down(2), dec("12.30"));
        assert_eq!(dec("36").round_up(0), dec("36"));
    }

    #[test]
    fn test_round_half_up_ties_away_from_zero() {
        assert_eq!(dec("2.345").round_half_up(2), dec("2.35"));
        assert_eq!(dec("2.344").round_half_up(2), dec("2.34"));
        assert_eq!(dec("2.5").round_half_up(0), dec("3"));
    }
}
