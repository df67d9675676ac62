//! Solidarity surcharge and church tax base.
//!
//! The surcharge is 5.5 % of the annual income tax after child allowances,
//! but only above the exemption. Just above it a phase-in zone levies a
//! share of the excess instead, whichever is lower.

use rust_decimal::Decimal;

use super::rounding::RoundExt;
use super::tariff::tax_for_class;
use super::wage_tax::Pipeline;

/// The full surcharge rate in percent.
pub(crate) const SURCHARGE_RATE: Decimal = Decimal::from_parts(55, 0, 0, false, 1);

/// Returns the annual surcharge for an income tax, in euros with cents.
///
/// `exemption` must already be multiplied for the splitting formula.
///
/// # Example
///
/// ```
/// use lohnsteuer_engine::calculation::annual_surcharge;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let rate = Decimal::from_str("11.9").unwrap();
/// let exemption = Decimal::from(19950);
/// assert_eq!(annual_surcharge(Decimal::from(19950), exemption, rate), Decimal::ZERO);
/// assert_eq!(annual_surcharge(Decimal::from(20950), exemption, rate), Decimal::from_str("119").unwrap());
/// assert_eq!(annual_surcharge(Decimal::from(40000), exemption, rate), Decimal::from(2200));
/// ```
pub fn annual_surcharge(income_tax: Decimal, exemption: Decimal, phase_in_rate: Decimal) -> Decimal {
    if income_tax <= exemption {
        return Decimal::ZERO;
    }
    let full = (income_tax * SURCHARGE_RATE / Decimal::ONE_HUNDRED).round_down(2);
    let phase_in = ((income_tax - exemption) * phase_in_rate / Decimal::ONE_HUNDRED).round_down(2);
    full.min(phase_in)
}

/// Returns 5.5 % of an amount in cents, truncated to whole cents.
pub(crate) fn flat_surcharge(cents: Decimal) -> Decimal {
    (cents * SURCHARGE_RATE / Decimal::ONE_HUNDRED).round_down(0)
}

impl Pipeline<'_> {
    /// Computes the period surcharge and church tax base (MSOLZ).
    pub(crate) fn solidarity_surcharge(&mut self) {
        self.s.solidarity_exemption *= self.s.tariff_multiplier;

        let annual = annual_surcharge(
            self.s.surcharge_base,
            self.s.solidarity_exemption,
            self.constants.solidarity().phase_in_rate,
        );
        self.s.period_surcharge = if annual.is_zero() {
            Decimal::ZERO
        } else {
            self.s
                .period_share((annual * Decimal::ONE_HUNDRED).round_down(0))
        };

        self.s.period_church_base = if self.profile.is_church_member() {
            self.s
                .period_share(self.s.surcharge_base * Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        };
    }

    /// Levies the surcharge on the special payment tax only if the annual
    /// tax including the payment, after child allowances, exceeds the
    /// exemption (MSOLZSTS).
    pub(crate) fn special_payment_surcharge(&mut self) {
        let taxable = if self.profile.child_allowances > Decimal::ZERO {
            self.s.taxable_income - self.s.child_allowance
        } else {
            self.s.taxable_income
        };
        let (_, tax) = tax_for_class(
            taxable,
            self.profile.tax_class,
            self.tariffs,
            self.s.tariff_multiplier,
        );
        let base = (tax * self.profile.effective_factor()).round_down(0);

        self.s.special_surcharge = if base > self.s.solidarity_exemption {
            flat_surcharge(self.s.special_tax)
        } else {
            Decimal::ZERO
        };
    }
}
