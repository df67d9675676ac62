//! Income tax tariff and annual tax computation.
//!
//! The tariff itself is a pure function of the taxable income and the
//! year's [`Tariff`]: zero up to the basic allowance, two quadratic
//! progressive zones, then linear 42 % and 45 % zones. Classes V and VI use
//! the separate formula in [`class_v_tax`].

use rust_decimal::Decimal;

use crate::config::{Tariff, TariffSet};
use crate::models::TaxClass;

use super::rounding::RoundExt;
use super::state::MultiYearStep;
use super::wage_tax::Pipeline;

const TEN_THOUSAND: Decimal = Decimal::from_parts(10000, 0, 0, false, 0);
const ZONE2_LINEAR: Decimal = Decimal::from_parts(1400, 0, 0, false, 0);
const ZONE3_LINEAR: Decimal = Decimal::from_parts(2397, 0, 0, false, 0);
const RATE_42: Decimal = Decimal::from_parts(42, 0, 0, false, 2);
const RATE_45: Decimal = Decimal::from_parts(45, 0, 0, false, 2);
const RATE_14: Decimal = Decimal::from_parts(14, 0, 0, false, 2);
const FACTOR_HIGH: Decimal = Decimal::from_parts(125, 0, 0, false, 2);
const FACTOR_LOW: Decimal = Decimal::from_parts(75, 0, 0, false, 2);
const FIFTH: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Evaluates the income tax tariff (UPTAB).
///
/// `income` is the per-person income (already halved for the splitting
/// formula) and `multiplier` is 2 for the splitting formula, otherwise 1.
///
/// # Example
///
/// ```
/// use lohnsteuer_engine::calculation::tariff_tax;
/// use lohnsteuer_engine::config::ConfigLoader;
/// use rust_decimal::Decimal;
///
/// let loader = ConfigLoader::builtin().unwrap();
/// let tariff = &loader.year(2025).unwrap().income_tax().tariff;
///
/// assert_eq!(tariff_tax(Decimal::from(12096), tariff, Decimal::ONE), Decimal::ZERO);
/// assert_eq!(tariff_tax(Decimal::from(100000), tariff, Decimal::ONE), Decimal::from(31088));
/// ```
pub fn tariff_tax(income: Decimal, tariff: &Tariff, multiplier: Decimal) -> Decimal {
    let tax = if income < tariff.basic_allowance + Decimal::ONE {
        Decimal::ZERO
    } else if income < tariff.zone2_end + Decimal::ONE {
        let y = ((income - tariff.basic_allowance) / TEN_THOUSAND).round_down(6);
        let rate = y * tariff.zone2_coefficient + ZONE2_LINEAR;
        (rate * y).round_down(0)
    } else if income < tariff.zone3_end + Decimal::ONE {
        let z = ((income - tariff.zone2_end) / TEN_THOUSAND).round_down(6);
        let rate = z * tariff.zone3_coefficient + ZONE3_LINEAR;
        (rate * z + tariff.zone3_constant).round_down(0)
    } else if income < tariff.zone4_end + Decimal::ONE {
        (income * RATE_42 - tariff.zone4_offset).round_down(0)
    } else {
        (income * RATE_45 - tariff.zone5_offset).round_down(0)
    };
    tax * multiplier
}

/// Evaluates the class V/VI formula on a taxable income (MST5_6).
///
/// Up to the second threshold the tax is twice the difference between the
/// tariff at 125 % and at 75 % of the income, but at least 14 %; beyond it
/// every euro is taxed at 42 % and, beyond the third threshold, 45 %.
pub fn class_v_tax(income: Decimal, tariffs: &TariffSet) -> Decimal {
    let thresholds = &tariffs.class_v_thresholds;
    let tariff = &tariffs.tariff;

    if income > thresholds.middle {
        let base = class_v_formula(thresholds.middle, tariff);
        if income > thresholds.upper {
            let tax = (base + (thresholds.upper - thresholds.middle) * RATE_42).round_down(0);
            (tax + (income - thresholds.upper) * RATE_45).round_down(0)
        } else {
            (base + (income - thresholds.middle) * RATE_42).round_down(0)
        }
    } else {
        let tax = class_v_formula(income, tariff);
        if income > thresholds.lower {
            let capped = (class_v_formula(thresholds.lower, tariff)
                + (income - thresholds.lower) * RATE_42)
                .round_down(0);
            capped.min(tax)
        } else {
            tax
        }
    }
}

/// The doubled 125 %/75 % difference with the 14 % floor (UP5_6).
fn class_v_formula(income: Decimal, tariff: &Tariff) -> Decimal {
    let high = tariff_tax((income * FACTOR_HIGH).round_down(2), tariff, Decimal::ONE);
    let low = tariff_tax((income * FACTOR_LOW).round_down(2), tariff, Decimal::ONE);
    let difference = (high - low) * Decimal::TWO;
    let minimum = (income * RATE_14).round_down(0);
    if minimum > difference { minimum } else { difference }
}

/// Returns the tariff base and tax for a taxable income under a tax class.
pub(crate) fn tax_for_class(
    taxable_income: Decimal,
    tax_class: TaxClass,
    tariffs: &TariffSet,
    multiplier: Decimal,
) -> (Decimal, Decimal) {
    let base = if taxable_income < Decimal::ONE {
        Decimal::ZERO
    } else {
        (taxable_income / multiplier).round_down(0)
    };
    let tax = if tax_class.uses_class_v_formula() {
        class_v_tax(base, tariffs)
    } else {
        tariff_tax(base, &tariffs.tariff, multiplier)
    };
    (base, tax)
}

impl Pipeline<'_> {
    /// Computes the annual tariff tax on the current state (MLSTJAHR).
    ///
    /// With the one-fifth rule active the multi-year compensation is taxed
    /// as five times the tax increase caused by a fifth of it.
    pub(crate) fn annual_income_tax(&mut self) {
        self.provision_lump_sum();

        let base = self.s.net_wage - self.s.table_allowances - self.s.provision;
        if self.s.multi_year_step != MultiYearStep::FifthRule {
            self.s.taxable_income = base;
            self.evaluate_tariff();
            return;
        }

        let compensation =
            Decimal::from(self.inputs.special.multi_year) + self.s.multi_year_pension;
        let extra = Decimal::from(self.inputs.special.multi_year) / Decimal::ONE_HUNDRED
            + self.s.multi_year_pension / Decimal::ONE_HUNDRED;
        self.s.taxable_income = (base - extra).round_down(2);

        if self.s.taxable_income < Decimal::ZERO {
            self.s.taxable_income = ((self.s.taxable_income + extra) / FIFTH).round_down(2);
            self.evaluate_tariff();
            self.s.tax = (self.s.tax * FIFTH).round_down(0);
        } else {
            self.evaluate_tariff();
            let without = self.s.tax;
            self.s.taxable_income =
                (self.s.taxable_income + compensation / Decimal::from(500)).round_down(2);
            self.evaluate_tariff();
            self.s.tax = ((self.s.tax - without) * FIFTH + without).round_down(0);
        }
    }

    /// Applies the tariff for the tax class to the taxable income (UPMLST).
    fn evaluate_tariff(&mut self) {
        if self.s.taxable_income < Decimal::ONE {
            self.s.taxable_income = Decimal::ZERO;
        }
        let (base, tax) = tax_for_class(
            self.s.taxable_income,
            self.profile.tax_class,
            self.tariffs,
            self.s.tariff_multiplier,
        );
        self.s.tariff_base = base;
        self.s.tax = tax;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tariffs(year: u16) -> TariffSet {
        ConfigLoader::builtin()
            .unwrap()
            .year(year)
            .unwrap()
            .income_tax()
            .clone()
    }

    #[test]
    fn test_zero_below_basic_allowance() {
        let set = tariffs(2025);
        assert_eq!(tariff_tax(dec("12096"), &set.tariff, Decimal::ONE), Decimal::ZERO);
        assert_eq!(tariff_tax(dec("12096.99"), &set.tariff, Decimal::ONE), Decimal::ZERO);
        assert_eq!(tariff_tax(Decimal::ZERO, &set.tariff, Decimal::ONE), Decimal::ZERO);
    }

    #[test]
    fn test_first_progressive_zone() {
        let set = tariffs(2025);
        // y = 0.2904, (0.2904 * 932.30 + 1400) * 0.2904 = 485.18...
        assert_eq!(tariff_tax(dec("15000"), &set.tariff, Decimal::ONE), dec("485"));
    }

    #[test]
    fn test_second_progressive_zone() {
        let set = tariffs(2025);
        // z = 3.2557, (3.2557 * 176.64 + 2397) * 3.2557 + 1015.13 = 10691.7...
        assert_eq!(tariff_tax(dec("50000"), &set.tariff, Decimal::ONE), dec("10691"));
    }

    #[test]
    fn test_linear_zones() {
        let set = tariffs(2025);
        assert_eq!(tariff_tax(dec("100000"), &set.tariff, Decimal::ONE), dec("31088"));
        assert_eq!(tariff_tax(dec("300000"), &set.tariff, Decimal::ONE), dec("115753"));
    }

    #[test]
    fn test_splitting_multiplier_doubles() {
        let set = tariffs(2025);
        let single = tariff_tax(dec("25000"), &set.tariff, Decimal::ONE);
        assert_eq!(tariff_tax(dec("25000"), &set.tariff, Decimal::TWO), single * Decimal::TWO);
    }

    #[test]
    fn test_class_v_minimum_fourteen_percent() {
        let set = tariffs(2025);
        // Far below the basic allowance both tariff evaluations are zero.
        assert_eq!(class_v_tax(dec("5000"), &set), dec("700"));
    }

    #[test]
    fn test_class_v_above_upper_threshold_is_linear() {
        let set = tariffs(2025);
        let at_upper = class_v_tax(dec("222260"), &set);
        let above = class_v_tax(dec("232260"), &set);
        assert_eq!(above - at_upper, dec("4500"));
    }

    #[test]
    fn test_class_v_is_monotonic() {
        let set = tariffs(2024);
        let mut previous = Decimal::ZERO;
        for income in (0..250_000).step_by(997) {
            let tax = class_v_tax(Decimal::from(income), &set);
            assert!(tax >= previous, "tax fell at {income}");
            previous = tax;
        }
    }

    #[test]
    fn test_tax_for_class_halves_splitting_income() {
        let set = tariffs(2025);
        let (base, tax) = tax_for_class(dec("50001.50"), TaxClass::III, &set, Decimal::TWO);
        assert_eq!(base, dec("25000"));
        assert_eq!(tax, tariff_tax(dec("25000"), &set.tariff, Decimal::TWO));
    }

    #[test]
    fn test_tax_for_class_below_one_euro() {
        let set = tariffs(2025);
        let (base, tax) = tax_for_class(dec("0.99"), TaxClass::V, &set, Decimal::ONE);
        assert_eq!(base, Decimal::ZERO);
        assert_eq!(tax, Decimal::ZERO);
    }
}
