//! Pension relief, age relief and the net annual wage.
//!
//! Pension income (Versorgungsbezüge) earns a relief of a percentage of the
//! pension, capped, plus a supplement; employees older than 64 earn an age
//! relief on their other wage. Both are looked up in the relief tables by the
//! year the benefit started or the year after the 64th birthday.

use rust_decimal::Decimal;

use crate::models::PayPeriod;

use super::rounding::RoundExt;
use super::state::MultiYearStep;
use super::wage_tax::Pipeline;

const MONTHS: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

impl Pipeline<'_> {
    /// Computes the pension relief and its supplement, including the
    /// variants with the special pension payment (MRE4), then the age relief.
    pub(crate) fn pension_relief(&mut self) {
        if self.s.annual_pension.is_zero() {
            self.s.pension_supplement = Decimal::ZERO;
            self.s.pension_relief = Decimal::ZERO;
            self.s.special_pension_supplement = Decimal::ZERO;
            self.s.special_pension_relief = Decimal::ZERO;
        } else {
            let relief = self.constants.relief();
            let start = self.profile.pension_start_year.unwrap_or(self.profile.year);
            let row = relief.pension_row(relief.row_for(start));
            let pension = &self.inputs.pension;
            let monthly = Decimal::from(pension.monthly_base);
            let special = Decimal::from(pension.special);

            let (base, max_relief) = if self.s.period == PayPeriod::Year {
                self.s.pension_supplement =
                    (row.supplement / MONTHS * self.s.pension_months).round_up(0);
                (
                    monthly * self.s.pension_months + special,
                    (row.cap / MONTHS * self.s.pension_months).round_up(0),
                )
            } else {
                self.s.pension_supplement = row.supplement;
                ((monthly * MONTHS + special).round_down(2), row.cap)
            };

            self.s.pension_relief = (base * row.percentage / Decimal::ONE_HUNDRED)
                .round_up(2)
                .min(max_relief)
                .min(self.s.annual_pension);

            self.s.special_pension_relief = (self.s.pension_relief
                + self.s.special_pension_base * row.percentage / Decimal::ONE_HUNDRED)
                .round_up(2)
                .min(row.cap);

            let special_headroom = ((base + self.s.special_pension_base) / Decimal::ONE_HUNDRED
                - self.s.special_pension_relief)
                .round_down(2);
            self.s.special_pension_supplement = (self.s.pension_supplement
                + self.s.special_pension_base / Decimal::ONE_HUNDRED)
                .round_up(0);
            if self.s.special_pension_supplement > special_headroom {
                self.s.special_pension_supplement = special_headroom.round_up(0);
            }
            self.s.special_pension_supplement =
                self.s.special_pension_supplement.min(row.supplement);

            let headroom =
                (base / Decimal::ONE_HUNDRED - self.s.pension_relief).round_down(2);
            if self.s.pension_supplement > headroom {
                self.s.pension_supplement = headroom.round_up(0);
            }
        }
        self.age_relief();
    }

    /// Computes the age relief on the wage without pension income (MRE4ALTE).
    fn age_relief(&mut self) {
        if !self.profile.is_age_relief_eligible() {
            self.s.age_relief = Decimal::ZERO;
            return;
        }
        let relief = self.constants.relief();
        let row = relief.age_row(relief.row_for(self.profile.birth_year + 65));
        let base = self.s.annual_wage - self.s.annual_pension;
        self.s.age_relief = (base * row.percentage).round_up(0).min(row.cap);
    }

    /// Derives the net annual wage and the provision base (MRE4ABZ).
    pub(crate) fn net_annual_base(&mut self) {
        self.s.net_wage = (self.s.annual_wage
            - self.s.pension_relief
            - self.s.age_relief
            - self.s.annual_allowance
            + self.s.annual_add_back)
            .round_down(2)
            .max(Decimal::ZERO);

        self.s.provision_base = self.s.annual_wage;
        if self.s.multi_year_step == MultiYearStep::Ordinary {
            let compensation = Decimal::from(self.inputs.special.multi_year_compensation);
            self.s.provision_base =
                (self.s.provision_base - compensation / Decimal::ONE_HUNDRED).round_down(2);
        }

        self.s.net_pension = (self.s.annual_pension - self.s.pension_relief)
            .round_down(2)
            .max(Decimal::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::models::{PayPeriodInputs, TaxClass, TaxpayerProfile};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn pensioner(birth_year: u16, start_year: u16) -> TaxpayerProfile {
        let mut profile = TaxpayerProfile::new(2025, TaxClass::I, birth_year);
        profile.pension_start_year = Some(start_year);
        profile.pension_months = 12;
        profile
    }

    fn monthly_pension() -> PayPeriodInputs {
        let mut inputs = PayPeriodInputs::new(PayPeriod::Month, 300_000);
        inputs.pension.period_amount = 150_000;
        inputs.pension.monthly_base = 150_000;
        inputs
    }

    #[test]
    fn test_recent_pension_relief_and_age_relief() {
        let loader = ConfigLoader::builtin().unwrap();
        let constants = loader.year(2025).unwrap();
        let profile = pensioner(1955, 2020);
        let inputs = monthly_pension();
        let mut pipeline = Pipeline::new(constants, constants.income_tax(), &profile, &inputs);
        pipeline.s.annual_wage = dec("36000");
        pipeline.s.annual_pension = dec("18000");
        pipeline.s.pension_months = dec("12");

        pipeline.pension_relief();
        pipeline.net_annual_base();

        assert_eq!(pipeline.s.pension_relief, dec("1200"));
        assert_eq!(pipeline.s.pension_supplement, dec("360"));
        assert_eq!(pipeline.s.age_relief, dec("760"));
        assert_eq!(pipeline.s.net_wage, dec("34040"));
        assert_eq!(pipeline.s.net_pension, dec("16800"));
        assert_eq!(pipeline.s.provision_base, dec("36000"));
    }

    #[test]
    fn test_early_pension_hits_caps() {
        let loader = ConfigLoader::builtin().unwrap();
        let constants = loader.year(2025).unwrap();
        let profile = pensioner(1940, 2005);
        let inputs = monthly_pension();
        let mut pipeline = Pipeline::new(constants, constants.income_tax(), &profile, &inputs);
        pipeline.s.annual_wage = dec("36000");
        pipeline.s.annual_pension = dec("18000");
        pipeline.s.pension_months = dec("12");

        pipeline.pension_relief();
        pipeline.net_annual_base();

        assert_eq!(pipeline.s.pension_relief, dec("3000"));
        assert_eq!(pipeline.s.pension_supplement, dec("900"));
        assert_eq!(pipeline.s.age_relief, dec("1900"));
        assert_eq!(pipeline.s.net_wage, dec("31100"));
        assert_eq!(pipeline.s.net_pension, dec("15000"));
    }

    #[test]
    fn test_no_pension_no_relief() {
        let loader = ConfigLoader::builtin().unwrap();
        let constants = loader.year(2025).unwrap();
        let profile = TaxpayerProfile::new(2025, TaxClass::I, 1985);
        let inputs = PayPeriodInputs::new(PayPeriod::Month, 500_000);
        let mut pipeline = Pipeline::new(constants, constants.income_tax(), &profile, &inputs);
        pipeline.s.annual_wage = dec("60000");
        pipeline.s.annual_allowance = dec("1200");

        pipeline.pension_relief();
        pipeline.net_annual_base();

        assert_eq!(pipeline.s.pension_relief, Decimal::ZERO);
        assert_eq!(pipeline.s.age_relief, Decimal::ZERO);
        assert_eq!(pipeline.s.net_wage, dec("58800"));
    }

    #[test]
    fn test_net_wage_is_floored_at_zero() {
        let loader = ConfigLoader::builtin().unwrap();
        let constants = loader.year(2025).unwrap();
        let profile = TaxpayerProfile::new(2025, TaxClass::I, 1985);
        let inputs = PayPeriodInputs::new(PayPeriod::Month, 10_000);
        let mut pipeline = Pipeline::new(constants, constants.income_tax(), &profile, &inputs);
        pipeline.s.annual_wage = dec("1200");
        pipeline.s.annual_allowance = dec("5000");

        pipeline.net_annual_base();
        assert_eq!(pipeline.s.net_wage, Decimal::ZERO);
    }
}
