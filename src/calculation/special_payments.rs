//! Other payments (sonstige Bezüge) and multi-year compensation.
//!
//! Both are taxed as the difference between the annual tax with and without
//! the payment, computed on the expected annual wage the employer reports.
//! Multi-year compensation additionally gets the one-fifth rule, and the
//! result is the lower of the averaged and the ordinary difference.

use rust_decimal::Decimal;

use crate::models::{AuditWarning, PayPeriod};

use super::rounding::RoundExt;
use super::state::MultiYearStep;
use super::surcharge::{SURCHARGE_RATE, flat_surcharge};
use super::wage_tax::Pipeline;

fn euros(cents: u64) -> Decimal {
    Decimal::from(cents) / Decimal::ONE_HUNDRED
}

impl Pipeline<'_> {
    /// Returns the share benefit in cents, or zero in years without it.
    fn share_benefit(&self) -> Decimal {
        if self.constants.features().share_benefits {
            Decimal::from(self.inputs.special.share_benefit)
        } else {
            Decimal::ZERO
        }
    }

    /// Computes the tax on other payments (MSONST).
    pub(crate) fn other_payments(&mut self) {
        let (profile, inputs) = (self.profile, self.inputs);
        self.s.period = PayPeriod::Year;
        if self.s.pension_months.is_zero() {
            self.s.pension_months = Decimal::from(12);
        }

        let special = &inputs.special;
        let share_benefit = self.share_benefit();
        if special.other == 0 && share_benefit.is_zero() {
            self.s.private_insurance_special = Decimal::ZERO;
            self.s.tax_with_special = Decimal::ZERO;
            self.s.special_tax = Decimal::ZERO;
            self.s.special_surcharge = Decimal::ZERO;
            self.s.special_church_base = Decimal::ZERO;
            return;
        }

        self.tax_without_other_payments();
        self.private_insurance_deduction();
        let without = self.s.private_insurance;

        let carry = &profile.carry_forward;
        self.s.annual_wage =
            (Decimal::from(carry.annual_wage + special.other) / Decimal::ONE_HUNDRED).round_down(2);
        self.s.annual_pension = (Decimal::from(carry.annual_pension + special.other_pension)
            / Decimal::ONE_HUNDRED)
            .round_down(2);
        self.s.special_pension_base = Decimal::from(special.death_benefit);

        self.base_with_other_payments();
        self.annual_income_tax();
        self.s.treaty_special_excess_with = ((self.s.taxable_income
            - self.tariffs.tariff.basic_allowance)
            * Decimal::ONE_HUNDRED)
            .round_down(2)
            .max(Decimal::ZERO);

        self.private_insurance_deduction();
        self.s.private_insurance_special = self.s.private_insurance - without;

        self.s.tax_with_special = self.s.tax * Decimal::ONE_HUNDRED;
        self.s.special_tax = ((self.s.tax_with_special - self.s.tax_without_special)
            * profile.effective_factor())
            .round_down(0);
        self.settle_special_tax(share_benefit);
    }

    /// Settles a negative special payment tax against the period figures (STSMIN).
    ///
    /// A negative difference can only arise from a share benefit; it then
    /// reduces the period tax, surcharge and church base, each floored at zero.
    fn settle_special_tax(&mut self, share_benefit: Decimal) {
        if self.s.special_tax < Decimal::ZERO {
            if !share_benefit.is_zero() {
                let negative = self.s.special_tax;
                self.s.period_tax = (self.s.period_tax + negative).max(Decimal::ZERO);
                self.s.period_surcharge = (self.s.period_surcharge
                    + negative * SURCHARGE_RATE / Decimal::ONE_HUNDRED)
                    .round_down(0)
                    .max(Decimal::ZERO);
                self.s.period_church_base =
                    (self.s.period_church_base + negative).max(Decimal::ZERO);
                self.warnings.push(AuditWarning {
                    code: "NEGATIVE_SPECIAL_TAX".to_string(),
                    message: format!(
                        "Share benefit lowered the annual tax; {} cents were offset against the period tax",
                        negative.abs()
                    ),
                    severity: "low".to_string(),
                });
            }
            self.s.special_tax = Decimal::ZERO;
            self.s.special_surcharge = Decimal::ZERO;
        } else if self.constants.features().special_payment_exemption_test {
            self.special_payment_surcharge();
        } else {
            self.s.special_surcharge = flat_surcharge(self.s.special_tax);
        }

        self.s.special_church_base = if self.profile.is_church_member() {
            self.s.special_tax
        } else {
            Decimal::ZERO
        };
    }

    /// Computes the annual tax on the expected annual wage alone (MOSONST).
    fn tax_without_other_payments(&mut self) {
        let profile = self.profile;
        let carry = &profile.carry_forward;
        self.s.annual_wage = euros(carry.annual_wage).round_down(2);
        self.s.annual_pension = euros(carry.annual_pension).round_down(2);
        self.s.annual_allowance = euros(carry.annual_allowance).round_down(2);
        self.s.annual_add_back = euros(carry.annual_add_back).round_down(2);

        self.pension_relief();
        self.net_annual_base();
        self.s.provision_base =
            (self.s.provision_base - euros(carry.annual_compensation)).round_down(2);
        self.table_allowances();
        self.s.treaty_special_relief_without = ((self.s.lump_sums
            + self.s.pension_relief
            + self.s.pension_supplement)
            * Decimal::ONE_HUNDRED)
            .round_down(2);

        self.annual_income_tax();
        self.s.treaty_special_excess_without = ((self.s.taxable_income
            - self.tariffs.tariff.basic_allowance)
            * Decimal::ONE_HUNDRED)
            .round_down(2)
            .max(Decimal::ZERO);
        self.s.tax_without_special = self.s.tax * Decimal::ONE_HUNDRED;
    }

    /// Prepares the annual base including the other payments (MRE4SONST).
    fn base_with_other_payments(&mut self) {
        let share_benefit = self.share_benefit();
        self.pension_relief();
        self.s.pension_relief = self.s.special_pension_relief;
        self.net_annual_base();

        let (profile, inputs) = (self.profile, self.inputs);
        let carry = &profile.carry_forward;
        let special = &inputs.special;
        self.s.provision_base = (self.s.provision_base + share_benefit / Decimal::ONE_HUNDRED
            - euros(carry.annual_compensation)
            - euros(special.other_compensation))
        .round_down(2);
        self.s.pension_supplement = self.s.special_pension_supplement;
        self.table_allowances();
        self.s.treaty_special_relief_increment = ((self.s.lump_sums
            + self.s.pension_relief
            + self.s.pension_supplement)
            * Decimal::ONE_HUNDRED
            - self.s.treaty_special_relief_without)
            .round_down(2);
    }

    /// Computes the tax on multi-year compensation (MVMT).
    pub(crate) fn multi_year_compensation(&mut self) {
        let (profile, inputs) = (self.profile, self.inputs);
        let special = &inputs.special;
        let compensation = Decimal::from(special.multi_year) + self.s.multi_year_pension;
        if compensation <= Decimal::ZERO {
            self.s.multi_year_tax = Decimal::ZERO;
            self.s.multi_year_surcharge = Decimal::ZERO;
            self.s.multi_year_church_base = Decimal::ZERO;
            return;
        }

        let reference = if self.s.tax_with_special.is_zero() {
            self.tax_without_other_payments();
            self.s.tax_without_special
        } else {
            self.s.tax_with_special
        };

        let carry = &profile.carry_forward;
        self.s.special_pension_base = Decimal::from(special.death_benefit) + self.s.multi_year_pension;
        self.s.annual_wage = ((Decimal::from(carry.annual_wage + special.other + special.multi_year)
            + self.s.multi_year_pension)
            / Decimal::ONE_HUNDRED)
            .round_down(2);
        self.s.annual_pension = ((Decimal::from(carry.annual_pension + special.other_pension)
            + self.s.multi_year_pension)
            / Decimal::ONE_HUNDRED)
            .round_down(2);

        self.s.multi_year_step = MultiYearStep::Ordinary;
        self.base_with_other_payments();
        self.annual_income_tax();
        let ordinary = self.s.tax * Decimal::ONE_HUNDRED;

        self.net_annual_base();
        self.s.provision_base = (self.s.provision_base
            - euros(carry.annual_compensation)
            - euros(special.other_compensation))
        .round_down(2);
        self.s.multi_year_step = MultiYearStep::FifthRule;
        self.annual_income_tax();
        let averaged = self.s.tax * Decimal::ONE_HUNDRED;

        let increase = (averaged - reference).min(ordinary - reference);
        self.s.multi_year_tax = if increase < Decimal::ZERO {
            Decimal::ZERO
        } else {
            (increase * profile.effective_factor()).round_down(0)
        };

        self.s.multi_year_surcharge = if self.constants.features().special_payment_exemption_test {
            let base = (self.s.multi_year_tax / Decimal::ONE_HUNDRED + self.s.surcharge_base)
                .round_down(0);
            if base > self.s.solidarity_exemption {
                flat_surcharge(self.s.multi_year_tax)
            } else {
                Decimal::ZERO
            }
        } else {
            flat_surcharge(self.s.multi_year_tax)
        };

        self.s.multi_year_church_base = if profile.is_church_member() {
            self.s.multi_year_tax
        } else {
            Decimal::ZERO
        };
    }
}
