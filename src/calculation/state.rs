//! Scratch state threaded through one pass of the withholding pipeline.
//!
//! Field names describe what a value holds; the flowchart variable each one
//! mirrors is given in its doc comment. Euro amounts carry up to two decimal
//! places, fields documented as cents are integer cents.

use rust_decimal::Decimal;

use crate::models::PayPeriod;

use super::rounding::RoundExt;

/// Which multi-year variant the annual tax computation runs (KENNVMT).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum MultiYearStep {
    /// Regular computation (0).
    #[default]
    Off,
    /// Multi-year compensation taxed with the one-fifth rule (1).
    FifthRule,
    /// Multi-year compensation treated as an ordinary payment (2).
    Ordinary,
}

/// The mutable record of one pipeline pass.
///
/// Created fresh for every pass and dropped once the result has been read.
#[derive(Debug, Clone)]
pub(crate) struct ComputationState {
    /// Pay period used by the conversions (LZZ). Switched to a year for special payments.
    pub period: PayPeriod,
    /// Months with pension payments (ZMVB).
    pub pension_months: Decimal,
    /// Multi-year variant of the annual tax computation (KENNVMT).
    pub multi_year_step: MultiYearStep,
    /// Capitalised multi-year pension in cents (VKAPA).
    pub multi_year_pension: Decimal,

    /// Pension insurance ceiling (BBGRV).
    pub pension_ceiling: Decimal,
    /// Employee pension rate as a fraction (RVSATZAN).
    pub pension_rate: Decimal,
    /// Health and care insurance ceiling (BBGKVPV).
    pub health_ceiling: Decimal,
    /// Employee health rate as a fraction (KVSATZAN).
    pub health_rate_employee: Decimal,
    /// Employer health rate as a fraction (KVSATZAG).
    pub health_rate_employer: Decimal,
    /// Employee care rate as a fraction (PVSATZAN).
    pub care_rate_employee: Decimal,
    /// Employer care rate as a fraction (PVSATZAG).
    pub care_rate_employer: Decimal,
    /// Monthly private health and care premiums in cents (PKPV).
    pub private_premiums: Decimal,
    /// Solidarity surcharge exemption, multiplied by the tariff multiplier once applied (SOLZFREI).
    pub solidarity_exemption: Decimal,

    /// Annual wage (ZRE4J).
    pub annual_wage: Decimal,
    /// Annual pension income (ZVBEZJ).
    pub annual_pension: Decimal,
    /// Annual allowance (JLFREIB).
    pub annual_allowance: Decimal,
    /// Annual add-back (JLHINZU).
    pub annual_add_back: Decimal,

    /// Pension relief (FVB).
    pub pension_relief: Decimal,
    /// Supplement to the pension relief (FVBZ).
    pub pension_supplement: Decimal,
    /// Pension relief including the special pension payment (FVBSO).
    pub special_pension_relief: Decimal,
    /// Supplement including the special pension payment (FVBZSO).
    pub special_pension_supplement: Decimal,
    /// Special pension payment in cents feeding the special relief (VBEZBSO).
    pub special_pension_base: Decimal,
    /// Age relief (ALTE).
    pub age_relief: Decimal,

    /// Annual wage after reliefs (ZRE4).
    pub net_wage: Decimal,
    /// Annual wage the provision lump sum is computed on (ZRE4VP).
    pub provision_base: Decimal,
    /// Pension income after the pension relief (ZVBEZ).
    pub net_pension: Decimal,

    /// Employee and pension lump sums (ANP).
    pub lump_sums: Decimal,
    /// Single parent relief (EFA).
    pub single_parent_relief: Decimal,
    /// Special expense lump sum (SAP).
    pub special_expense_lump_sum: Decimal,
    /// Child allowances (KFB).
    pub child_allowance: Decimal,
    /// All allowances built into the table (ZTABFB).
    pub table_allowances: Decimal,
    /// 2 for the splitting formula, otherwise 1 (KZTAB).
    pub tariff_multiplier: Decimal,

    /// Pension part of the provision lump sum (VSP1).
    pub provision_pension: Decimal,
    /// Minimum provision lump sum (VSP2).
    pub provision_minimum: Decimal,
    /// Health and care part of the provision lump sum (VSP3).
    pub provision_health: Decimal,
    /// Provision lump sum (VSP).
    pub provision: Decimal,

    /// Taxable income (ZVE).
    pub taxable_income: Decimal,
    /// Income the tariff is evaluated on (X).
    pub tariff_base: Decimal,
    /// Annual tariff tax (ST).
    pub tax: Decimal,

    /// Annual income tax (LSTJAHR).
    pub annual_tax: Decimal,
    /// Surcharge and church tax base after child allowances (JBMG).
    pub surcharge_base: Decimal,
    /// Income tax for the period in cents (LSTLZZ).
    pub period_tax: Decimal,
    /// Solidarity surcharge for the period in cents (SOLZLZZ).
    pub period_surcharge: Decimal,
    /// Church tax base for the period in cents (BK).
    pub period_church_base: Decimal,

    /// Annual private insurance deduction in cents (VKV).
    pub private_insurance: Decimal,
    /// Private insurance deduction for the period in cents (VKVLZZ).
    pub private_insurance_period: Decimal,
    /// Private insurance deduction of the special payment in cents (VKVSONST).
    pub private_insurance_special: Decimal,

    /// Annual tax without the special payment in cents (LSTOSO).
    pub tax_without_special: Decimal,
    /// Annual tax with the special payment in cents (LSTSO).
    pub tax_with_special: Decimal,
    /// Tax on the special payment in cents (STS).
    pub special_tax: Decimal,
    /// Surcharge on the special payment in cents (SOLZS).
    pub special_surcharge: Decimal,
    /// Church tax base of the special payment in cents (BKS).
    pub special_church_base: Decimal,

    /// Tax on multi-year compensation in cents (STV).
    pub multi_year_tax: Decimal,
    /// Surcharge on multi-year compensation in cents (SOLZV).
    pub multi_year_surcharge: Decimal,
    /// Church tax base of multi-year compensation in cents (BKV).
    pub multi_year_church_base: Decimal,

    /// Treaty relief of the regular wage in cents (VFRB).
    pub treaty_relief: Decimal,
    /// Treaty excess of the regular wage in cents (WVFRB).
    pub treaty_excess: Decimal,
    /// Treaty relief without the special payment in cents (VFRBS1).
    pub treaty_special_relief_without: Decimal,
    /// Treaty relief increment of the special payment in cents (VFRBS2).
    pub treaty_special_relief_increment: Decimal,
    /// Treaty excess without the special payment in cents (WVFRBO).
    pub treaty_special_excess_without: Decimal,
    /// Treaty excess with the special payment in cents (WVFRBM).
    pub treaty_special_excess_with: Decimal,
}

impl ComputationState {
    /// Creates an all-zero state for a pay period.
    pub fn new(period: PayPeriod) -> Self {
        let zero = Decimal::ZERO;
        Self {
            period,
            pension_months: zero,
            multi_year_step: MultiYearStep::Off,
            multi_year_pension: zero,
            pension_ceiling: zero,
            pension_rate: zero,
            health_ceiling: zero,
            health_rate_employee: zero,
            health_rate_employer: zero,
            care_rate_employee: zero,
            care_rate_employer: zero,
            private_premiums: zero,
            solidarity_exemption: zero,
            annual_wage: zero,
            annual_pension: zero,
            annual_allowance: zero,
            annual_add_back: zero,
            pension_relief: zero,
            pension_supplement: zero,
            special_pension_relief: zero,
            special_pension_supplement: zero,
            special_pension_base: zero,
            age_relief: zero,
            net_wage: zero,
            provision_base: zero,
            net_pension: zero,
            lump_sums: zero,
            single_parent_relief: zero,
            special_expense_lump_sum: zero,
            child_allowance: zero,
            table_allowances: zero,
            tariff_multiplier: Decimal::ONE,
            provision_pension: zero,
            provision_minimum: zero,
            provision_health: zero,
            provision: zero,
            taxable_income: zero,
            tariff_base: zero,
            tax: zero,
            annual_tax: zero,
            surcharge_base: zero,
            period_tax: zero,
            period_surcharge: zero,
            period_church_base: zero,
            private_insurance: zero,
            private_insurance_period: zero,
            private_insurance_special: zero,
            tax_without_special: zero,
            tax_with_special: zero,
            special_tax: zero,
            special_surcharge: zero,
            special_church_base: zero,
            multi_year_tax: zero,
            multi_year_surcharge: zero,
            multi_year_church_base: zero,
            treaty_relief: zero,
            treaty_excess: zero,
            treaty_special_relief_without: zero,
            treaty_special_relief_increment: zero,
            treaty_special_excess_without: zero,
            treaty_special_excess_with: zero,
        }
    }

    /// Converts a period amount in cents to annual euros (MRE4JL).
    ///
    /// Weekly amounts are scaled by 360 and divided by 700 in one step so that
    /// truncation happens once.
    pub fn annualise(&self, cents: Decimal) -> Decimal {
        let hundred = Decimal::ONE_HUNDRED;
        let annual = match self.period {
            PayPeriod::Year => cents / hundred,
            PayPeriod::Month => cents * Decimal::from(12) / hundred,
            PayPeriod::Week => cents * Decimal::from(360) / Decimal::from(700),
            PayPeriod::Day => cents * Decimal::from(360) / hundred,
        };
        annual.round_down(2)
    }

    /// Converts an annual amount back to the pay period, truncated to whole units (UPANTEIL).
    pub fn period_share(&self, annual: Decimal) -> Decimal {
        let share = match self.period {
            PayPeriod::Year => return annual,
            PayPeriod::Month => annual / Decimal::from(12),
            PayPeriod::Week => annual * Decimal::from(7) / Decimal::from(360),
            PayPeriod::Day => annual / Decimal::from(360),
        };
        share.round_down(0)
    }
}
