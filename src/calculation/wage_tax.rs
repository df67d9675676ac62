//! Wage withholding tax computation.
//!
//! This module provides [`compute_wage_tax`], which runs the withholding
//! flowchart for one employee and one pay period. One pass runs the stages
//! in a fixed order over a fresh [`ComputationState`]; the stages
//! themselves live in the sibling modules as methods on [`Pipeline`].
//!
//! For 2024 the year file carries a tariff amended retroactively in
//! December. Both passes are always computed. Every period uses the amended
//! pass, except a monthly December, which settles the eleven months already
//! withheld under the initial tariff.

use chrono::Month;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{TariffSet, YearConstants};
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, HealthInsurance, PayPeriod, PayPeriodInputs,
    PensionInsurance, TaxpayerProfile, TreatyFigures, WageTaxResult,
};

use super::insurance::care_rates;
use super::provision::PrivateCover;
use super::rounding::RoundExt;
use super::state::{ComputationState, MultiYearStep};

/// Months settled by the December true-up.
const SETTLED_MONTHS: Decimal = Decimal::from_parts(11, 0, 0, false, 0);

/// One pass of the withholding flowchart under one tariff.
pub(crate) struct Pipeline<'a> {
    /// Constants of the statutory year.
    pub(crate) constants: &'a YearConstants,
    /// The tariff this pass applies.
    pub(crate) tariffs: &'a TariffSet,
    /// The employee.
    pub(crate) profile: &'a TaxpayerProfile,
    /// The amounts paid in the period.
    pub(crate) inputs: &'a PayPeriodInputs,
    /// The scratch state.
    pub(crate) s: ComputationState,
    /// Audit steps recorded so far.
    pub(crate) steps: Vec<AuditStep>,
    /// Warnings raised so far.
    pub(crate) warnings: Vec<AuditWarning>,
}

/// The state and trace left behind by a finished pass.
struct Pass {
    state: ComputationState,
    trace: AuditTrace,
}

impl<'a> Pipeline<'a> {
    pub(crate) fn new(
        constants: &'a YearConstants,
        tariffs: &'a TariffSet,
        profile: &'a TaxpayerProfile,
        inputs: &'a PayPeriodInputs,
    ) -> Self {
        Self {
            constants,
            tariffs,
            profile,
            inputs,
            s: ComputationState::new(inputs.period),
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns how private insurance enters the provision lump sum.
    pub(crate) fn private_cover(&self) -> PrivateCover {
        match self.profile.health_insurance {
            HealthInsurance::Statutory => PrivateCover::None,
            HealthInsurance::Private {
                employer_subsidy: false,
                ..
            } => PrivateCover::Unsubsidised,
            HealthInsurance::Private {
                employer_subsidy: true,
                ..
            } => PrivateCover::Subsidised,
        }
    }

    /// Runs every stage of one pass.
    fn run(mut self) -> Pass {
        self.resolve_parameters();
        self.annualise_inputs();

        self.s.special_pension_base = Decimal::ZERO;
        self.s.multi_year_step = MultiYearStep::Off;
        self.pension_relief();
        self.net_annual_base();
        self.record(
            "pension_and_age_relief",
            "Pension and Age Relief",
            "MRE4",
            serde_json::json!({
                "annual_wage": self.s.annual_wage.normalize().to_string(),
                "annual_pension": self.s.annual_pension.normalize().to_string(),
                "pension_start_year": self.profile.pension_start_year,
                "birth_year": self.profile.birth_year,
            }),
            serde_json::json!({
                "pension_relief": self.s.pension_relief.normalize().to_string(),
                "pension_supplement": self.s.pension_supplement.normalize().to_string(),
                "age_relief": self.s.age_relief.normalize().to_string(),
                "net_wage": self.s.net_wage.normalize().to_string(),
            }),
            format!(
                "Net annual wage {} after pension relief {} and age relief {}",
                self.s.net_wage.normalize(),
                self.s.pension_relief.normalize(),
                self.s.age_relief.normalize()
            ),
        );

        self.regular_wage_tax();

        let (profile, inputs) = (self.profile, self.inputs);
        let special = &inputs.special;
        let has_other = special.other > 0 || special.share_benefit > 0;
        self.other_payments();
        if has_other {
            self.record(
                "other_payments",
                "Other Payments",
                "MSONST",
                serde_json::json!({
                    "other": special.other,
                    "share_benefit": special.share_benefit,
                    "expected_annual_wage": profile.carry_forward.annual_wage,
                }),
                serde_json::json!({
                    "tax_without": self.s.tax_without_special.normalize().to_string(),
                    "tax_with": self.s.tax_with_special.normalize().to_string(),
                    "special_income_tax": self.s.special_tax.normalize().to_string(),
                    "special_surcharge": self.s.special_surcharge.normalize().to_string(),
                }),
                format!(
                    "Other payments taxed at the annual difference: {} cents",
                    self.s.special_tax.normalize()
                ),
            );
        }

        if self.constants.features().multi_year_compensation {
            let has_multi_year = special.multi_year > 0 || special.multi_year_pension > 0;
            self.multi_year_compensation();
            if has_multi_year {
                self.record(
                    "multi_year_compensation",
                    "Multi-Year Compensation",
                    "MVMT",
                    serde_json::json!({
                        "multi_year": special.multi_year,
                        "multi_year_pension": special.multi_year_pension,
                    }),
                    serde_json::json!({
                        "multi_year_income_tax": self.s.multi_year_tax.normalize().to_string(),
                        "multi_year_surcharge": self.s.multi_year_surcharge.normalize().to_string(),
                    }),
                    format!(
                        "One-fifth rule compared with ordinary taxation: {} cents",
                        self.s.multi_year_tax.normalize()
                    ),
                );
            }
        }

        Pass {
            state: self.s,
            trace: AuditTrace {
                steps: self.steps,
                warnings: self.warnings,
            },
        }
    }

    /// Resolves ceilings and contribution rates for the year (MPARA).
    pub(crate) fn resolve_parameters(&mut self) {
        let profile = self.profile;
        let si = self.constants.social_insurance();

        self.s.pension_ceiling = match profile.pension_insurance {
            PensionInsurance::East => si.pension.ceiling_east,
            PensionInsurance::West | PensionInsurance::Exempt => si.pension.ceiling_west,
        };
        self.s.pension_rate = si.pension.rate / Decimal::TWO / Decimal::ONE_HUNDRED;

        self.s.health_ceiling = si.health.ceiling;
        self.s.health_rate_employee = (si.health.reduced_rate / Decimal::TWO
            + profile.health_additional_rate / Decimal::TWO)
            / Decimal::ONE_HUNDRED;
        self.s.health_rate_employer = (si.health.reduced_rate / Decimal::TWO
            + si.health.average_additional_rate / Decimal::TWO)
            / Decimal::ONE_HUNDRED;

        let (care_employee, care_employer) = care_rates(profile, &si.care);
        self.s.care_rate_employee = care_employee / Decimal::ONE_HUNDRED;
        self.s.care_rate_employer = care_employer / Decimal::ONE_HUNDRED;

        self.s.private_premiums = match profile.health_insurance {
            HealthInsurance::Statutory => Decimal::ZERO,
            HealthInsurance::Private {
                health_premium,
                care_premium,
                ..
            } => Decimal::from(health_premium) + Decimal::from(care_premium.unwrap_or(0)),
        };

        self.s.solidarity_exemption = self.constants.solidarity().exemption;
        self.s.pension_months = Decimal::from(profile.pension_months);
        self.s.multi_year_pension = Decimal::from(self.inputs.special.multi_year_pension);

        debug!(
            year = self.constants.year(),
            pension_ceiling = %self.s.pension_ceiling,
            care_rate_employee = %self.s.care_rate_employee,
            "Resolved contribution parameters"
        );
        self.record(
            "parameters",
            "Contribution Parameters",
            "MPARA",
            serde_json::json!({
                "pension_insurance": format!("{:?}", profile.pension_insurance),
                "health_additional_rate": profile.health_additional_rate.normalize().to_string(),
                "care_children": profile.care_children,
                "saxony": profile.saxony,
            }),
            serde_json::json!({
                "pension_ceiling": self.s.pension_ceiling.normalize().to_string(),
                "health_rate_employee": self.s.health_rate_employee.normalize().to_string(),
                "care_rate_employee": self.s.care_rate_employee.normalize().to_string(),
            }),
            format!(
                "Ceilings and rates resolved for {}",
                self.constants.year()
            ),
        );
    }

    /// Converts the period amounts to annual euros (MRE4JL).
    pub(crate) fn annualise_inputs(&mut self) {
        let profile = self.profile;
        let inputs = self.inputs;
        self.s.annual_wage = self.s.annualise(Decimal::from(inputs.gross));
        self.s.annual_pension = self.s.annualise(Decimal::from(inputs.pension.period_amount));
        self.s.annual_allowance = self.s.annualise(Decimal::from(profile.period_allowance));
        self.s.annual_add_back = self.s.annualise(Decimal::from(profile.period_add_back));

        debug!(
            period = ?inputs.period,
            annual_wage = %self.s.annual_wage,
            "Annualised period wage"
        );
        self.record(
            "annualisation",
            "Annualisation",
            "MRE4JL",
            serde_json::json!({
                "period": inputs.period,
                "gross": inputs.gross,
                "pension": inputs.pension.period_amount,
            }),
            serde_json::json!({
                "annual_wage": self.s.annual_wage.normalize().to_string(),
                "annual_pension": self.s.annual_pension.normalize().to_string(),
            }),
            format!(
                "{} cents per {:?} = {} per year",
                inputs.gross,
                inputs.period,
                self.s.annual_wage.normalize()
            ),
        );
    }

    /// Computes the period tax, surcharge and church base on the regular wage (MBERECH).
    fn regular_wage_tax(&mut self) {
        let factor = self.profile.effective_factor();

        self.table_allowances();
        self.s.treaty_relief = ((self.s.lump_sums + self.s.pension_relief
            + self.s.pension_supplement)
            * Decimal::ONE_HUNDRED)
            .round_down(0);
        self.annual_income_tax();
        self.s.treaty_excess = ((self.s.taxable_income - self.tariffs.tariff.basic_allowance)
            * Decimal::ONE_HUNDRED)
            .round_down(0)
            .max(Decimal::ZERO);

        self.s.annual_tax = (self.s.tax * factor).round_down(0);
        self.s.period_tax = self.s.period_share(self.s.annual_tax * Decimal::ONE_HUNDRED);
        self.private_insurance_deduction();
        self.s.private_insurance_period = self.s.period_share(self.s.private_insurance);

        if self.profile.child_allowances > Decimal::ZERO {
            self.s.table_allowances += self.s.child_allowance;
            self.net_annual_base();
            self.annual_income_tax();
            self.s.surcharge_base = (self.s.tax * factor).round_down(0);
        } else {
            self.s.surcharge_base = self.s.annual_tax;
        }
        self.solidarity_surcharge();

        debug!(
            taxable_income = %self.s.taxable_income,
            annual_tax = %self.s.annual_tax,
            period_tax = %self.s.period_tax,
            "Computed regular wage tax"
        );
        self.record(
            "regular_wage_tax",
            "Regular Wage Tax",
            "MBERECH",
            serde_json::json!({
                "tax_class": u8::from(self.profile.tax_class),
                "table_allowances": self.s.table_allowances.normalize().to_string(),
                "provision": self.s.provision.normalize().to_string(),
                "factor": factor.normalize().to_string(),
            }),
            serde_json::json!({
                "taxable_income": self.s.taxable_income.normalize().to_string(),
                "tariff_base": self.s.tariff_base.normalize().to_string(),
                "annual_tax": self.s.annual_tax.normalize().to_string(),
                "income_tax": self.s.period_tax.normalize().to_string(),
                "solidarity_surcharge": self.s.period_surcharge.normalize().to_string(),
                "church_tax_base": self.s.period_church_base.normalize().to_string(),
            }),
            format!(
                "Annual tax {} on taxable income {}, {} cents for the period",
                self.s.annual_tax.normalize(),
                self.s.taxable_income.normalize(),
                self.s.period_tax.normalize()
            ),
        );
    }

    /// Appends an audit step.
    fn record(
        &mut self,
        rule_id: &str,
        rule_name: &str,
        clause_ref: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: String,
    ) {
        let step_number = self.steps.len() as u32 + 1;
        self.steps.push(AuditStep {
            step_number,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            clause_ref: clause_ref.to_string(),
            input,
            output,
            reasoning,
        });
    }
}

impl Pass {
    fn into_result(self) -> WageTaxResult {
        let s = self.state;
        WageTaxResult {
            income_tax: s.period_tax,
            solidarity_surcharge: s.period_surcharge,
            church_tax_base: s.period_church_base,
            special_income_tax: s.special_tax,
            special_solidarity_surcharge: s.special_surcharge,
            special_church_tax_base: s.special_church_base,
            multi_year_income_tax: s.multi_year_tax,
            multi_year_solidarity_surcharge: s.multi_year_surcharge,
            multi_year_church_tax_base: s.multi_year_church_base,
            private_insurance_period: s.private_insurance_period,
            private_insurance_special: s.private_insurance_special,
            treaty: TreatyFigures {
                regular_relief: s.treaty_relief,
                regular_excess: s.treaty_excess,
                special_relief_without: s.treaty_special_relief_without,
                special_relief_increment: s.treaty_special_relief_increment,
                special_excess_without: s.treaty_special_excess_without,
                special_excess_with: s.treaty_special_excess_with,
            },
            audit_trace: self.trace,
        }
    }
}

/// Returns `amended - 11 * (initial - amended)`, floored at zero.
fn settle_december(initial: Decimal, amended: Decimal) -> Decimal {
    (amended - (initial - amended) * SETTLED_MONTHS).max(Decimal::ZERO)
}

/// Settles the months withheld under the initial tariff in the December
/// monthly figures of the amended pass.
fn december_blend(initial: Pass, mut amended: Pass) -> Pass {
    let before = (
        amended.state.period_tax,
        amended.state.period_surcharge,
        amended.state.period_church_base,
    );
    let (i, a) = (&initial.state, &mut amended.state);
    let unfloored_tax = a.period_tax - (i.period_tax - a.period_tax) * SETTLED_MONTHS;
    a.period_tax = settle_december(i.period_tax, a.period_tax);
    a.period_surcharge = settle_december(i.period_surcharge, a.period_surcharge);
    a.period_church_base = settle_december(i.period_church_base, a.period_church_base);

    let step_number = amended.trace.steps.len() as u32 + 1;
    amended.trace.steps.push(AuditStep {
        step_number,
        rule_id: "december_blend".to_string(),
        rule_name: "December Tariff Settlement".to_string(),
        clause_ref: "2024-12".to_string(),
        input: serde_json::json!({
            "initial_income_tax": initial.state.period_tax.normalize().to_string(),
            "amended_income_tax": before.0.normalize().to_string(),
            "initial_solidarity_surcharge": initial.state.period_surcharge.normalize().to_string(),
            "amended_solidarity_surcharge": before.1.normalize().to_string(),
            "initial_church_tax_base": initial.state.period_church_base.normalize().to_string(),
            "amended_church_tax_base": before.2.normalize().to_string(),
        }),
        output: serde_json::json!({
            "income_tax": amended.state.period_tax.normalize().to_string(),
            "solidarity_surcharge": amended.state.period_surcharge.normalize().to_string(),
            "church_tax_base": amended.state.period_church_base.normalize().to_string(),
        }),
        reasoning: format!(
            "December: {} - 11 × ({} - {}) = {}",
            before.0.normalize(),
            initial.state.period_tax.normalize(),
            before.0.normalize(),
            amended.state.period_tax.normalize()
        ),
    });
    if unfloored_tax < Decimal::ZERO {
        amended.trace.warnings.push(AuditWarning {
            code: "DECEMBER_SETTLEMENT_FLOORED".to_string(),
            message: format!(
                "December settlement of {} cents was floored at zero",
                unfloored_tax.normalize()
            ),
            severity: "low".to_string(),
        });
    }
    amended
}

/// Returns whether the period is a monthly December payroll of a year whose
/// tariff was amended retroactively, so that December settles the eleven
/// months withheld under the initial tariff.
pub(crate) fn settles_december(
    profile: &TaxpayerProfile,
    inputs: &PayPeriodInputs,
    constants: &YearConstants,
) -> bool {
    constants.december_amendment().is_some()
        && inputs.period == PayPeriod::Month
        && profile.month == Month::December
}

/// Computes the wage withholding tax for one pay period.
///
/// The inputs must have passed [`validate`](crate::validation::validate)
/// against the same constants; the computation itself cannot fail.
///
/// # Arguments
///
/// * `profile` - The employee's tax attributes
/// * `inputs` - The amounts paid in the period
/// * `constants` - The constants of `profile.year`
///
/// # Returns
///
/// Returns a `WageTaxResult` with every amount in cents and the audit trace.
///
/// # Example
///
/// ```
/// use lohnsteuer_engine::calculation::compute_wage_tax;
/// use lohnsteuer_engine::config::ConfigLoader;
/// use lohnsteuer_engine::models::{PayPeriod, PayPeriodInputs, TaxClass, TaxpayerProfile};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let loader = ConfigLoader::builtin().unwrap();
/// let mut profile = TaxpayerProfile::new(2025, TaxClass::I, 1985);
/// profile.health_additional_rate = Decimal::from_str("2.5").unwrap();
/// let inputs = PayPeriodInputs::new(PayPeriod::Month, 500_000);
///
/// let result = compute_wage_tax(&profile, &inputs, loader.year(2025).unwrap());
/// assert_eq!(result.income_tax, Decimal::from(79675));
/// assert_eq!(result.solidarity_surcharge, Decimal::ZERO);
/// ```
pub fn compute_wage_tax(
    profile: &TaxpayerProfile,
    inputs: &PayPeriodInputs,
    constants: &YearConstants,
) -> WageTaxResult {
    let initial = Pipeline::new(constants, constants.income_tax(), profile, inputs).run();

    let Some(amended_tariffs) = constants.december_amendment() else {
        return initial.into_result();
    };
    let amended = Pipeline::new(constants, amended_tariffs, profile, inputs).run();

    let pass = if settles_december(profile, inputs, constants) {
        december_blend(initial, amended)
    } else {
        amended
    };
    debug!(
        year = constants.year(),
        month = ?profile.month,
        income_tax = %pass.state.period_tax,
        "Selected tariff pass"
    );
    pass.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::models::TaxClass;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn profile(year: u16, class: TaxClass) -> TaxpayerProfile {
        let mut profile = TaxpayerProfile::new(year, class, 1985);
        profile.health_additional_rate = dec("1.7");
        profile
    }

    #[test]
    fn test_settle_december() {
        assert_eq!(settle_december(dec("1000"), dec("990")), dec("880"));
        assert_eq!(settle_december(dec("1000"), dec("1000")), dec("1000"));
        assert_eq!(settle_december(dec("100"), dec("5")), Decimal::ZERO);
    }

    #[test]
    fn test_zero_wage_yields_zero() {
        let loader = ConfigLoader::builtin().unwrap();
        for year in loader.years() {
            let constants = loader.year(year).unwrap();
            let result = compute_wage_tax(
                &profile(year, TaxClass::I),
                &PayPeriodInputs::new(PayPeriod::Month, 0),
                constants,
            );
            assert_eq!(result.income_tax, Decimal::ZERO, "year {year}");
            assert_eq!(result.solidarity_surcharge, Decimal::ZERO);
            assert_eq!(result.church_tax_base, Decimal::ZERO);
        }
    }

    #[test]
    fn test_audit_trace_steps_are_numbered() {
        let loader = ConfigLoader::builtin().unwrap();
        let result = compute_wage_tax(
            &profile(2025, TaxClass::I),
            &PayPeriodInputs::new(PayPeriod::Month, 400_000),
            loader.year(2025).unwrap(),
        );

        let ids: Vec<&str> = result
            .audit_trace
            .steps
            .iter()
            .map(|s| s.rule_id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "parameters",
                "annualisation",
                "pension_and_age_relief",
                "regular_wage_tax"
            ]
        );
        for (i, step) in result.audit_trace.steps.iter().enumerate() {
            assert_eq!(step.step_number, i as u32 + 1);
        }
    }

    #[test]
    fn test_other_payment_adds_audit_step() {
        let loader = ConfigLoader::builtin().unwrap();
        let mut p = profile(2025, TaxClass::I);
        p.carry_forward.annual_wage = 4_800_000;
        let mut inputs = PayPeriodInputs::new(PayPeriod::Month, 400_000);
        inputs.special.other = 500_000;

        let result = compute_wage_tax(&p, &inputs, loader.year(2025).unwrap());
        assert!(result.special_income_tax > Decimal::ZERO);
        assert!(
            result
                .audit_trace
                .steps
                .iter()
                .any(|s| s.rule_id == "other_payments")
        );
    }

    #[test]
    fn test_factor_scales_income_tax() {
        let loader = ConfigLoader::builtin().unwrap();
        let constants = loader.year(2025).unwrap();
        let inputs = PayPeriodInputs::new(PayPeriod::Year, 6_000_000);

        let full = compute_wage_tax(&profile(2025, TaxClass::IV), &inputs, constants);
        let mut reduced = profile(2025, TaxClass::IV);
        reduced.factor = Some(dec("0.9"));
        let scaled = compute_wage_tax(&reduced, &inputs, constants);

        let annual_full = full.income_tax / Decimal::ONE_HUNDRED;
        assert_eq!(
            scaled.income_tax,
            (annual_full * dec("0.9")).round_down(0) * Decimal::ONE_HUNDRED
        );
    }

    #[test]
    fn test_2024_uses_amended_tariff_before_december() {
        let loader = ConfigLoader::builtin().unwrap();
        let constants = loader.year(2024).unwrap();
        let amended_tariffs = constants.december_amendment().unwrap();
        let inputs = PayPeriodInputs::new(PayPeriod::Month, 500_000);

        let mut p = profile(2024, TaxClass::I);
        let initial = Pipeline::new(constants, constants.income_tax(), &p, &inputs)
            .run()
            .into_result();
        let amended = Pipeline::new(constants, amended_tariffs, &p, &inputs)
            .run()
            .into_result();
        assert!(amended.income_tax < initial.income_tax);

        for month in [Month::January, Month::June, Month::November] {
            p.month = month;
            let result = compute_wage_tax(&p, &inputs, constants);
            assert_eq!(result.income_tax, amended.income_tax, "{month:?}");
            assert_eq!(result.church_tax_base, amended.church_tax_base, "{month:?}");
            assert!(
                !result
                    .audit_trace
                    .steps
                    .iter()
                    .any(|s| s.rule_id == "december_blend")
            );
        }
    }

    #[test]
    fn test_settles_december_only_for_monthly_december() {
        let loader = ConfigLoader::builtin().unwrap();
        let monthly = PayPeriodInputs::new(PayPeriod::Month, 500_000);
        let yearly = PayPeriodInputs::new(PayPeriod::Year, 6_000_000);

        let mut p = profile(2024, TaxClass::I);
        p.month = Month::December;
        assert!(settles_december(&p, &monthly, loader.year(2024).unwrap()));
        assert!(!settles_december(&p, &yearly, loader.year(2024).unwrap()));

        let mut later = profile(2025, TaxClass::I);
        later.month = Month::December;
        assert!(!settles_december(&later, &monthly, loader.year(2025).unwrap()));

        p.month = Month::November;
        assert!(!settles_december(&p, &monthly, loader.year(2024).unwrap()));
    }

    #[test]
    fn test_2024_december_blend_lowers_tax() {
        let loader = ConfigLoader::builtin().unwrap();
        let constants = loader.year(2024).unwrap();
        let inputs = PayPeriodInputs::new(PayPeriod::Month, 500_000);

        let mut p = profile(2024, TaxClass::I);
        let november = compute_wage_tax(&p, &inputs, constants);
        p.month = Month::December;
        let december = compute_wage_tax(&p, &inputs, constants);

        assert!(december.income_tax < november.income_tax);
        let step = december.audit_trace.steps.last().unwrap();
        assert_eq!(step.rule_id, "december_blend");
    }
}
