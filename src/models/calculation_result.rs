//! Calculation result models for the wage tax engine.
//!
//! This module contains the outputs of the three public computations: the
//! [`WageTaxResult`] of the withholding pipeline, the [`InsuranceResult`] of
//! the social insurance calculator and the flat [`NetWageResult`] of the
//! gross to net composition, plus the audit trace shared by all of them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a stage of the
/// pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the stage.
    pub rule_id: String,
    /// The human-readable name of the stage.
    pub rule_name: String,
    /// The flowchart procedure the stage implements (e.g. "MBERECH").
    pub clause_ref: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings flag clamped or zeroed amounts that the caller may want to look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for a calculation.
///
/// # Example
///
/// ```
/// use lohnsteuer_engine::models::AuditTrace;
///
/// let trace = AuditTrace::default();
/// assert!(trace.steps.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
}

/// Figures reported for double taxation treaties, in cents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatyFigures {
    /// Pension and lump sum reliefs of the regular wage (VFRB).
    pub regular_relief: Decimal,
    /// Taxable income of the regular wage above the basic allowance (WVFRB).
    pub regular_excess: Decimal,
    /// Reliefs of the annual wage without the special payment (VFRBS1).
    pub special_relief_without: Decimal,
    /// Additional reliefs caused by the special payment (VFRBS2).
    pub special_relief_increment: Decimal,
    /// Taxable income above the basic allowance without the special payment (WVFRBO).
    pub special_excess_without: Decimal,
    /// Taxable income above the basic allowance with the special payment (WVFRBM).
    pub special_excess_with: Decimal,
}

/// The output of the withholding pipeline. Amounts are in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WageTaxResult {
    /// Income tax for the pay period (LSTLZZ).
    pub income_tax: Decimal,
    /// Solidarity surcharge for the pay period (SOLZLZZ).
    pub solidarity_surcharge: Decimal,
    /// Church tax base for the pay period (BK).
    pub church_tax_base: Decimal,
    /// Income tax on other payments (STS).
    pub special_income_tax: Decimal,
    /// Solidarity surcharge on other payments (SOLZS).
    pub special_solidarity_surcharge: Decimal,
    /// Church tax base of other payments (BKS).
    pub special_church_tax_base: Decimal,
    /// Income tax on multi-year compensation (STV).
    pub multi_year_income_tax: Decimal,
    /// Solidarity surcharge on multi-year compensation (SOLZV).
    pub multi_year_solidarity_surcharge: Decimal,
    /// Church tax base of multi-year compensation (BKV).
    pub multi_year_church_tax_base: Decimal,
    /// Private insurance premiums deducted in the pay period (VKVLZZ).
    pub private_insurance_period: Decimal,
    /// Private insurance premiums deducted for other payments (VKVSONST).
    pub private_insurance_special: Decimal,
    /// Double taxation treaty figures.
    pub treaty: TreatyFigures,
    /// Stage-by-stage trace of the computation.
    pub audit_trace: AuditTrace,
}

/// Employee and employer shares of one contribution, in euros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionSplit {
    /// Employee share.
    pub employee: Decimal,
    /// Employer share.
    pub employer: Decimal,
}

impl ContributionSplit {
    /// Returns the sum of both shares.
    pub fn total(&self) -> Decimal {
        self.employee + self.employer
    }
}

/// Annual social insurance contributions, in euros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceResult {
    /// Health insurance.
    pub health: ContributionSplit,
    /// Care insurance.
    pub care: ContributionSplit,
    /// Pension insurance.
    pub pension: ContributionSplit,
    /// Unemployment insurance.
    pub unemployment: ContributionSplit,
}

impl InsuranceResult {
    /// Returns the employee shares of all four branches.
    pub fn employee_total(&self) -> Decimal {
        self.health.employee + self.care.employee + self.pension.employee + self.unemployment.employee
    }

    /// Returns the employer shares of all four branches.
    pub fn employer_total(&self) -> Decimal {
        self.health.employer + self.care.employer + self.pension.employer + self.unemployment.employer
    }
}

/// The flat gross to net result, in euros. Percentages are of the gross wage.
///
/// For a settled December the monthly taxes are the settlement, while the
/// yearly taxes are twelve months at the amended tariff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetWageResult {
    /// Statutory year.
    pub year: u16,

    /// Gross wage per month.
    pub gross_monthly: Decimal,
    /// Gross wage per year.
    pub gross_yearly: Decimal,

    /// Income tax per month.
    pub income_tax_monthly: Decimal,
    /// Income tax per year.
    pub income_tax_yearly: Decimal,
    /// Solidarity surcharge per month.
    pub solidarity_surcharge_monthly: Decimal,
    /// Solidarity surcharge per year.
    pub solidarity_surcharge_yearly: Decimal,
    /// Church tax per month.
    pub church_tax_monthly: Decimal,
    /// Church tax per year.
    pub church_tax_yearly: Decimal,
    /// All taxes per month.
    pub taxes_monthly: Decimal,
    /// All taxes per year.
    pub taxes_yearly: Decimal,

    /// Employee health contribution per month.
    pub health_employee_monthly: Decimal,
    /// Employee health contribution per year.
    pub health_employee_yearly: Decimal,
    /// Employer health contribution per month.
    pub health_employer_monthly: Decimal,
    /// Employer health contribution per year.
    pub health_employer_yearly: Decimal,
    /// Employee care contribution per month.
    pub care_employee_monthly: Decimal,
    /// Employee care contribution per year.
    pub care_employee_yearly: Decimal,
    /// Employer care contribution per month.
    pub care_employer_monthly: Decimal,
    /// Employer care contribution per year.
    pub care_employer_yearly: Decimal,
    /// Employee pension contribution per month.
    pub pension_employee_monthly: Decimal,
    /// Employee pension contribution per year.
    pub pension_employee_yearly: Decimal,
    /// Employer pension contribution per month.
    pub pension_employer_monthly: Decimal,
    /// Employer pension contribution per year.
    pub pension_employer_yearly: Decimal,
    /// Employee unemployment contribution per month.
    pub unemployment_employee_monthly: Decimal,
    /// Employee unemployment contribution per year.
    pub unemployment_employee_yearly: Decimal,
    /// Employer unemployment contribution per month.
    pub unemployment_employer_monthly: Decimal,
    /// Employer unemployment contribution per year.
    pub unemployment_employer_yearly: Decimal,
    /// All employee contributions per month.
    pub insurance_employee_monthly: Decimal,
    /// All employee contributions per year.
    pub insurance_employee_yearly: Decimal,
    /// All employer contributions per month.
    pub insurance_employer_monthly: Decimal,
    /// All employer contributions per year.
    pub insurance_employer_yearly: Decimal,

    /// Net wage per month.
    pub net_monthly: Decimal,
    /// Net wage per year.
    pub net_yearly: Decimal,
    /// Employer levies per month.
    pub levies_monthly: Decimal,
    /// Employer levies per year.
    pub levies_yearly: Decimal,
    /// Gross wage plus employer contributions and levies per month.
    pub employer_cost_monthly: Decimal,
    /// Gross wage plus employer contributions and levies per year.
    pub employer_cost_yearly: Decimal,

    /// Income tax on other payments.
    pub special_income_tax: Decimal,
    /// Solidarity surcharge on other payments.
    pub special_solidarity_surcharge: Decimal,
    /// Church tax on other payments.
    pub special_church_tax: Decimal,
    /// Income tax on multi-year compensation.
    pub multi_year_income_tax: Decimal,
    /// Solidarity surcharge on multi-year compensation.
    pub multi_year_solidarity_surcharge: Decimal,
    /// Church tax on multi-year compensation.
    pub multi_year_church_tax: Decimal,

    /// Taxes as a percentage of gross.
    pub tax_rate: Decimal,
    /// Employee contributions as a percentage of gross.
    pub insurance_rate: Decimal,
    /// Net wage as a percentage of gross.
    pub net_rate: Decimal,
}
