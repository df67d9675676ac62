//! Core data models for the wage tax engine.
//!
//! This module contains the taxpayer, pay period and result types used
//! throughout the engine.

mod calculation_result;
mod pay_period;
mod taxpayer;

pub use calculation_result::{
    AuditStep, AuditTrace, AuditWarning, ContributionSplit, InsuranceResult, NetWageResult,
    TreatyFigures, WageTaxResult,
};
pub use pay_period::{PayPeriod, PayPeriodInputs, PensionBenefits, SpecialPayments};
pub use taxpayer::{CarryForward, HealthInsurance, PensionInsurance, TaxClass, TaxpayerProfile};
