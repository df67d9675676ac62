//! Pay period and per-period input models.
//!
//! This module contains the [`PayPeriod`] length code and the
//! [`PayPeriodInputs`] carrying every amount paid in one period. All amounts
//! are integer cents so that no binary rounding enters the pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The length of the pay period the wage was paid for.
///
/// The withholding tables use a 360 day administrative year, so a week
/// counts as 360/7 periods per year and a day as 360.
///
/// # Example
///
/// ```
/// use lohnsteuer_engine::models::PayPeriod;
/// use rust_decimal::Decimal;
///
/// assert_eq!(PayPeriod::Month.code(), 2);
/// assert_eq!(PayPeriod::Day.periods_per_year(), Decimal::from(360));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayPeriod {
    /// A full year (LZZ 1).
    Year,
    /// A calendar month (LZZ 2).
    Month,
    /// A week (LZZ 3).
    Week,
    /// A working day (LZZ 4).
    Day,
}

impl PayPeriod {
    /// Returns the numeric period code used by the withholding tables.
    pub fn code(&self) -> u8 {
        match self {
            PayPeriod::Year => 1,
            PayPeriod::Month => 2,
            PayPeriod::Week => 3,
            PayPeriod::Day => 4,
        }
    }

    /// Returns how many periods of this length make up the administrative year.
    ///
    /// The weekly value is the exact quotient 360/7 to 28 significant digits;
    /// the pipeline itself never multiplies by it and instead scales by 360
    /// and divides by 7 so that truncation happens only once.
    pub fn periods_per_year(&self) -> Decimal {
        match self {
            PayPeriod::Year => Decimal::ONE,
            PayPeriod::Month => Decimal::from(12),
            PayPeriod::Week => Decimal::from(360) / Decimal::from(7),
            PayPeriod::Day => Decimal::from(360),
        }
    }
}

/// Pension-type income (Versorgungsbezüge) paid with the wage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PensionBenefits {
    /// Pension income contained in the period wage (VBEZ).
    pub period_amount: u64,
    /// Monthly pension at the start of the benefit (VBEZM).
    pub monthly_base: u64,
    /// Special pension payments in the starting year (VBEZS).
    pub special: u64,
}

/// One-off payments taxed outside the regular period formula.
///
/// Share benefits exist from 2022, the multi-year fields only until 2024.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialPayments {
    /// Other payments (sonstige Bezüge) without the multi-year part (SONSTB).
    pub other: u64,
    /// Compensation contained in `other` (SONSTENT).
    pub other_compensation: u64,
    /// Pension income contained in `other` (VBS).
    pub other_pension: u64,
    /// Death benefit contained in `other_pension` (STERBE).
    pub death_benefit: u64,
    /// Tax-free employee share benefit (MBV).
    pub share_benefit: u64,
    /// Compensation for multi-year work (VMT).
    pub multi_year: u64,
    /// Capitalised pension paid for multi-year work (VKAPA).
    pub multi_year_pension: u64,
    /// Compensation contained in `multi_year` (ENTSCH).
    pub multi_year_compensation: u64,
}

impl SpecialPayments {
    /// Returns true if no special payment of any kind is present.
    pub fn is_empty(&self) -> bool {
        *self == SpecialPayments::default()
    }
}

/// Everything paid to the employee in one pay period.
///
/// # Example
///
/// ```
/// use lohnsteuer_engine::models::{PayPeriod, PayPeriodInputs};
///
/// let inputs = PayPeriodInputs::new(PayPeriod::Month, 500_000);
/// assert_eq!(inputs.gross, 500_000);
/// assert!(inputs.special.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriodInputs {
    /// The length of the pay period.
    pub period: PayPeriod,
    /// Gross wage for the period in cents (RE4), pension income included.
    pub gross: u64,
    /// Pension income paid with the wage.
    #[serde(default)]
    pub pension: PensionBenefits,
    /// One-off payments.
    #[serde(default)]
    pub special: SpecialPayments,
}

impl PayPeriodInputs {
    /// Creates inputs for a plain wage without pension income or special payments.
    pub fn new(period: PayPeriod, gross: u64) -> Self {
        Self {
            period,
            gross,
            pension: PensionBenefits::default(),
            special: SpecialPayments::default(),
        }
    }
}
