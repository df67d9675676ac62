//! Taxpayer profile model and related types.
//!
//! This module defines the [`TaxpayerProfile`] holding every attribute of the
//! employee that the withholding computation reads, together with the tax
//! class and insurance election enums.

use chrono::Month;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The wage tax class (Steuerklasse).
///
/// Serialized as the integer 1 to 6.
///
/// # Example
///
/// ```
/// use lohnsteuer_engine::models::TaxClass;
///
/// assert_eq!(TaxClass::try_from(3), Ok(TaxClass::III));
/// assert!(TaxClass::try_from(7).is_err());
/// assert_eq!(u8::from(TaxClass::V), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaxClass {
    /// Single, widowed or separated employees.
    I,
    /// Single parents entitled to the single parent relief.
    II,
    /// Married employees taxed with the splitting formula.
    III,
    /// Married employees with similar incomes. Taxed with the basic formula
    /// and half the child allowance, optionally scaled by a factor.
    IV,
    /// The spouse of a class III employee.
    V,
    /// Second and further employments.
    VI,
}

impl TaxClass {
    /// Returns true for classes V and VI, which use the separate class V/VI formula.
    pub fn uses_class_v_formula(&self) -> bool {
        matches!(self, TaxClass::V | TaxClass::VI)
    }

    /// Returns true only for class III. Class IV is taxed with the basic
    /// formula on each spouse's own wage.
    pub fn uses_splitting(&self) -> bool {
        matches!(self, TaxClass::III)
    }
}

impl TryFrom<u8> for TaxClass {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TaxClass::I),
            2 => Ok(TaxClass::II),
            3 => Ok(TaxClass::III),
            4 => Ok(TaxClass::IV),
            5 => Ok(TaxClass::V),
            6 => Ok(TaxClass::VI),
            other => Err(format!("tax class must be between 1 and 6, got {other}")),
        }
    }
}

impl From<TaxClass> for u8 {
    fn from(class: TaxClass) -> Self {
        match class {
            TaxClass::I => 1,
            TaxClass::II => 2,
            TaxClass::III => 3,
            TaxClass::IV => 4,
            TaxClass::V => 5,
            TaxClass::VI => 6,
        }
    }
}

/// Statutory pension insurance membership (KRV).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PensionInsurance {
    /// Insured, western contribution ceiling.
    #[default]
    West,
    /// Insured, eastern contribution ceiling.
    East,
    /// Not insured; no pension or unemployment contributions.
    Exempt,
}

/// Health insurance election.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum HealthInsurance {
    /// Statutory health and care insurance.
    #[default]
    Statutory,
    /// Private insurance with reported monthly premiums in cents.
    Private {
        /// Monthly basic health premium (part of PKPV).
        health_premium: u64,
        /// Monthly care premium (part of PKPV). Absent means statutory care rates apply.
        #[serde(default)]
        care_premium: Option<u64>,
        /// Whether the employer pays the subsidy (PKV 2).
        #[serde(default)]
        employer_subsidy: bool,
    },
}

impl HealthInsurance {
    /// Returns true for private insurance.
    pub fn is_private(&self) -> bool {
        matches!(self, HealthInsurance::Private { .. })
    }
}

/// Amounts already paid or granted by the same employer earlier in the year,
/// in cents. Read only by the special payment computations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryForward {
    /// Expected annual wage without the special payment (JRE4).
    pub annual_wage: u64,
    /// Pension income contained in `annual_wage` (JVBEZ).
    pub annual_pension: u64,
    /// Compensation contained in `annual_wage` (JRE4ENT).
    pub annual_compensation: u64,
    /// Annual allowance from the wage tax card (JFREIB).
    pub annual_allowance: u64,
    /// Annual add-back from the wage tax card (JHINZU).
    pub annual_add_back: u64,
}

fn default_month() -> Month {
    Month::January
}

/// All taxpayer attributes the computation reads.
///
/// # Example
///
/// ```
/// use lohnsteuer_engine::models::{TaxClass, TaxpayerProfile};
///
/// let profile = TaxpayerProfile::new(2025, TaxClass::I, 1985);
/// assert_eq!(profile.effective_factor(), rust_decimal::Decimal::ONE);
/// assert!(!profile.is_church_member());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxpayerProfile {
    /// Statutory year.
    pub year: u16,
    /// Accounting month; only December changes the 2024 result.
    #[serde(default = "default_month")]
    pub month: Month,
    /// Wage tax class.
    pub tax_class: TaxClass,
    /// Factor for class IV (Faktorverfahren); absent means 1.
    #[serde(default)]
    pub factor: Option<Decimal>,
    /// Child allowance units (ZKF), one decimal place.
    #[serde(default)]
    pub child_allowances: Decimal,
    /// Number of children counted for care insurance.
    #[serde(default)]
    pub care_children: u8,
    /// Church tax rate in percent; present for church members.
    #[serde(default)]
    pub church_tax_rate: Option<Decimal>,
    /// Year of birth.
    pub birth_year: u16,
    /// Pension insurance membership.
    #[serde(default)]
    pub pension_insurance: PensionInsurance,
    /// Health insurance election.
    #[serde(default)]
    pub health_insurance: HealthInsurance,
    /// Individual additional health contribution rate in percent (KVZ).
    #[serde(default)]
    pub health_additional_rate: Decimal,
    /// Employment in Saxony (PVS).
    #[serde(default)]
    pub saxony: bool,
    /// Year the pension benefit started (VJAHR).
    #[serde(default)]
    pub pension_start_year: Option<u16>,
    /// Months with pension payments in the year (ZMVB).
    #[serde(default)]
    pub pension_months: u8,
    /// Allowance per pay period in cents (LZZFREIB).
    #[serde(default)]
    pub period_allowance: u64,
    /// Add-back per pay period in cents (LZZHINZU).
    #[serde(default)]
    pub period_add_back: u64,
    /// Amounts from earlier in the year.
    #[serde(default)]
    pub carry_forward: CarryForward,
}

impl TaxpayerProfile {
    /// Creates a profile with statutory insurance and every optional attribute empty.
    pub fn new(year: u16, tax_class: TaxClass, birth_year: u16) -> Self {
        Self {
            year,
            month: default_month(),
            tax_class,
            factor: None,
            child_allowances: Decimal::ZERO,
            care_children: 0,
            church_tax_rate: None,
            birth_year,
            pension_insurance: PensionInsurance::default(),
            health_insurance: HealthInsurance::default(),
            health_additional_rate: Decimal::ZERO,
            saxony: false,
            pension_start_year: None,
            pension_months: 0,
            period_allowance: 0,
            period_add_back: 0,
            carry_forward: CarryForward::default(),
        }
    }

    /// Returns the factor, or 1 if none was elected.
    pub fn effective_factor(&self) -> Decimal {
        self.factor.unwrap_or(Decimal::ONE)
    }

    /// Returns true if the employee pays church tax.
    pub fn is_church_member(&self) -> bool {
        self.church_tax_rate.is_some_and(|rate| rate > Decimal::ZERO)
    }

    /// Returns true if the employee had turned 64 before the start of the year (ALTER1).
    pub fn is_age_relief_eligible(&self) -> bool {
        u32::from(self.birth_year) + 64 < u32::from(self.year)
    }

    /// Returns true if the childless care surcharge applies.
    pub fn pays_childless_surcharge(&self) -> bool {
        self.care_children == 0 && u32::from(self.year) > u32::from(self.birth_year) + 23
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
    fn test_tax_class_round_trip() {
        for code in 1..=6u8 {
            let class = TaxClass::try_from(code).unwrap();
            assert_eq!(u8::from(class), code);
        }
        assert!(TaxClass::try_from(0).is_err());
    }

    #[test]
    fn test_class_v_formula_classes() {
        assert!(TaxClass::V.uses_class_v_formula());
        assert!(TaxClass::VI.uses_class_v_formula());
        assert!(!TaxClass::III.uses_class_v_formula());
    }

    #[test]
    fn test_only_class_iii_uses_splitting() {
        assert!(TaxClass::III.uses_splitting());
        assert!(!TaxClass::IV.uses_splitting());
        assert!(!TaxClass::I.uses_splitting());
    }

    #[test]
    fn test_age_relief_eligibility() {
        assert!(!TaxpayerProfile::new(2025, TaxClass::I, 1961).is_age_relief_eligible());
        assert!(TaxpayerProfile::new(2025, TaxClass::I, 1960).is_age_relief_eligible());
    }

    #[test]
    fn test_childless_surcharge() {
        let mut profile = TaxpayerProfile::new(2025, TaxClass::I, 2002);
        assert!(!profile.pays_childless_surcharge());

        profile.birth_year = 2001;
        assert!(profile.pays_childless_surcharge());

        profile.care_children = 1;
        assert!(!profile.pays_childless_surcharge());
    }

    #[test]
    fn test_church_membership_requires_positive_rate() {
        let mut profile = TaxpayerProfile::new(2025, TaxClass::I, 1985);
        profile.church_tax_rate = Some(Decimal::ZERO);
        assert!(!profile.is_church_member());

        profile.church_tax_rate = Some(dec("9"));
        assert!(profile.is_church_member());
    }

    #[test]
    fn test_deserialize_minimal_profile() {
        let json = r#"{"year": 2024, "tax_class": 3, "birth_year": 1980}"#;
        let profile: TaxpayerProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile, TaxpayerProfile::new(2024, TaxClass::III, 1980));
        assert_eq!(profile.month, Month::January);
    }

    #[test]
    fn test_deserialize_private_insurance() {
        let json = r#"{
            "year": 2025,
            "tax_class": 1,
            "birth_year": 1985,
            "month": "December",
            "health_insurance": {"kind": "private", "health_premium": 45000, "employer_subsidy": true}
        }"#;
        let profile: TaxpayerProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.month, Month::December);
        assert_eq!(
            profile.health_insurance,
            HealthInsurance::Private {
                health_premium: 45000,
                care_premium: None,
                employer_subsidy: true,
            }
        );
    }

    #[test]
    fn test_invalid_tax_class_is_rejected() {
        let json = r#"{"year": 2024, "tax_class": 9, "birth_year": 1980}"#;
        assert!(serde_json::from_str::<TaxpayerProfile>(json).is_err());
    }
}
