//! Gross to net composition.
//!
//! This module ties the withholding pipeline and the insurance calculator
//! together: it validates the request, resolves the year, runs both and
//! projects every figure onto a monthly and a yearly basis.

use chrono::Month;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ConfigLoader;
use crate::error::EngineResult;
use crate::models::{NetWageResult, PayPeriod, PayPeriodInputs, TaxpayerProfile};
use crate::validation::validate;

use super::insurance::compute_insurance;
use super::rounding::RoundExt;
use super::state::ComputationState;
use super::wage_tax::{compute_wage_tax, settles_december};

const MONTHS: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// A flat employer levy charged as a percentage of the gross wage
/// (e.g. the U1/U2 reimbursement or insolvency levy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerLevy {
    /// Display name of the levy.
    pub name: String,
    /// Rate in percent of the gross wage.
    pub rate: Decimal,
}

/// Everything the composition needs for one employee and one pay period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetWageRequest {
    /// The employee.
    pub profile: TaxpayerProfile,
    /// The amounts paid in the period.
    pub inputs: PayPeriodInputs,
    /// Levies added to the employer cost.
    #[serde(default)]
    pub levies: Vec<EmployerLevy>,
}

impl NetWageRequest {
    /// Creates a request without levies.
    pub fn new(profile: TaxpayerProfile, inputs: PayPeriodInputs) -> Self {
        Self {
            profile,
            inputs,
            levies: Vec::new(),
        }
    }
}

/// A figure on both bases.
#[derive(Debug, Clone, Copy, Default)]
struct Projection {
    monthly: Decimal,
    yearly: Decimal,
}

impl Projection {
    /// Projects a period amount in cents.
    fn from_period(cents: Decimal, period: PayPeriod) -> Self {
        let euros = cents / Decimal::ONE_HUNDRED;
        let yearly = (euros * period.periods_per_year()).round_half_up(2);
        let monthly = if period == PayPeriod::Month {
            euros
        } else {
            (yearly / MONTHS).round_half_up(2)
        };
        Self { monthly, yearly }
    }

    /// Projects a settled period amount whose yearly figure is twelve times
    /// the regular amount rather than twelve times the settlement.
    fn settled(cents: Decimal, regular_cents: Decimal, period: PayPeriod) -> Self {
        Self {
            monthly: Self::from_period(cents, period).monthly,
            yearly: Self::from_period(regular_cents, period).yearly,
        }
    }

    /// Projects a yearly amount in euros.
    fn from_yearly(yearly: Decimal) -> Self {
        Self {
            monthly: (yearly / MONTHS).round_half_up(2),
            yearly,
        }
    }

    fn percent(self, rate: Decimal) -> Self {
        Self {
            monthly: (self.monthly * rate / Decimal::ONE_HUNDRED).round_half_up(2),
            yearly: (self.yearly * rate / Decimal::ONE_HUNDRED).round_half_up(2),
        }
    }
}

impl std::ops::Add for Projection {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            monthly: self.monthly + other.monthly,
            yearly: self.yearly + other.yearly,
        }
    }
}

impl std::ops::Sub for Projection {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            monthly: self.monthly - other.monthly,
            yearly: self.yearly - other.yearly,
        }
    }
}

/// Returns the church tax in euros on a base in cents.
fn church_tax(base_cents: Decimal, rate: Option<Decimal>) -> Decimal {
    match rate {
        Some(rate) if rate > Decimal::ZERO => {
            (base_cents / Decimal::ONE_HUNDRED * rate / Decimal::ONE_HUNDRED).round_down(2)
        }
        _ => Decimal::ZERO,
    }
}

/// Returns `part / whole` in percent, rounded to two places.
fn share_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        (part / whole * Decimal::ONE_HUNDRED).round_half_up(2)
    }
}

/// Computes the complete gross to net result for one pay period.
///
/// # Arguments
///
/// * `request` - The employee, the period amounts and the employer levies
/// * `loader` - The year tables
///
/// # Returns
///
/// Returns the flat result with monthly and yearly figures in euros, or an
/// error if the year is not loaded or the request fails validation.
///
/// # Example
///
/// ```
/// use lohnsteuer_engine::calculation::{NetWageRequest, compute_net_wage};
/// use lohnsteuer_engine::config::ConfigLoader;
/// use lohnsteuer_engine::models::{PayPeriod, PayPeriodInputs, TaxClass, TaxpayerProfile};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let loader = ConfigLoader::builtin().unwrap();
/// let mut profile = TaxpayerProfile::new(2025, TaxClass::I, 1985);
/// profile.health_additional_rate = Decimal::from_str("2.5").unwrap();
/// let request = NetWageRequest::new(profile, PayPeriodInputs::new(PayPeriod::Month, 500_000));
///
/// let result = compute_net_wage(&request, &loader).unwrap();
/// assert_eq!(result.income_tax_monthly, Decimal::from_str("796.75").unwrap());
/// ```
pub fn compute_net_wage(
    request: &NetWageRequest,
    loader: &ConfigLoader,
) -> EngineResult<NetWageResult> {
    let profile = &request.profile;
    let inputs = &request.inputs;
    let constants = loader.year(profile.year)?;
    validate(profile, inputs, constants)?;

    let period = inputs.period;
    let tax = compute_wage_tax(profile, inputs, constants);
    let regular = if settles_december(profile, inputs, constants) {
        let mut unsettled = profile.clone();
        unsettled.month = Month::November;
        Some(compute_wage_tax(&unsettled, inputs, constants))
    } else {
        None
    };
    let regular = regular.as_ref().unwrap_or(&tax);

    let gross_annual = ComputationState::new(period).annualise(Decimal::from(inputs.gross));
    let insurance = compute_insurance(profile, gross_annual, constants);

    let gross = Projection {
        monthly: if period == PayPeriod::Month {
            Decimal::from(inputs.gross) / Decimal::ONE_HUNDRED
        } else {
            (gross_annual / MONTHS).round_half_up(2)
        },
        yearly: gross_annual,
    };
    let income_tax = Projection::settled(tax.income_tax, regular.income_tax, period);
    let surcharge = Projection::settled(
        tax.solidarity_surcharge,
        regular.solidarity_surcharge,
        period,
    );
    let church = Projection::settled(
        church_tax(tax.church_tax_base, profile.church_tax_rate) * Decimal::ONE_HUNDRED,
        church_tax(regular.church_tax_base, profile.church_tax_rate) * Decimal::ONE_HUNDRED,
        period,
    );
    let taxes = income_tax + surcharge + church;

    let health_employee = Projection::from_yearly(insurance.health.employee);
    let health_employer = Projection::from_yearly(insurance.health.employer);
    let care_employee = Projection::from_yearly(insurance.care.employee);
    let care_employer = Projection::from_yearly(insurance.care.employer);
    let pension_employee = Projection::from_yearly(insurance.pension.employee);
    let pension_employer = Projection::from_yearly(insurance.pension.employer);
    let unemployment_employee = Projection::from_yearly(insurance.unemployment.employee);
    let unemployment_employer = Projection::from_yearly(insurance.unemployment.employer);
    let insurance_employee =
        health_employee + care_employee + pension_employee + unemployment_employee;
    let insurance_employer =
        health_employer + care_employer + pension_employer + unemployment_employer;

    let net = gross - taxes - insurance_employee;
    let levies = request
        .levies
        .iter()
        .fold(Projection::default(), |total, levy| {
            total + gross.percent(levy.rate)
        });
    let employer_cost = gross + insurance_employer + levies;

    let result = NetWageResult {
        year: profile.year,
        gross_monthly: gross.monthly,
        gross_yearly: gross.yearly,
        income_tax_monthly: income_tax.monthly,
        income_tax_yearly: income_tax.yearly,
        solidarity_surcharge_monthly: surcharge.monthly,
        solidarity_surcharge_yearly: surcharge.yearly,
        church_tax_monthly: church.monthly,
        church_tax_yearly: church.yearly,
        taxes_monthly: taxes.monthly,
        taxes_yearly: taxes.yearly,
        health_employee_monthly: health_employee.monthly,
        health_employee_yearly: health_employee.yearly,
        health_employer_monthly: health_employer.monthly,
        health_employer_yearly: health_employer.yearly,
        care_employee_monthly: care_employee.monthly,
        care_employee_yearly: care_employee.yearly,
        care_employer_monthly: care_employer.monthly,
        care_employer_yearly: care_employer.yearly,
        pension_employee_monthly: pension_employee.monthly,
        pension_employee_yearly: pension_employee.yearly,
        pension_employer_monthly: pension_employer.monthly,
        pension_employer_yearly: pension_employer.yearly,
        unemployment_employee_monthly: unemployment_employee.monthly,
        unemployment_employee_yearly: unemployment_employee.yearly,
        unemployment_employer_monthly: unemployment_employer.monthly,
        unemployment_employer_yearly: unemployment_employer.yearly,
        insurance_employee_monthly: insurance_employee.monthly,
        insurance_employee_yearly: insurance_employee.yearly,
        insurance_employer_monthly: insurance_employer.monthly,
        insurance_employer_yearly: insurance_employer.yearly,
        net_monthly: net.monthly,
        net_yearly: net.yearly,
        levies_monthly: levies.monthly,
        levies_yearly: levies.yearly,
        employer_cost_monthly: employer_cost.monthly,
        employer_cost_yearly: employer_cost.yearly,
        special_income_tax: tax.special_income_tax / Decimal::ONE_HUNDRED,
        special_solidarity_surcharge: tax.special_solidarity_surcharge / Decimal::ONE_HUNDRED,
        special_church_tax: church_tax(tax.special_church_tax_base, profile.church_tax_rate),
        multi_year_income_tax: tax.multi_year_income_tax / Decimal::ONE_HUNDRED,
        multi_year_solidarity_surcharge: tax.multi_year_solidarity_surcharge
            / Decimal::ONE_HUNDRED,
        multi_year_church_tax: church_tax(tax.multi_year_church_tax_base, profile.church_tax_rate),
        tax_rate: share_of(taxes.yearly, gross.yearly),
        insurance_rate: share_of(insurance_employee.yearly, gross.yearly),
        net_rate: share_of(net.yearly, gross.yearly),
    };

    info!(
        year = profile.year,
        tax_class = u8::from(profile.tax_class),
        period = ?period,
        gross_yearly = %result.gross_yearly,
        net_yearly = %result.net_yearly,
        "Computed net wage"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::models::TaxClass;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn request(gross: u64) -> NetWageRequest {
        let mut profile = TaxpayerProfile::new(2025, TaxClass::I, 1985);
        profile.health_additional_rate = dec("2.5");
        NetWageRequest::new(profile, PayPeriodInputs::new(PayPeriod::Month, gross))
    }

    #[test]
    fn test_projection_from_monthly_period() {
        let p = Projection::from_period(dec("79166"), PayPeriod::Month);
        assert_eq!(p.monthly, dec("791.66"));
        assert_eq!(p.yearly, dec("9499.92"));
    }

    #[test]
    fn test_projection_from_weekly_period() {
        let p = Projection::from_period(dec("7000"), PayPeriod::Week);
        // 70 € * 360 / 7 = 3600 €
        assert_eq!(p.yearly, dec("3600.00"));
        assert_eq!(p.monthly, dec("300.00"));
    }

    #[test]
    fn test_church_tax_truncates_cents() {
        assert_eq!(church_tax(dec("79166"), Some(dec("9"))), dec("71.24"));
        assert_eq!(church_tax(dec("79166"), None), Decimal::ZERO);
        assert_eq!(church_tax(dec("79166"), Some(Decimal::ZERO)), Decimal::ZERO);
    }

    #[test]
    fn test_share_of_zero_gross() {
        assert_eq!(share_of(dec("10"), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(share_of(dec("25"), dec("200")), dec("12.50"));
    }

    #[test]
    fn test_net_is_gross_less_taxes_and_contributions() {
        let loader = ConfigLoader::builtin().unwrap();
        let result = compute_net_wage(&request(500_000), &loader).unwrap();

        assert_eq!(result.gross_monthly, dec("5000"));
        assert_eq!(result.gross_yearly, dec("60000"));
        assert_eq!(
            result.net_yearly,
            result.gross_yearly - result.taxes_yearly - result.insurance_employee_yearly
        );
        assert_eq!(
            result.employer_cost_yearly,
            result.gross_yearly + result.insurance_employer_yearly
        );
    }

    #[test]
    fn test_levies_add_to_employer_cost() {
        let loader = ConfigLoader::builtin().unwrap();
        let mut req = request(500_000);
        req.levies = vec![
            EmployerLevy {
                name: "U1".to_string(),
                rate: dec("1.6"),
            },
            EmployerLevy {
                name: "Insolvency".to_string(),
                rate: dec("0.15"),
            },
        ];
        let result = compute_net_wage(&req, &loader).unwrap();

        assert_eq!(result.levies_monthly, dec("87.50"));
        assert_eq!(result.levies_yearly, dec("1050.00"));
        assert_eq!(
            result.employer_cost_yearly,
            result.gross_yearly + result.insurance_employer_yearly + dec("1050.00")
        );
    }

    #[test]
    fn test_church_member_pays_church_tax() {
        let loader = ConfigLoader::builtin().unwrap();
        let mut req = request(500_000);
        req.profile.church_tax_rate = Some(dec("9"));
        let result = compute_net_wage(&req, &loader).unwrap();

        assert_eq!(result.church_tax_monthly, dec("71.70"));
        assert_eq!(
            result.taxes_monthly,
            result.income_tax_monthly + result.solidarity_surcharge_monthly + dec("71.70")
        );
    }

    #[test]
    fn test_settled_december_yearly_figures_use_amended_tariff() {
        let loader = ConfigLoader::builtin().unwrap();
        let mut req = request(500_000);
        req.profile.year = 2024;
        req.profile.health_additional_rate = dec("1.7");
        req.profile.church_tax_rate = Some(dec("9"));
        let november = compute_net_wage(&req, &loader).unwrap();
        req.profile.month = Month::December;
        let december = compute_net_wage(&req, &loader).unwrap();

        assert_eq!(december.income_tax_monthly, dec("788.17"));
        assert!(december.income_tax_monthly < november.income_tax_monthly);
        assert_eq!(december.income_tax_yearly, november.income_tax_yearly);
        assert_eq!(december.income_tax_yearly, dec("9832.92"));
        assert_eq!(december.church_tax_yearly, november.church_tax_yearly);
        assert_eq!(december.net_yearly, november.net_yearly);
    }

    #[test]
    fn test_unsupported_year_is_rejected() {
        let loader = ConfigLoader::builtin().unwrap();
        let mut req = request(500_000);
        req.profile.year = 2018;

        let err = compute_net_wage(&req, &loader).unwrap_err();
        assert!(matches!(err, EngineError::YearNotSupported { year: 2018 }));
    }

    #[test]
    fn test_request_deserializes_without_levies() {
        let json = r#"{
            "profile": {"year": 2025, "tax_class": 1, "birth_year": 1985},
            "inputs": {"period": "month", "gross": 500000}
        }"#;
        let req: NetWageRequest = serde_json::from_str(json).unwrap();
        assert!(req.levies.is_empty());
        assert_eq!(req.inputs.gross, 500_000);
    }
}
