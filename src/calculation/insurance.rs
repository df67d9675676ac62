//! Social insurance contributions.
//!
//! Every branch takes the annual wage up to its ceiling, multiplies it by
//! the employee and the employer rate and rounds commercially to cents.
//! Pension and unemployment insurance share the pension ceiling, health and
//! care insurance the health ceiling.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{CareConfig, YearConstants};
use crate::models::{
    ContributionSplit, HealthInsurance, InsuranceResult, PensionInsurance, TaxpayerProfile,
};

use super::rounding::RoundExt;

const MONTHS: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Returns the employee and employer care rates in percent.
///
/// The employee table is indexed by the number of children, capped at its
/// last entry. Childless employees older than 23 pay the surcharge on top.
pub(crate) fn care_rates(profile: &TaxpayerProfile, care: &CareConfig) -> (Decimal, Decimal) {
    let (table, employer) = if profile.saxony {
        (&care.saxony_employee_rates, care.saxony_employer_rate)
    } else {
        (&care.employee_rates, care.employer_rate)
    };
    let index = usize::from(profile.care_children);
    let mut employee = table
        .get(index)
        .or(table.last())
        .copied()
        .unwrap_or(Decimal::ZERO);
    if profile.pays_childless_surcharge() {
        employee += care.childless_surcharge;
    }
    (employee, employer)
}

/// Converts a monthly premium in cents to a yearly amount in euros.
fn yearly_premium(cents: u64) -> Decimal {
    Decimal::from(cents) * MONTHS / Decimal::ONE_HUNDRED
}

/// Returns `capped * rate / 100` rounded to cents.
fn contribution(capped: Decimal, rate: Decimal) -> Decimal {
    (capped * rate / Decimal::ONE_HUNDRED).round_half_up(2)
}

/// Splits a private premium into the employee share and an employer
/// subsidy capped at half the premium and at `statutory_share`.
fn private_split(premium: Decimal, subsidised: bool, statutory_share: Decimal) -> ContributionSplit {
    let employer = if subsidised {
        (premium / Decimal::TWO).round_half_up(2).min(statutory_share)
    } else {
        Decimal::ZERO
    };
    ContributionSplit {
        employee: premium - employer,
        employer,
    }
}

/// Computes the annual social insurance contributions.
///
/// # Arguments
///
/// * `profile` - The employee's insurance attributes
/// * `gross_annual` - The annual regular wage in euros
/// * `constants` - The constants of `profile.year`
///
/// # Returns
///
/// Returns the employee and employer shares of each branch, in euros.
/// Wages up to twelve times the monthly minor employment limit yield zero
/// everywhere.
///
/// # Example
///
/// ```
/// use lohnsteuer_engine::calculation::compute_insurance;
/// use lohnsteuer_engine::config::ConfigLoader;
/// use lohnsteuer_engine::models::{TaxClass, TaxpayerProfile};
/// use rust_decimal::Decimal;
///
/// let loader = ConfigLoader::builtin().unwrap();
/// let profile = TaxpayerProfile::new(2025, TaxClass::I, 1985);
///
/// let result = compute_insurance(&profile, Decimal::from(6000), loader.year(2025).unwrap());
/// assert_eq!(result.employee_total(), Decimal::ZERO);
/// ```
pub fn compute_insurance(
    profile: &TaxpayerProfile,
    gross_annual: Decimal,
    constants: &YearConstants,
) -> InsuranceResult {
    let si = constants.social_insurance();
    if gross_annual <= si.minor_employment_limit * MONTHS {
        debug!(%gross_annual, "Minor employment, no contributions");
        return InsuranceResult::default();
    }

    let health_wage = gross_annual.min(si.health.ceiling);
    let general_half = si.health.general_rate / Decimal::TWO;
    let employer_health_rate = general_half + si.health.average_additional_rate / Decimal::TWO;
    let (care_employee_rate, care_employer_rate) = care_rates(profile, &si.care);
    let statutory_care = ContributionSplit {
        employee: contribution(health_wage, care_employee_rate),
        employer: contribution(health_wage, care_employer_rate),
    };

    let (health, care) = match profile.health_insurance {
        HealthInsurance::Statutory => {
            let share = contribution(
                health_wage,
                general_half + profile.health_additional_rate / Decimal::TWO,
            );
            let health = ContributionSplit {
                employee: share,
                employer: share,
            };
            (health, statutory_care)
        }
        HealthInsurance::Private {
            health_premium,
            care_premium,
            employer_subsidy,
        } => {
            let health = private_split(
                yearly_premium(health_premium),
                employer_subsidy,
                contribution(health_wage, employer_health_rate),
            );
            let care = match care_premium {
                Some(premium) => private_split(
                    yearly_premium(premium),
                    employer_subsidy,
                    statutory_care.employer,
                ),
                None => statutory_care,
            };
            (health, care)
        }
    };

    let (pension, unemployment) = match profile.pension_insurance {
        PensionInsurance::Exempt => (ContributionSplit::default(), ContributionSplit::default()),
        PensionInsurance::West | PensionInsurance::East => {
            let ceiling = if profile.pension_insurance == PensionInsurance::East {
                si.pension.ceiling_east
            } else {
                si.pension.ceiling_west
            };
            let pension_wage = gross_annual.min(ceiling);
            let pension_share = contribution(pension_wage, si.pension.rate / Decimal::TWO);
            let unemployment_share =
                contribution(pension_wage, si.unemployment.rate / Decimal::TWO);
            (
                ContributionSplit {
                    employee: pension_share,
                    employer: pension_share,
                },
                ContributionSplit {
                    employee: unemployment_share,
                    employer: unemployment_share,
                },
            )
        }
    };

    let result = InsuranceResult {
        health,
        care,
        pension,
        unemployment,
    };
    debug!(
        %gross_annual,
        employee = %result.employee_total(),
        employer = %result.employer_total(),
        "Computed social insurance"
    );
    result
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

    fn profile(year: u16) -> TaxpayerProfile {
        let mut profile = TaxpayerProfile::new(year, TaxClass::I, 1985);
        profile.health_additional_rate = dec("2.5");
        profile
    }

    fn insurance(profile: &TaxpayerProfile, gross: &str) -> InsuranceResult {
        let loader = ConfigLoader::builtin().unwrap();
        compute_insurance(profile, dec(gross), loader.year(profile.year).unwrap())
    }

    #[test]
    fn test_contribution_rounds_half_up() {
        assert_eq!(contribution(dec("100.10"), dec("9.3")), dec("9.31"));
        assert_eq!(contribution(dec("100.50"), dec("1")), dec("1.01"));
    }

    #[test]
    fn test_private_split_caps_subsidy() {
        let split = private_split(dec("6000"), true, dec("2500"));
        assert_eq!(split.employer, dec("2500"));
        assert_eq!(split.employee, dec("3500"));

        let split = private_split(dec("3000"), true, dec("2500"));
        assert_eq!(split.employer, dec("1500"));

        let split = private_split(dec("3000"), false, dec("2500"));
        assert_eq!(split.employer, Decimal::ZERO);
        assert_eq!(split.employee, dec("3000"));
    }

    #[test]
    fn test_care_rates_childless_surcharge() {
        let loader = ConfigLoader::builtin().unwrap();
        let care = &loader.year(2025).unwrap().social_insurance().care;
        let p = profile(2025);

        let (employee, employer) = care_rates(&p, care);
        assert_eq!(employee, care.employee_rates[0] + care.childless_surcharge);
        assert_eq!(employer, care.employer_rate);
    }

    #[test]
    fn test_care_rates_no_surcharge_at_23() {
        let loader = ConfigLoader::builtin().unwrap();
        let care = &loader.year(2025).unwrap().social_insurance().care;
        let p = TaxpayerProfile::new(2025, TaxClass::I, 2002);

        let (employee, _) = care_rates(&p, care);
        assert_eq!(employee, care.employee_rates[0]);
    }

    #[test]
    fn test_care_rates_capped_at_last_entry() {
        let loader = ConfigLoader::builtin().unwrap();
        let care = &loader.year(2025).unwrap().social_insurance().care;
        let mut p = profile(2025);
        p.care_children = 9;

        let (employee, _) = care_rates(&p, care);
        assert_eq!(employee, *care.employee_rates.last().unwrap());
    }

    #[test]
    fn test_care_rates_saxony() {
        let loader = ConfigLoader::builtin().unwrap();
        let care = &loader.year(2025).unwrap().social_insurance().care;
        let mut p = profile(2025);
        p.care_children = 1;
        p.saxony = true;

        let (employee, employer) = care_rates(&p, care);
        assert_eq!(employee, care.saxony_employee_rates[1]);
        assert_eq!(employer, care.saxony_employer_rate);
    }

    #[test]
    fn test_statutory_shares_are_equal_below_ceiling() {
        let result = insurance(&profile(2025), "60000");

        // (14.6 / 2 + 2.5 / 2) % = 8.55 %
        assert_eq!(result.health.employee, dec("5130.00"));
        assert_eq!(result.health.employer, dec("5130.00"));
        // 18.6 / 2 % = 9.3 %
        assert_eq!(result.pension.employee, dec("5580.00"));
        assert_eq!(result.pension.employer, dec("5580.00"));
    }

    #[test]
    fn test_ceilings_cap_the_wage() {
        let loader = ConfigLoader::builtin().unwrap();
        let si = loader.year(2025).unwrap().social_insurance();
        let p = profile(2025);

        let at_ceiling = insurance(&p, &si.pension.ceiling_west.to_string());
        let above = insurance(&p, "500000");
        assert_eq!(at_ceiling.pension, above.pension);
        assert_eq!(at_ceiling.unemployment, above.unemployment);
        assert_eq!(above.health, insurance(&p, &si.health.ceiling.to_string()).health);
    }

    #[test]
    fn test_exempt_pays_no_pension_or_unemployment() {
        let mut p = profile(2025);
        p.pension_insurance = PensionInsurance::Exempt;
        let result = insurance(&p, "60000");

        assert_eq!(result.pension, ContributionSplit::default());
        assert_eq!(result.unemployment, ContributionSplit::default());
        assert!(result.health.employee > Decimal::ZERO);
    }

    #[test]
    fn test_minor_employment_boundary() {
        let loader = ConfigLoader::builtin().unwrap();
        let limit = loader.year(2025).unwrap().social_insurance().minor_employment_limit * MONTHS;
        let p = profile(2025);

        assert_eq!(insurance(&p, &limit.to_string()), InsuranceResult::default());
        let above = insurance(&p, &(limit + dec("0.01")).to_string());
        assert!(above.employee_total() > Decimal::ZERO);
    }

    #[test]
    fn test_private_health_with_subsidy() {
        let mut p = profile(2025);
        p.health_insurance = HealthInsurance::Private {
            health_premium: 50_000,
            care_premium: Some(6_000),
            employer_subsidy: true,
        };
        let result = insurance(&p, "60000");

        // 500 € * 12 = 6000 €, half is below the statutory employer share
        assert_eq!(result.health.employer, dec("3000"));
        assert_eq!(result.health.employee, dec("3000"));
        assert_eq!(result.care.total(), dec("720"));
        assert_eq!(result.care.employer, dec("360"));
    }

    #[test]
    fn test_private_without_care_premium_uses_statutory_care() {
        let mut p = profile(2025);
        p.health_insurance = HealthInsurance::Private {
            health_premium: 50_000,
            care_premium: None,
            employer_subsidy: false,
        };
        let private = insurance(&p, "60000");
        let statutory = insurance(&profile(2025), "60000");

        assert_eq!(private.care, statutory.care);
        assert_eq!(private.health.employer, Decimal::ZERO);
        assert_eq!(private.health.employee, dec("6000"));
    }
}
