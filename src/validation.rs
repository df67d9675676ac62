//! Input validation.
//!
//! The withholding pipeline is total over validated inputs; everything it
//! cannot express, such as a factor outside class IV or a payment kind the
//! year does not know, is rejected here before any computation starts.

use rust_decimal::Decimal;
use tracing::warn;

use crate::config::YearConstants;
use crate::error::{EngineError, EngineResult};
use crate::models::{PayPeriodInputs, TaxClass, TaxpayerProfile};

const MAX_PENSION_MONTHS: u8 = 12;
const FACTOR_SCALE: u32 = 3;
const CHILD_ALLOWANCE_SCALE: u32 = 1;

fn invalid_profile(field: &str, message: String) -> EngineError {
    warn!(field, %message, "Rejected taxpayer profile");
    EngineError::InvalidProfile {
        field: field.to_string(),
        message,
    }
}

fn invalid_input(field: &str, message: String) -> EngineError {
    warn!(field, %message, "Rejected pay period input");
    EngineError::InvalidInput {
        field: field.to_string(),
        message,
    }
}

/// Returns the number of significant decimal places.
fn decimal_places(value: Decimal) -> u32 {
    value.normalize().scale()
}

/// Checks a profile and its period inputs against the constants of the year.
///
/// # Errors
///
/// Returns `YearNotSupported` if `constants` belong to another year,
/// `InvalidProfile` for attributes out of their domain and `InvalidInput`
/// for amounts the year cannot tax.
///
/// # Example
///
/// ```
/// use lohnsteuer_engine::config::ConfigLoader;
/// use lohnsteuer_engine::models::{PayPeriod, PayPeriodInputs, TaxClass, TaxpayerProfile};
/// use lohnsteuer_engine::validation::validate;
/// use rust_decimal::Decimal;
///
/// let loader = ConfigLoader::builtin().unwrap();
/// let constants = loader.year(2025).unwrap();
/// let inputs = PayPeriodInputs::new(PayPeriod::Month, 500_000);
///
/// let mut profile = TaxpayerProfile::new(2025, TaxClass::I, 1985);
/// assert!(validate(&profile, &inputs, constants).is_ok());
///
/// profile.factor = Some(Decimal::new(9, 1));
/// assert!(validate(&profile, &inputs, constants).is_err());
/// ```
pub fn validate(
    profile: &TaxpayerProfile,
    inputs: &PayPeriodInputs,
    constants: &YearConstants,
) -> EngineResult<()> {
    if profile.year != constants.year() {
        warn!(
            year = profile.year,
            loaded = constants.year(),
            "Profile year does not match the constants"
        );
        return Err(EngineError::YearNotSupported { year: profile.year });
    }
    validate_profile(profile)?;
    validate_inputs(profile, inputs, constants)
}

fn validate_profile(profile: &TaxpayerProfile) -> EngineResult<()> {
    if profile.birth_year > profile.year {
        return Err(invalid_profile(
            "birth_year",
            format!("{} is after the year {}", profile.birth_year, profile.year),
        ));
    }

    if let Some(factor) = profile.factor {
        if profile.tax_class != TaxClass::IV {
            return Err(invalid_profile(
                "factor",
                "only allowed for tax class IV".to_string(),
            ));
        }
        if factor <= Decimal::ZERO || factor > Decimal::ONE {
            return Err(invalid_profile(
                "factor",
                format!("{factor} is not within (0, 1]"),
            ));
        }
        if decimal_places(factor) > FACTOR_SCALE {
            return Err(invalid_profile(
                "factor",
                format!("{factor} has more than {FACTOR_SCALE} decimal places"),
            ));
        }
    }

    let units = profile.child_allowances;
    if units < Decimal::ZERO {
        return Err(invalid_profile(
            "child_allowances",
            format!("{units} is negative"),
        ));
    }
    if decimal_places(units) > CHILD_ALLOWANCE_SCALE {
        return Err(invalid_profile(
            "child_allowances",
            format!("{units} has more than {CHILD_ALLOWANCE_SCALE} decimal place"),
        ));
    }

    if let Some(rate) = profile.church_tax_rate {
        if rate < Decimal::ZERO {
            return Err(invalid_profile(
                "church_tax_rate",
                format!("{rate} is negative"),
            ));
        }
    }
    if profile.health_additional_rate < Decimal::ZERO {
        return Err(invalid_profile(
            "health_additional_rate",
            format!("{} is negative", profile.health_additional_rate),
        ));
    }

    if profile.pension_months > MAX_PENSION_MONTHS {
        return Err(invalid_profile(
            "pension_months",
            format!("{} exceeds {MAX_PENSION_MONTHS}", profile.pension_months),
        ));
    }
    if let Some(start) = profile.pension_start_year {
        if start > profile.year {
            return Err(invalid_profile(
                "pension_start_year",
                format!("{start} is after the year {}", profile.year),
            ));
        }
    }

    Ok(())
}

fn validate_inputs(
    profile: &TaxpayerProfile,
    inputs: &PayPeriodInputs,
    constants: &YearConstants,
) -> EngineResult<()> {
    let year = constants.year();
    let features = constants.features();

    if inputs.pension.period_amount > inputs.gross {
        return Err(invalid_input(
            "pension.period_amount",
            format!(
                "{} exceeds the gross wage {}",
                inputs.pension.period_amount, inputs.gross
            ),
        ));
    }
    let has_pension = inputs.pension.period_amount > 0
        || inputs.special.other_pension > 0
        || inputs.special.multi_year_pension > 0
        || profile.carry_forward.annual_pension > 0;
    if has_pension && profile.pension_start_year.is_none() {
        return Err(invalid_input(
            "pension.period_amount",
            "pension income requires a pension start year".to_string(),
        ));
    }

    let special = &inputs.special;
    if !features.share_benefits && special.share_benefit > 0 {
        return Err(invalid_input(
            "special.share_benefit",
            format!("not available in {year}"),
        ));
    }
    if !features.multi_year_compensation {
        let unsupported = [
            ("special.multi_year", special.multi_year),
            ("special.multi_year_pension", special.multi_year_pension),
            (
                "special.multi_year_compensation",
                special.multi_year_compensation,
            ),
        ];
        if let Some((field, _)) = unsupported.iter().find(|(_, amount)| *amount > 0) {
            return Err(invalid_input(field, format!("not available in {year}")));
        }
    }

    Ok(())
}
