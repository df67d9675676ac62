//! Configuration types for the year tables.
//!
//! This module contains the strongly-typed structures deserialized from the
//! YAML year files and relief table files. All monetary values are in euros,
//! all rates in percent unless a field says otherwise.

use rust_decimal::Decimal;
use serde::Deserialize;

/// The five zone income tax formula of one tariff.
///
/// Zone 1 is tax free up to `basic_allowance`, zones 2 and 3 are the
/// progressive quadratic segments, zones 4 and 5 the linear 42 % and 45 %
/// segments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tariff {
    /// Basic allowance (Grundfreibetrag).
    pub basic_allowance: Decimal,
    /// Upper end of the first progressive zone.
    pub zone2_end: Decimal,
    /// Upper end of the second progressive zone.
    pub zone3_end: Decimal,
    /// Upper end of the 42 % zone.
    pub zone4_end: Decimal,
    /// Quadratic coefficient of the first progressive zone.
    pub zone2_coefficient: Decimal,
    /// Quadratic coefficient of the second progressive zone.
    pub zone3_coefficient: Decimal,
    /// Constant added in the second progressive zone.
    pub zone3_constant: Decimal,
    /// Amount subtracted in the 42 % zone.
    pub zone4_offset: Decimal,
    /// Amount subtracted in the 45 % zone.
    pub zone5_offset: Decimal,
}

/// Wage thresholds of the tax class V/VI formula.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassVThresholds {
    /// First threshold (W1STKL5).
    pub lower: Decimal,
    /// Second threshold (W2STKL5).
    pub middle: Decimal,
    /// Third threshold (W3STKL5).
    pub upper: Decimal,
}

/// Everything that changes when a tariff is amended mid-year.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TariffSet {
    /// The income tax formula.
    pub tariff: Tariff,
    /// Thresholds for tax classes V and VI.
    pub class_v_thresholds: ClassVThresholds,
    /// Child allowance per full child unit.
    pub child_allowance: Decimal,
}

/// Solidarity surcharge parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SolidarityConfig {
    /// Annual income tax up to which no surcharge is levied (basic table).
    pub exemption: Decimal,
    /// Percentage of the excess over the exemption levied in the phase-in zone.
    pub phase_in_rate: Decimal,
}

/// Computation steps that exist only in some years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FeatureFlags {
    /// Multi-year compensation taxed with the one-fifth rule.
    pub multi_year_compensation: bool,
    /// Tax-free employee share benefits (Vermögensbeteiligungen).
    pub share_benefits: bool,
    /// Special payment surcharge only above the exemption.
    pub special_payment_exemption_test: bool,
}

/// Statutory health insurance parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthConfig {
    /// General contribution rate, shared equally.
    pub general_rate: Decimal,
    /// Reduced rate without sick pay entitlement, used in the provision lump sum.
    pub reduced_rate: Decimal,
    /// Average additional rate published for the year.
    pub average_additional_rate: Decimal,
    /// Annual contribution ceiling (shared with care insurance).
    pub ceiling: Decimal,
}

/// Care insurance parameters.
///
/// The employee rate tables are indexed by the number of children, capped at
/// the last entry; index 0 is the childless rate before the surcharge.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CareConfig {
    /// Employer rate outside Saxony.
    pub employer_rate: Decimal,
    /// Employee rates by number of children outside Saxony.
    pub employee_rates: Vec<Decimal>,
    /// Employer rate in Saxony.
    pub saxony_employer_rate: Decimal,
    /// Employee rates by number of children in Saxony.
    pub saxony_employee_rates: Vec<Decimal>,
    /// Surcharge for childless employees older than 23.
    pub childless_surcharge: Decimal,
}

/// Statutory pension insurance parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PensionConfig {
    /// Total contribution rate, shared equally.
    pub rate: Decimal,
    /// Annual ceiling in the western states.
    pub ceiling_west: Decimal,
    /// Annual ceiling in the eastern states.
    pub ceiling_east: Decimal,
}

/// Unemployment insurance parameters. The ceiling is the pension ceiling.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnemploymentConfig {
    /// Total contribution rate, shared equally.
    pub rate: Decimal,
}

/// All social insurance parameters of one year.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SocialInsuranceConfig {
    /// Monthly wage up to which no contributions are due.
    pub minor_employment_limit: Decimal,
    /// Health insurance.
    pub health: HealthConfig,
    /// Care insurance.
    pub care: CareConfig,
    /// Pension insurance.
    pub pension: PensionConfig,
    /// Unemployment insurance.
    pub unemployment: UnemploymentConfig,
}

/// One year file as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct YearDefinition {
    /// The statutory year.
    pub year: u16,
    /// Name of the relief table file this year uses.
    pub relief_table: String,
    /// Tariff in force at the start of the year.
    pub income_tax: TariffSet,
    /// Employee lump sum (Arbeitnehmer-Pauschbetrag).
    pub employee_lump_sum: Decimal,
    /// Relief for single parents (Entlastungsbetrag, class II).
    pub single_parent_relief: Decimal,
    /// Share of the pension contribution that counts towards the provision lump sum.
    pub pension_deduction_share: Decimal,
    /// Solidarity surcharge parameters.
    pub solidarity: SolidarityConfig,
    /// Year-gated computation steps.
    pub features: FeatureFlags,
    /// Tariff enacted retroactively and settled in December.
    #[serde(default)]
    pub december_amendment: Option<TariffSet>,
    /// Social insurance parameters.
    pub social_insurance: SocialInsuranceConfig,
}

/// Pension relief values of one relief table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PensionReliefRow {
    /// Relief percentage as a fraction (TAB1).
    pub percentage: Decimal,
    /// Maximum relief (TAB2).
    pub cap: Decimal,
    /// Supplement to the relief (TAB3).
    pub supplement: Decimal,
}

/// Age relief values of one relief table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeReliefRow {
    /// Relief percentage as a fraction (TAB4).
    pub percentage: Decimal,
    /// Maximum relief (TAB5).
    pub cap: Decimal,
}

/// Pension and age relief tables, one row per year since 2004.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReliefTables {
    /// Name under which year files reference this table.
    pub name: String,
    /// Pension relief percentage (TAB1).
    pub pension_percentage: Vec<Decimal>,
    /// Pension relief supplement (TAB3).
    pub pension_supplement: Vec<Decimal>,
    /// Pension relief cap (TAB2).
    pub pension_cap: Vec<Decimal>,
    /// Age relief percentage (TAB4).
    pub age_percentage: Vec<Decimal>,
    /// Age relief cap (TAB5).
    pub age_cap: Vec<Decimal>,
}

/// The reference year the relief rows count from.
const RELIEF_REFERENCE_YEAR: usize = 2004;

impl ReliefTables {
    /// Returns the index of the last row, which also covers all later years.
    pub fn last_row(&self) -> usize {
        self.pension_percentage.len().saturating_sub(1)
    }

    /// Returns the row for a benefit that started in `start_year`.
    ///
    /// Years before 2006 share row 1, years at or beyond the end of the table
    /// use the last row.
    ///
    /// # Example
    ///
    /// ```
    /// use lohnsteuer_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::builtin().unwrap();
    /// let relief = loader.year(2025).unwrap().relief();
    /// assert_eq!(relief.row_for(2003), 1);
    /// assert_eq!(relief.row_for(2025), 21);
    /// assert_eq!(relief.row_for(2070), 54);
    /// ```
    pub fn row_for(&self, start_year: u16) -> usize {
        let last = self.last_row();
        let start = usize::from(start_year);
        if start < RELIEF_REFERENCE_YEAR + 2 {
            1
        } else if start < RELIEF_REFERENCE_YEAR + last {
            start - RELIEF_REFERENCE_YEAR
        } else {
            last
        }
    }

    /// Returns the pension relief values of a row.
    pub fn pension_row(&self, row: usize) -> PensionReliefRow {
        PensionReliefRow {
            percentage: self.pension_percentage[row],
            cap: self.pension_cap[row],
            supplement: self.pension_supplement[row],
        }
    }

    /// Returns the age relief values of a row.
    pub fn age_row(&self, row: usize) -> AgeReliefRow {
        AgeReliefRow {
            percentage: self.age_percentage[row],
            cap: self.age_cap[row],
        }
    }

    /// Returns the length of every column, in column order.
    pub(crate) fn column_lengths(&self) -> [usize; 5] {
        [
            self.pension_percentage.len(),
            self.pension_supplement.len(),
            self.pension_cap.len(),
            self.age_percentage.len(),
            self.age_cap.len(),
        ]
    }
}

/// The complete, immutable constant set of one statutory year.
///
/// Built by the [`ConfigLoader`](super::ConfigLoader) from a year file and
/// the relief tables it references.
#[derive(Debug, Clone)]
pub struct YearConstants {
    /// The year file.
    definition: YearDefinition,
    /// The relief tables referenced by the year file.
    relief: ReliefTables,
}

impl YearConstants {
    /// Creates a new YearConstants from its component parts.
    pub fn new(definition: YearDefinition, relief: ReliefTables) -> Self {
        Self { definition, relief }
    }

    /// Returns the statutory year.
    pub fn year(&self) -> u16 {
        self.definition.year
    }

    /// Returns the tariff in force at the start of the year.
    pub fn income_tax(&self) -> &TariffSet {
        &self.definition.income_tax
    }

    /// Returns the retroactive December tariff, if the year has one.
    pub fn december_amendment(&self) -> Option<&TariffSet> {
        self.definition.december_amendment.as_ref()
    }

    /// Returns the employee lump sum.
    pub fn employee_lump_sum(&self) -> Decimal {
        self.definition.employee_lump_sum
    }

    /// Returns the single parent relief.
    pub fn single_parent_relief(&self) -> Decimal {
        self.definition.single_parent_relief
    }

    /// Returns the deductible share of the pension contribution.
    pub fn pension_deduction_share(&self) -> Decimal {
        self.definition.pension_deduction_share
    }

    /// Returns the solidarity surcharge parameters.
    pub fn solidarity(&self) -> &SolidarityConfig {
        &self.definition.solidarity
    }

    /// Returns the year-gated feature flags.
    pub fn features(&self) -> FeatureFlags {
        self.definition.features
    }

    /// Returns the relief tables.
    pub fn relief(&self) -> &ReliefTables {
        &self.relief
    }

    /// Returns the social insurance parameters.
    pub fn social_insurance(&self) -> &SocialInsuranceConfig {
        &self.definition.social_insurance
    }
}
