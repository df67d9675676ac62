//! Year table loading and management for the wage tax engine.
//!
//! Every statutory year is described by one YAML file holding the tariff,
//! lump sums, feature flags and social insurance parameters, plus a shared
//! relief table file referenced by name. The tables for 2019 to 2025 are
//! embedded in the binary; custom tables can be loaded from a directory.
//!
//! # Example
//!
//! ```
//! use lohnsteuer_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::builtin().unwrap();
//! let constants = loader.year(2025).unwrap();
//! assert_eq!(constants.year(), 2025);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AgeReliefRow, CareConfig, ClassVThresholds, FeatureFlags, HealthConfig, PensionConfig,
    PensionReliefRow, ReliefTables, SocialInsuranceConfig, SolidarityConfig, Tariff, TariffSet,
    UnemploymentConfig, YearConstants, YearDefinition,
};
