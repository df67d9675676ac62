//! Year table loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the statutory
//! year tables from YAML files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::{ReliefTables, YearConstants, YearDefinition};

/// Number of entries in every care insurance rate table.
const CARE_RATE_ENTRIES: usize = 6;

/// Year files embedded in the binary.
const BUILTIN_YEARS: [(&str, &str); 7] = [
    (
        "years/2019.yaml",
        include_str!("../../config/pap/years/2019.yaml"),
    ),
    (
        "years/2020.yaml",
        include_str!("../../config/pap/years/2020.yaml"),
    ),
    (
        "years/2021.yaml",
        include_str!("../../config/pap/years/2021.yaml"),
    ),
    (
        "years/2022.yaml",
        include_str!("../../config/pap/years/2022.yaml"),
    ),
    (
        "years/2023.yaml",
        include_str!("../../config/pap/years/2023.yaml"),
    ),
    (
        "years/2024.yaml",
        include_str!("../../config/pap/years/2024.yaml"),
    ),
    (
        "years/2025.yaml",
        include_str!("../../config/pap/years/2025.yaml"),
    ),
];

/// Relief table files embedded in the binary.
const BUILTIN_RELIEF: [(&str, &str); 2] = [
    (
        "relief/legacy.yaml",
        include_str!("../../config/pap/relief/legacy.yaml"),
    ),
    (
        "relief/extended.yaml",
        include_str!("../../config/pap/relief/extended.yaml"),
    ),
];

/// Loads and provides access to the per-year constant sets.
///
/// # Directory Structure
///
/// A custom configuration directory has the following structure:
/// ```text
/// config/pap/
/// ├── relief/
/// │   ├── legacy.yaml     # Relief tables referenced by name
/// │   └── extended.yaml
/// └── years/
///     ├── 2024.yaml       # One file per statutory year
///     └── 2025.yaml
/// ```
///
/// # Example
///
/// ```no_run
/// use lohnsteuer_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/pap")?;
/// let constants = loader.year(2024)?;
/// println!("Basic allowance: {}", constants.income_tax().tariff.basic_allowance);
/// # Ok::<(), lohnsteuer_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    years: BTreeMap<u16, YearConstants>,
}

impl ConfigLoader {
    /// Returns a loader over the tables for 2019 to 2025 embedded in the binary.
    ///
    /// # Example
    ///
    /// ```
    /// use lohnsteuer_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::builtin()?;
    /// assert_eq!(loader.years().count(), 7);
    /// # Ok::<(), lohnsteuer_engine::error::EngineError>(())
    /// ```
    pub fn builtin() -> EngineResult<Self> {
        let relief = BUILTIN_RELIEF
            .iter()
            .map(|(path, content)| Self::parse_yaml::<ReliefTables>(path, content))
            .collect::<EngineResult<Vec<_>>>()?;
        let years = BUILTIN_YEARS
            .iter()
            .map(|(path, content)| {
                Self::parse_yaml::<YearDefinition>(path, content).map(|d| (path.to_string(), d))
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Self::from_sources(years, relief)
    }

    /// Loads year tables from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/pap")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - The `years` or `relief` directory is missing or empty
    /// - Any file contains invalid YAML or misses a required field
    /// - A year references an unknown relief table
    /// - A relief or care rate table has the wrong number of entries
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let relief = Self::load_dir::<ReliefTables>(&path.join("relief"))?
            .into_iter()
            .map(|(_, table)| table)
            .collect();
        let years = Self::load_dir::<YearDefinition>(&path.join("years"))?;

        Self::from_sources(years, relief)
    }

    /// Joins year files with their relief tables and checks table shapes.
    fn from_sources(
        definitions: Vec<(String, YearDefinition)>,
        relief: Vec<ReliefTables>,
    ) -> EngineResult<Self> {
        let mut tables = BTreeMap::new();
        for table in relief {
            let lengths = table.column_lengths();
            if lengths[0] < 2 || lengths.iter().any(|len| *len != lengths[0]) {
                return Err(EngineError::ConfigParseError {
                    path: format!("relief/{}", table.name),
                    message: format!("relief columns must share one length of at least 2, got {lengths:?}"),
                });
            }
            tables.insert(table.name.clone(), table);
        }

        let mut years = BTreeMap::new();
        for (path, definition) in definitions {
            let care = &definition.social_insurance.care;
            if care.employee_rates.len() != CARE_RATE_ENTRIES
                || care.saxony_employee_rates.len() != CARE_RATE_ENTRIES
            {
                return Err(EngineError::ConfigParseError {
                    path,
                    message: format!("care employee rate tables need {CARE_RATE_ENTRIES} entries"),
                });
            }

            let relief = tables.get(&definition.relief_table).cloned().ok_or_else(|| {
                EngineError::ConfigParseError {
                    path: path.clone(),
                    message: format!("unknown relief table '{}'", definition.relief_table),
                }
            })?;

            debug!(year = definition.year, relief = %relief.name, "Loaded year tables");
            years.insert(definition.year, YearConstants::new(definition, relief));
        }

        Ok(Self { years })
    }

    /// Parses YAML content, reporting errors against `path`.
    fn parse_yaml<T: serde::de::DeserializeOwned>(path: &str, content: &str) -> EngineResult<T> {
        serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::parse_yaml(&path_str, &content)
    }

    /// Loads every YAML file of a directory, sorted by file name.
    fn load_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> EngineResult<Vec<(String, T)>> {
        let dir_str = dir.display().to_string();

        if !dir.exists() {
            return Err(EngineError::ConfigNotFound { path: dir_str });
        }

        let entries = fs::read_dir(dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no yaml files found)", dir_str),
            });
        }

        paths
            .iter()
            .map(|path| Ok((path.display().to_string(), Self::load_yaml::<T>(path)?)))
            .collect()
    }

    /// Returns the constant set of a statutory year.
    ///
    /// # Returns
    ///
    /// Returns the constants if the year is loaded, or `YearNotSupported`.
    pub fn year(&self, year: u16) -> EngineResult<&YearConstants> {
        self.years
            .get(&year)
            .ok_or(EngineError::YearNotSupported { year })
    }

    /// Returns the loaded years in ascending order.
    pub fn years(&self) -> impl Iterator<Item = u16> + '_ {
        self.years.keys().copied()
    }
}
