//! Error types for the wage tax engine.
//!
//! The pipeline itself is total over validated inputs, so every error here is
//! raised either while loading year tables or while validating a taxpayer
//! profile before any computation starts.

use thiserror::Error;

/// The main error type for the wage tax engine.
///
/// # Example
///
/// ```
/// use lohnsteuer_engine::error::EngineError;
///
/// let error = EngineError::YearNotSupported { year: 2018 };
/// assert_eq!(error.to_string(), "Statutory year not supported: 2018");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No year tables are loaded for the requested statutory year.
    #[error("Statutory year not supported: {year}")]
    YearNotSupported {
        /// The requested year.
        year: u16,
    },

    /// A taxpayer attribute was out of its domain.
    #[error("Invalid profile field '{field}': {message}")]
    InvalidProfile {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A pay period amount was out of its domain.
    #[error("Invalid input field '{field}': {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
