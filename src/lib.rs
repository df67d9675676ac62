//! German wage tax and social insurance engine.
//!
//! This crate computes, for one employee and one pay period, the wage
//! withholding tax (Lohnsteuer), solidarity surcharge, church tax and the
//! statutory social insurance contributions for the statutory years 2019 to
//! 2025, following the official withholding flowchart rounding step by step.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod validation;
