//! Calculation logic for the wage tax engine.
//!
//! This module contains the withholding pipeline with its stages (tariff,
//! pension and age relief, table allowances, provision lump sum, solidarity
//! surcharge, other payments and multi-year compensation), the social
//! insurance calculator and the gross to net composition on top of both.

mod allowances;
mod insurance;
mod net_wage;
mod pension_relief;
mod provision;
mod rounding;
mod special_payments;
mod state;
mod surcharge;
mod tariff;
mod wage_tax;

pub use insurance::compute_insurance;
pub use net_wage::{EmployerLevy, NetWageRequest, compute_net_wage};
pub use rounding::RoundExt;
pub use surcharge::annual_surcharge;
pub use tariff::{class_v_tax, tariff_tax};
pub use wage_tax::compute_wage_tax;
