//! Provision lump sum (Vorsorgepauschale).
//!
//! The pension part is the employee pension contribution on the capped
//! wage, scaled by the year's deductible share. The health and care part is
//! either the notional statutory employee contribution or the reported
//! private premium less the employer subsidy. The larger of their sum and
//! the minimum provision of 12 % of the wage is deducted.

use rust_decimal::Decimal;

use crate::models::{PensionInsurance, TaxClass};

use super::rounding::RoundExt;
use super::wage_tax::Pipeline;

const MINIMUM_RATE: Decimal = Decimal::from_parts(12, 0, 0, false, 2);
const MINIMUM_CAP: Decimal = Decimal::from_parts(1900, 0, 0, false, 0);
const MINIMUM_CAP_SPLITTING: Decimal = Decimal::from_parts(3000, 0, 0, false, 0);

/// How health and care insurance enter the provision lump sum (PKV).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrivateCover {
    /// Statutory insurance (0).
    None,
    /// Private insurance without employer subsidy (1).
    Unsubsidised,
    /// Private insurance with employer subsidy (2).
    Subsidised,
}

impl Pipeline<'_> {
    /// Computes the provision lump sum (UPEVP).
    pub(crate) fn provision_lump_sum(&mut self) {
        if self.profile.pension_insurance == PensionInsurance::Exempt {
            self.s.provision_pension = Decimal::ZERO;
        } else {
            self.s.provision_base = self.s.provision_base.min(self.s.pension_ceiling);
            let deductible =
                (self.s.provision_base * self.constants.pension_deduction_share()).round_down(2);
            self.s.provision_pension = (deductible * self.s.pension_rate).round_down(2);
        }

        let cap = if self.profile.tax_class.uses_splitting() {
            MINIMUM_CAP_SPLITTING
        } else {
            MINIMUM_CAP
        };
        self.s.provision_minimum = (self.s.provision_base * MINIMUM_RATE)
            .round_down(2)
            .min(cap);
        let minimum_total = (self.s.provision_pension + self.s.provision_minimum).round_up(0);

        self.health_provision();
        if minimum_total > self.s.provision {
            self.s.provision = minimum_total.round_down(2);
        }
    }

    /// Computes the health and care part and the regular provision (MVSP).
    fn health_provision(&mut self) {
        self.s.provision_base = self.s.provision_base.min(self.s.health_ceiling);

        self.s.provision_health = match self.private_cover() {
            PrivateCover::None => (self.s.provision_base
                * (self.s.health_rate_employee + self.s.care_rate_employee))
                .round_down(2),
            _ if self.profile.tax_class == TaxClass::VI => Decimal::ZERO,
            PrivateCover::Unsubsidised => {
                self.s.private_premiums * Decimal::from(12) / Decimal::ONE_HUNDRED
            }
            PrivateCover::Subsidised => {
                let premiums = self.s.private_premiums * Decimal::from(12) / Decimal::ONE_HUNDRED;
                (premiums
                    - self.s.provision_base
                        * (self.s.health_rate_employer + self.s.care_rate_employer))
                    .round_down(2)
            }
        };

        self.s.provision = (self.s.provision_health + self.s.provision_pension).round_up(0);
    }

    /// Computes the deductible private insurance premiums in cents (UPVKV).
    pub(crate) fn private_insurance_deduction(&mut self) {
        self.s.private_insurance = if self.private_cover() == PrivateCover::None {
            Decimal::ZERO
        } else {
            self.s.provision_minimum.max(self.s.provision_health) * Decimal::ONE_HUNDRED
        };
    }
}
