//! Allowances built into the withholding table (MZTABFB).

use rust_decimal::Decimal;

use crate::models::TaxClass;

use super::rounding::RoundExt;
use super::wage_tax::Pipeline;

/// Pension lump sum (Werbungskosten-Pauschbetrag for pensions).
const PENSION_LUMP_SUM: Decimal = Decimal::from_parts(102, 0, 0, false, 0);
/// Special expense lump sum (Sonderausgaben-Pauschbetrag).
const SPECIAL_EXPENSE_LUMP_SUM: Decimal = Decimal::from_parts(36, 0, 0, false, 0);

impl Pipeline<'_> {
    /// Sums the lump sums, reliefs and supplement the tax class entitles to,
    /// and sets the tariff multiplier and child allowance.
    pub(crate) fn table_allowances(&mut self) {
        let class = self.profile.tax_class;
        self.s.lump_sums = Decimal::ZERO;

        if self.s.net_pension >= Decimal::ZERO && self.s.net_pension < self.s.pension_supplement {
            self.s.pension_supplement = self.s.net_pension;
        }

        if class != TaxClass::VI {
            if self.s.net_pension > Decimal::ZERO {
                let remaining = self.s.net_pension - self.s.pension_supplement;
                self.s.lump_sums = if remaining < PENSION_LUMP_SUM {
                    remaining.round_up(0)
                } else {
                    PENSION_LUMP_SUM
                };
            }
        } else {
            self.s.pension_supplement = Decimal::ZERO;
            self.s.special_pension_supplement = Decimal::ZERO;
        }

        if class != TaxClass::VI && self.s.net_wage > self.s.net_pension {
            let employee_lump_sum = self.constants.employee_lump_sum();
            let wage = self.s.net_wage - self.s.net_pension;
            self.s.lump_sums = if wage < employee_lump_sum {
                (self.s.lump_sums + wage).round_up(0)
            } else {
                self.s.lump_sums + employee_lump_sum
            };
        }

        let per_child = self.tariffs.child_allowance;
        let units = self.profile.child_allowances;
        self.s.tariff_multiplier = Decimal::ONE;
        self.s.single_parent_relief = Decimal::ZERO;
        self.s.special_expense_lump_sum = SPECIAL_EXPENSE_LUMP_SUM;
        match class {
            TaxClass::I => {
                self.s.child_allowance = (units * per_child).round_down(0);
            }
            TaxClass::II => {
                self.s.single_parent_relief = self.constants.single_parent_relief();
                self.s.child_allowance = (units * per_child).round_down(0);
            }
            TaxClass::III => {
                self.s.tariff_multiplier = Decimal::TWO;
                self.s.child_allowance = (units * per_child).round_down(0);
            }
            TaxClass::IV => {
                self.s.child_allowance = (units * per_child / Decimal::TWO).round_down(0);
            }
            TaxClass::V => {
                self.s.child_allowance = Decimal::ZERO;
            }
            TaxClass::VI => {
                self.s.special_expense_lump_sum = Decimal::ZERO;
                self.s.child_allowance = Decimal::ZERO;
            }
        }

        self.s.table_allowances = (self.s.single_parent_relief
            + self.s.lump_sums
            + self.s.special_expense_lump_sum
            + self.s.pension_supplement)
            .round_down(2);
    }
}
