use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Corporate tax regime for the project company, including an investment
/// board style tax holiday and enhanced capital allowances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxPolicy {
    pub corporate_tax_rate: Rate,
    /// Straight-line depreciation period (operating years)
    pub depreciation_years: u32,
    /// Length of the tax holiday; zero disables it
    pub tax_holiday_years: u32,
    /// First operating year (1-based) of the holiday
    pub tax_holiday_start_year: u32,
    /// Capital allowance multiplier (1.0 = plain straight line)
    pub enhanced_capital_allowance_multiplier: Decimal,
    /// Restrict the enhanced allowance to the first N depreciation years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_allowance_years: Option<u32>,
    /// Deduct realised interest from taxable income (second CFADS pass)
    #[serde(default)]
    pub interest_deductible: bool,
}

/// Tax outcome for one operating year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxAssessment {
    pub depreciation: Money,
    pub interest_expense: Money,
    pub taxable_income: Money,
    pub tax: Money,
    pub in_holiday: bool,
}

impl TaxPolicy {
    /// Whether 1-based operating year `op_year` falls inside
    /// [start, start + holiday_years).
    pub fn in_holiday(&self, op_year: u32) -> bool {
        if self.tax_holiday_years == 0 {
            return false;
        }
        let start = self.tax_holiday_start_year;
        op_year >= start && op_year - start < self.tax_holiday_years
    }

    /// taxable = revenue − opex − depreciation − interest; tax is zero inside
    /// the holiday window and on losses.
    pub fn assess(
        &self,
        op_year: u32,
        revenue: Money,
        opex: Money,
        depreciation: Money,
        interest_expense: Money,
    ) -> TaxAssessment {
        let taxable_income = revenue - opex - depreciation - interest_expense;
        let in_holiday = self.in_holiday(op_year);
        let rate = self.corporate_tax_rate.max(Decimal::ZERO);

        let tax = if in_holiday || rate.is_zero() {
            Decimal::ZERO
        } else {
            taxable_income.max(Decimal::ZERO) * rate
        };

        TaxAssessment {
            depreciation,
            interest_expense,
            taxable_income,
            tax,
            in_holiday,
        }
    }
}
