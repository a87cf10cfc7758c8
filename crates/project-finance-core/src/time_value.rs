use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ProjectFinanceError;
use crate::types::{Money, Rate};
use crate::ProjectFinanceResult;

/// Net Present Value of a series of cash flows. The first flow is at t=0 and
/// is not discounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> ProjectFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(ProjectFinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(ProjectFinanceError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// (1 + rate)^periods by repeated multiplication.
pub fn growth_factor(rate: Rate, periods: u32) -> Decimal {
    let one_plus_r = Decimal::ONE + rate;
    let mut factor = Decimal::ONE;
    for _ in 0..periods {
        factor *= one_plus_r;
    }
    factor
}

/// Level payment that fully repays `principal` over `nper` periods at `rate`
/// (Excel PMT with the sign flipped so the payment is positive).
pub fn annuity_payment(rate: Rate, nper: u32, principal: Money) -> ProjectFinanceResult<Money> {
    if nper == 0 {
        return Err(ProjectFinanceError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let factor = growth_factor(rate, nper);
    let annuity_factor = factor - Decimal::ONE;

    if annuity_factor.is_zero() {
        return Err(ProjectFinanceError::DivisionByZero {
            context: "annuity payment factor".into(),
        });
    }

    Ok(principal * rate * factor / annuity_factor)
}
