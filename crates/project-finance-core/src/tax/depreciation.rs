use rust_decimal::Decimal;

use crate::types::Money;

/// Straight-line capital allowance schedule over `years`.
///
/// `multiplier` scales the allowance (1.5 = 150% enhanced capital
/// allowance). When `enhanced_years` is given only the first N years are
/// scaled; otherwise every depreciation year is.
pub fn depreciation_schedule(
    capex: Money,
    years: u32,
    multiplier: Decimal,
    enhanced_years: Option<u32>,
) -> Vec<Money> {
    depreciation_over_horizon(capex, years, multiplier, enhanced_years, years)
}

/// The first `horizon` years of [`depreciation_schedule`]. The allowance
/// is still spread over the full `years`.
pub fn depreciation_over_horizon(
    capex: Money,
    years: u32,
    multiplier: Decimal,
    enhanced_years: Option<u32>,
    horizon: u32,
) -> Vec<Money> {
    if years == 0 || capex <= Decimal::ZERO {
        return Vec::new();
    }

    let multiplier = multiplier.max(Decimal::ZERO);
    let annual = capex / Decimal::from(years);

    (0..years.min(horizon))
        .map(|i| match enhanced_years {
            Some(n) if i >= n => annual,
            _ => annual * multiplier,
        })
        .collect()
}
