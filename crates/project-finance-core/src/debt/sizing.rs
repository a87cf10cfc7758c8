use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::terms::MixCaps;
use crate::types::{Money, Rate, TrancheCurrency};

/// Principal assigned to one currency tranche at sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrancheAllocation {
    pub currency: TrancheCurrency,
    pub amount: Money,
    /// amount / total debt (zero when there is no debt)
    pub share: Rate,
}

/// Split `total_debt` across the LKR, DFI and USD tranches.
///
/// LKR takes up to its cap, DFI up to its cap from what is left, USD absorbs
/// the residual. If USD then sits below its floor the shortfall is pulled
/// back from LKR first, then DFI.
pub fn solve_mix(total_debt: Money, caps: &MixCaps, warnings: &mut Vec<String>) -> Vec<TrancheAllocation> {
    let debt = total_debt.max(Decimal::ZERO);
    let lkr_max = clamp_unit(caps.lkr_max);
    let dfi_max = clamp_unit(caps.dfi_max);
    let usd_min = clamp_unit(caps.usd_commercial_min);

    let mut lkr = (debt * lkr_max).min(debt);
    let mut dfi = (debt * dfi_max).min((debt - lkr).max(Decimal::ZERO));
    let mut usd = (debt - lkr - dfi).max(Decimal::ZERO);

    let floor = debt * usd_min;
    if usd < floor {
        let mut shortfall = floor - usd;
        warnings.push(format!(
            "USD tranche below usd_commercial_min {usd_min}; moving {shortfall} from LKR/DFI"
        ));

        let from_lkr = shortfall.min(lkr);
        lkr -= from_lkr;
        usd += from_lkr;
        shortfall -= from_lkr;

        let from_dfi = shortfall.min(dfi);
        dfi -= from_dfi;
        usd += from_dfi;
    }

    [
        (TrancheCurrency::Lkr, lkr),
        (TrancheCurrency::Usd, usd),
        (TrancheCurrency::Dfi, dfi),
    ]
    .into_iter()
    .map(|(currency, amount)| TrancheAllocation {
        currency,
        amount,
        share: if debt.is_zero() {
            Decimal::ZERO
        } else {
            amount / debt
        },
    })
    .collect()
}

fn clamp_unit(value: Rate) -> Rate {
    value.max(Decimal::ZERO).min(Decimal::ONE)
}
