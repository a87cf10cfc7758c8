use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::time_value::growth_factor;
use crate::types::Rate;

pub const HOURS_PER_YEAR: Decimal = dec!(8760);
const KW_PER_MW: Decimal = dec!(1000);

/// Physical description of the plant. Immutable for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectProfile {
    /// Installed capacity in MW
    pub capacity_mw: Decimal,
    /// Year-1 capacity factor (decimal, e.g. 0.40)
    pub capacity_factor: Rate,
    /// Annual output degradation, compounding from the start of operations
    pub degradation_pct_per_year: Rate,
    /// Losses between generation and the offtake meter
    pub grid_loss_pct: Rate,
    /// Operating life in years
    pub life_years: u32,
}

/// Energy produced in one operating year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyYield {
    pub gross_kwh: Decimal,
    pub grid_loss_kwh: Decimal,
    pub net_kwh: Decimal,
}

impl EnergyYield {
    pub fn zero() -> Self {
        EnergyYield {
            gross_kwh: Decimal::ZERO,
            grid_loss_kwh: Decimal::ZERO,
            net_kwh: Decimal::ZERO,
        }
    }
}

impl ProjectProfile {
    /// Energy for 0-based operating year `t`:
    /// gross = MW × 1000 × 8760 × CF × (1 − degradation)^t,
    /// net = gross × (1 − grid loss).
    ///
    /// Negative inputs are treated as zero; degradation and grid loss are
    /// capped at 100%.
    pub fn energy_yield(&self, t: u32) -> EnergyYield {
        let capacity = self.capacity_mw.max(Decimal::ZERO);
        let cf = self.capacity_factor.max(Decimal::ZERO);
        let degradation = clamp_unit(self.degradation_pct_per_year);
        let grid_loss = clamp_unit(self.grid_loss_pct);

        let degradation_factor = growth_factor(-degradation, t);
        let gross_kwh = capacity * KW_PER_MW * HOURS_PER_YEAR * cf * degradation_factor;
        let grid_loss_kwh = gross_kwh * grid_loss;

        EnergyYield {
            gross_kwh,
            grid_loss_kwh,
            net_kwh: gross_kwh - grid_loss_kwh,
        }
    }
}

fn clamp_unit(value: Rate) -> Rate {
    value.max(Decimal::ZERO).min(Decimal::ONE)
}
