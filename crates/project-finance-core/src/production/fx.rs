use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ProjectFinanceError;
use crate::types::{Money, Rate};
use crate::ProjectFinanceResult;

/// Flat local-per-USD rate used when a scenario carries no FX mapping.
pub const DEFAULT_FX_RATE: Decimal = dec!(375);

/// How the FX curve is specified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FxSpec {
    /// Explicit per-period local-currency-per-USD rates
    Explicit { rates: Vec<Decimal> },
    /// rate(t) = start_rate × (1 + annual_depreciation_pct)^t
    Parametric {
        start_rate: Decimal,
        annual_depreciation_pct: Rate,
    },
}

/// Ordered per-period local-currency-per-USD rates. Every rate is positive
/// and the curve covers at least the periods it was built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxCurve {
    rates: Vec<Decimal>,
}

impl FxCurve {
    pub fn flat(rate: Decimal, periods: usize) -> ProjectFinanceResult<Self> {
        Self::generate(rate, Decimal::ZERO, periods)
    }

    /// Depreciating curve: the local currency weakens by `annual_depr` a year.
    pub fn generate(
        start_rate: Decimal,
        annual_depr: Rate,
        periods: usize,
    ) -> ProjectFinanceResult<Self> {
        if start_rate <= Decimal::ZERO {
            return Err(ProjectFinanceError::invalid(
                "fx.start_rate",
                format!("FX start rate must be positive, got {start_rate}"),
            ));
        }
        if annual_depr <= dec!(-1) {
            return Err(ProjectFinanceError::invalid(
                "fx.annual_depr",
                "Annual depreciation must be greater than -100%",
            ));
        }

        let step = Decimal::ONE + annual_depr;
        let mut rates = Vec::with_capacity(periods.max(1));
        let mut current = start_rate;
        for _ in 0..periods.max(1) {
            rates.push(current);
            current *= step;
        }
        Ok(FxCurve { rates })
    }

    /// Build a curve of at least `periods` rates. An explicit list shorter
    /// than the horizon is extended with its last rate.
    pub fn build(
        spec: &FxSpec,
        periods: usize,
        warnings: &mut Vec<String>,
    ) -> ProjectFinanceResult<Self> {
        match spec {
            FxSpec::Parametric {
                start_rate,
                annual_depreciation_pct,
            } => Self::generate(*start_rate, *annual_depreciation_pct, periods),
            FxSpec::Explicit { rates } => {
                if rates.is_empty() {
                    return Err(ProjectFinanceError::invalid(
                        "fx.curve",
                        "Explicit FX curve is empty",
                    ));
                }
                if let Some((i, r)) = rates.iter().enumerate().find(|(_, r)| **r <= Decimal::ZERO)
                {
                    return Err(ProjectFinanceError::invalid(
                        "fx.curve",
                        format!("FX rate at period {i} must be positive, got {r}"),
                    ));
                }
                let mut curve = rates.clone();
                if curve.len() < periods {
                    let last = curve[curve.len() - 1];
                    warnings.push(format!(
                        "FX curve has {} rates for {periods} periods; extending with last rate {last}",
                        curve.len()
                    ));
                    curve.resize(periods, last);
                }
                Ok(FxCurve { rates: curve })
            }
        }
    }

    pub fn rates(&self) -> &[Decimal] {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Rate for period `t`, holding the last rate beyond the end of the curve.
    pub fn rate(&self, t: usize) -> Decimal {
        self.rates
            .get(t)
            .or_else(|| self.rates.last())
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Convert a local-currency amount at period `t`. A zero rate converts to
    /// zero rather than dividing.
    pub fn to_usd(&self, t: usize, local: Money) -> Money {
        let rate = self.rate(t);
        if rate.is_zero() {
            Decimal::ZERO
        } else {
            local / rate
        }
    }
}
