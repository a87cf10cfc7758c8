pub mod cashflow;
pub mod coverage;
pub mod debt;
pub mod evaluate;

use clap::Args;
use rust_decimal::Decimal;

use project_finance_core::config::ScenarioConfig;

use crate::input;

/// Scenario file plus the overrides most often flexed from the command line
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScenarioArgs {
    /// Path to a JSON or YAML scenario file (stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Tariff in local currency per kWh
    #[arg(long)]
    pub tariff: Option<Decimal>,

    /// Lender haircut on CFADS (0.05 = 5%)
    #[arg(long)]
    pub haircut_pct: Option<Decimal>,

    /// Deduct planned interest when computing tax
    #[arg(long)]
    pub interest_deductible: bool,

    /// Debt as a share of capex
    #[arg(long)]
    pub debt_ratio: Option<Decimal>,

    /// Loan tenor in operating years
    #[arg(long)]
    pub tenor_years: Option<u32>,

    /// Target DSCR for sculpted amortization
    #[arg(long, alias = "dscr")]
    pub target_dscr: Option<Decimal>,

    /// Discount rate for LLCR / PLCR
    #[arg(long)]
    pub discount_rate: Option<Decimal>,
}

impl ScenarioArgs {
    /// Read the scenario and apply any command-line overrides.
    pub fn load(&self, what: &str) -> Result<ScenarioConfig, Box<dyn std::error::Error>> {
        let value = input::read_value(self.input.as_deref(), what)?;
        let mut config = ScenarioConfig::from_json_value(value)?;

        if let Some(t) = self.tariff {
            config.tariff.local_per_kwh = Some(t);
        }
        if let Some(h) = self.haircut_pct {
            config.risk.haircut_pct = Some(h);
        }
        if self.interest_deductible {
            config.tax.interest_deductible = Some(true);
        }
        if let Some(r) = self.discount_rate {
            config.metrics.discount_rate = Some(r);
        }

        let financing_override =
            self.debt_ratio.is_some() || self.tenor_years.is_some() || self.target_dscr.is_some();
        if financing_override {
            let Some(terms) = config.financing_terms.as_mut() else {
                return Err("financing overrides given but the scenario has no financing_terms".into());
            };
            if let Some(r) = self.debt_ratio {
                terms.debt_ratio = Some(r);
            }
            if let Some(t) = self.tenor_years {
                terms.tenor_years = Some(t);
            }
            if let Some(d) = self.target_dscr {
                terms.target_dscr = Some(d);
            }
        }

        Ok(config)
    }
}
