use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use project_finance_core::config::ScenarioConfig;
use project_finance_core::coverage::{evaluate_coverage, CoverageInput};
use project_finance_core::pipeline::evaluate_project;

use crate::input;

/// Arguments for LLCR / PLCR evaluation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CoverageArgs {
    /// Path to a JSON or YAML file: either aligned series
    /// (`cfads_series`, `debt_outstanding`) or a full scenario
    #[arg(long)]
    pub input: Option<String>,

    /// Discount rate for LLCR / PLCR
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Last period of the loan life (default: last period with debt outstanding)
    #[arg(long)]
    pub maturity: Option<u32>,
}

/// Evaluate coverage on explicit series, or on a scenario run end to end.
pub fn run_coverage(args: CoverageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let value = input::read_value(args.input.as_deref(), "coverage evaluation")?;

    if value.get("cfads_series").is_some() {
        let mut cov_input: CoverageInput = serde_json::from_value(value)?;
        if let Some(r) = args.discount_rate {
            cov_input.covenants.discount_rate = r;
        }
        if args.maturity.is_some() {
            cov_input.loan_maturity_period = args.maturity;
        }
        let result = evaluate_coverage(&cov_input)?;
        return Ok(serde_json::to_value(result)?);
    }

    if args.maturity.is_some() {
        return Err("--maturity applies to series input only".into());
    }

    let mut config = ScenarioConfig::from_json_value(value)?;
    if let Some(r) = args.discount_rate {
        config.metrics.discount_rate = Some(r);
    }
    let evaluation = evaluate_project(&config)?;
    let Some(coverage) = evaluation.result.coverage.as_ref() else {
        return Err("scenario has no financing_terms; nothing to cover".into());
    };

    let mut output = serde_json::to_value(&evaluation)?;
    output["result"] = serde_json::to_value(coverage)?;
    Ok(output)
}
