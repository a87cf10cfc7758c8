use clap::Args;
use serde_json::Value;

use project_finance_core::pipeline::evaluate_project;

use super::ScenarioArgs;

/// Arguments for the full CFADS, debt and coverage evaluation
#[derive(Args)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = args.scenario.load("scenario evaluation")?;
    let result = evaluate_project(&config)?;
    Ok(serde_json::to_value(result)?)
}
