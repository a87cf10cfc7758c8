use clap::Args;
use serde_json::Value;

use project_finance_core::cashflow::build_annual_rows;

use super::ScenarioArgs;

/// Arguments for the annual CFADS waterfall
#[derive(Args)]
pub struct CfadsArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,
}

/// Build the pre-shield CFADS rows for a scenario.
pub fn run_cfads(args: CfadsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = args.scenario.load("CFADS")?;
    let resolved = config.resolve();

    let mut output = build_annual_rows(&resolved.cfads)?;
    let mut warnings = resolved.warnings;
    warnings.append(&mut output.warnings);
    output.warnings = warnings;

    Ok(serde_json::to_value(output)?)
}
