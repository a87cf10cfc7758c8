use clap::Args;
use serde_json::Value;

use project_finance_core::cashflow::build_annual_rows;
use project_finance_core::debt::plan_debt;

use super::ScenarioArgs;

/// Arguments for debt sizing, construction drawdown and repayment
#[derive(Args)]
pub struct DebtArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,
}

/// Plan the debt on the scenario's pre-shield CFADS.
pub fn run_debt(args: DebtArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = args.scenario.load("debt planning")?;
    let resolved = config.resolve();
    let Some(debt_input) = resolved.debt else {
        return Err("financing_terms section required for debt planning".into());
    };

    let cfads = build_annual_rows(&resolved.cfads)?;
    let mut output = plan_debt(&cfads.result.rows, &debt_input)?;

    let mut warnings = resolved.warnings;
    warnings.extend(cfads.warnings);
    warnings.append(&mut output.warnings);
    output.warnings = warnings;

    Ok(serde_json::to_value(output)?)
}
