use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::cashflow::{build_annual_rows, build_annual_rows_with_interest, CfadsOutput};
use crate::config::ScenarioConfig;
use crate::coverage::{evaluate_coverage, CoverageInput, CoverageSummary};
use crate::debt::{plan_debt, DebtPlanResult};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ProjectFinanceResult;

/// Everything one scenario evaluation produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEvaluation {
    /// CFADS without the interest tax shield; debt is sized on this
    pub pre_shield: CfadsOutput,
    /// CFADS recomputed with realised interest when interest is deductible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_shield: Option<CfadsOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt: Option<DebtPlanResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CoverageSummary>,
    /// CFADS on the debt timeline (construction periods at zero) used for
    /// coverage
    pub cfads_timeline: Vec<Money>,
}

/// Evaluate a scenario end to end.
///
/// Pass 1 builds CFADS with no interest shield and the debt is planned on
/// it. If `tax.interest_deductible` is set, pass 2 rebuilds CFADS with the
/// planned interest; coverage then uses the pass-2 series. The debt plan is
/// not re-run on pass-2 CFADS.
pub fn evaluate_project(
    config: &ScenarioConfig,
) -> ProjectFinanceResult<ComputationOutput<ProjectEvaluation>> {
    let start = Instant::now();
    let resolved = config.resolve();
    let mut warnings = resolved.warnings;

    let pass1 = build_annual_rows(&resolved.cfads)?;
    collect(&mut warnings, "cfads", pass1.warnings);
    let pre_shield = pass1.result;

    let Some(debt_input) = resolved.debt else {
        warnings.push("financing_terms missing; debt planning and coverage skipped".into());
        let cfads_timeline = pre_shield.operating_cfads();
        let evaluation = ProjectEvaluation {
            pre_shield,
            post_shield: None,
            debt: None,
            coverage: None,
            cfads_timeline,
        };
        return Ok(finish(start, config, warnings, evaluation));
    };

    let debt_out = plan_debt(&pre_shield.rows, &debt_input)?;
    collect(&mut warnings, "debt", debt_out.warnings);
    let debt = debt_out.result;

    let post_shield = if resolved.cfads.tax.interest_deductible {
        let pass2 = build_annual_rows_with_interest(&resolved.cfads, &debt.interest_expense_series)?;
        collect(&mut warnings, "cfads (interest shield)", pass2.warnings);
        Some(pass2.result)
    } else {
        None
    };

    let final_cfads = post_shield
        .as_ref()
        .unwrap_or(&pre_shield)
        .operating_cfads();
    let mut cfads_timeline = vec![Decimal::ZERO; debt.construction_years as usize];
    cfads_timeline.extend(final_cfads);

    // Last repayment period on the timeline; a balloon left after it must
    // not stretch the LLCR horizon.
    let loan_maturity_period =
        (debt.tenor_years > 0).then(|| debt.construction_years + debt.tenor_years - 1);

    let coverage_out = evaluate_coverage(&CoverageInput {
        cfads_series: cfads_timeline.clone(),
        debt_outstanding: debt.debt_outstanding.clone(),
        covenants: resolved.covenants,
        loan_maturity_period,
    })?;
    collect(&mut warnings, "coverage", coverage_out.warnings);

    let evaluation = ProjectEvaluation {
        pre_shield,
        post_shield,
        debt: Some(debt),
        coverage: Some(coverage_out.result),
        cfads_timeline,
    };
    Ok(finish(start, config, warnings, evaluation))
}

fn collect(warnings: &mut Vec<String>, stage: &str, stage_warnings: Vec<String>) {
    warnings.extend(stage_warnings.into_iter().map(|w| format!("[{stage}] {w}")));
}

fn finish(
    start: Instant,
    config: &ScenarioConfig,
    warnings: Vec<String>,
    evaluation: ProjectEvaluation,
) -> ComputationOutput<ProjectEvaluation> {
    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Two-pass project evaluation (CFADS, Debt Planner, Coverage Evaluator)",
        config,
        warnings,
        elapsed,
        evaluation,
    )
}
