use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::amortization::{amortize, OpeningTranche, RepaymentWindow, TranchePeriod};
use super::audit::{
    assess_balloon, audit_status, dscr_series, dscr_violations, validate_terms, AuditStatus,
    BalloonAssessment, DscrViolation,
};
use super::construction::{draw_construction, ConstructionPeriod};
use super::sizing::solve_mix;
use super::terms::{AmortizationStyle, DebtPlanInput};
use crate::cashflow::{operating_cfads, AnnualCashflowRow};
use crate::error::ProjectFinanceError;
use crate::types::{
    ratio_min_avg, with_metadata, ComputationOutput, Money, Multiple, PeriodRatio, Rate,
    TrancheCurrency, MAX_TIMELINE_PERIODS,
};
use crate::ProjectFinanceResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One currency tranche across the whole timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtTranche {
    pub currency: TrancheCurrency,
    pub share: Rate,
    pub nominal_rate: Rate,
    pub drawn_principal: Money,
    pub idc_capitalized: Money,
    /// drawn_principal + idc_capitalized
    pub principal: Money,
    /// Opening balance per timeline period
    pub outstanding_balance_series: Vec<Money>,
    /// Debt service per timeline period (zero during construction)
    pub service_series: Vec<Money>,
    /// Operating-period repayment schedule
    pub schedule: Vec<TranchePeriod>,
    pub balloon: Money,
}

/// Headline figures for one currency.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrancheSummary {
    pub principal: Money,
    pub idc: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtPlanResult {
    /// construction_years + operating periods
    pub timeline_periods: u32,
    pub construction_years: u32,
    pub operating_periods: u32,
    /// Tenor actually applied (clipped to the operating horizon)
    pub tenor_years: u32,
    /// Interest-only periods at the start of operations
    pub grace_periods: u32,
    pub amortization_style: AmortizationStyle,
    pub total_debt: Money,
    pub total_drawn: Money,
    pub total_idc: Money,
    /// Opening balance per timeline period, all tranches
    pub debt_outstanding: Vec<Money>,
    pub debt_service_total: Vec<Money>,
    /// Interest per operating period, all tranches
    pub interest_expense_series: Vec<Money>,
    pub dscr_series: Vec<PeriodRatio>,
    pub dscr_min: Multiple,
    pub dscr_avg: Multiple,
    pub audit_dscr_threshold: Multiple,
    pub audit_status: AuditStatus,
    pub lkr: TrancheSummary,
    pub usd: TrancheSummary,
    pub dfi: TrancheSummary,
    pub tranches: Vec<DebtTranche>,
    pub idc_schedule: Vec<ConstructionPeriod>,
    /// Balance left after the final timeline period
    pub balloon_remaining: Money,
    pub balloon: BalloonAssessment,
    pub validation_warnings: Vec<String>,
    pub dscr_violations: Vec<DscrViolation>,
}

impl DebtPlanResult {
    pub fn tranche(&self, currency: TrancheCurrency) -> Option<&DebtTranche> {
        self.tranches.iter().find(|t| t.currency == currency)
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Plan the debt structure against the operating CFADS in `annual_rows`.
///
/// The debt timeline is the construction periods followed by one period per
/// operating row; pre-operation rows in the CFADS series are ignored.
pub fn plan_debt(
    annual_rows: &[AnnualCashflowRow],
    input: &DebtPlanInput,
) -> ProjectFinanceResult<ComputationOutput<DebtPlanResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let terms = &input.terms;

    let capex = input.capex_usd_total.ok_or_else(|| {
        ProjectFinanceError::invalid("capex.usd_total", "Required to size the debt")
    })?;
    let capex = if capex < Decimal::ZERO {
        warnings.push(format!("capex.usd_total {capex} is negative; treated as zero"));
        Decimal::ZERO
    } else {
        capex
    };

    let cfads = operating_cfads(annual_rows);
    if cfads.is_empty() {
        return Err(ProjectFinanceError::InsufficientData(
            "CFADS series has no operating periods".into(),
        ));
    }
    let operating_periods = cfads.len() as u32;
    let construction_years = terms.construction_periods;
    let timeline_periods = match construction_years.checked_add(operating_periods) {
        Some(n) if n <= MAX_TIMELINE_PERIODS => n,
        _ => {
            return Err(ProjectFinanceError::invalid(
                "financing_terms.construction_periods",
                format!(
                    "{construction_years} construction plus {operating_periods} operating periods \
                     exceed the {MAX_TIMELINE_PERIODS}-period limit"
                ),
            ))
        }
    };

    let validation_warnings = validate_terms(terms);

    // --- Sizing ---
    let debt_ratio = terms.debt_ratio.max(Decimal::ZERO).min(Decimal::ONE);
    if debt_ratio != terms.debt_ratio {
        warnings.push(format!(
            "debt_ratio {} clamped to {debt_ratio}",
            terms.debt_ratio
        ));
    }
    let total_debt = capex * debt_ratio;
    let allocations = solve_mix(total_debt, &terms.mix, &mut warnings);

    // --- Construction draws and IDC ---
    let construction = draw_construction(&allocations, terms, &terms.rates, &mut warnings)?;

    // --- Repayment window ---
    let tenor = if terms.tenor_years > operating_periods {
        warnings.push(format!(
            "tenor_years {} exceeds the {operating_periods} operating periods; clipped",
            terms.tenor_years
        ));
        operating_periods
    } else {
        terms.tenor_years
    };
    let interest_only = terms.interest_only_periods().min(tenor);
    let window = RepaymentWindow {
        interest_only,
        amortizing: tenor - interest_only,
    };
    if total_debt > Decimal::ZERO && window.amortizing == 0 {
        warnings.push("No amortizing periods inside the tenor; the full principal is a balloon".into());
    }

    let opening: Vec<OpeningTranche> = construction
        .tranches
        .iter()
        .map(|t| OpeningTranche {
            principal: t.principal(),
            rate: t.nominal_rate,
        })
        .collect();
    let schedules = amortize(
        terms.amortization_style,
        &opening,
        &cfads,
        window,
        terms.target_dscr,
        construction_years,
    )?;

    // --- Timeline assembly ---
    let t_len = timeline_periods as usize;

    let mut tranches: Vec<DebtTranche> = Vec::with_capacity(construction.tranches.len());
    for (built, schedule) in construction.tranches.iter().zip(schedules) {
        let mut outstanding = Vec::with_capacity(t_len);
        let mut service = Vec::with_capacity(t_len);
        for b in &built.opening_balances {
            outstanding.push(*b);
            service.push(Decimal::ZERO);
        }
        // With no construction periods the close-of-financing draw is the
        // first operating opening balance.
        for p in &schedule {
            outstanding.push(p.opening_balance);
            service.push(p.service);
        }
        let balloon = schedule
            .last()
            .map(|p| p.closing_balance)
            .unwrap_or_else(|| built.principal());

        tranches.push(DebtTranche {
            currency: built.currency,
            share: built.share,
            nominal_rate: built.nominal_rate,
            drawn_principal: built.drawn,
            idc_capitalized: built.idc_capitalized,
            principal: built.principal(),
            outstanding_balance_series: outstanding,
            service_series: service,
            schedule,
            balloon,
        });
    }

    let debt_outstanding = sum_series(tranches.iter().map(|t| &t.outstanding_balance_series), t_len);
    let debt_service_total = sum_series(tranches.iter().map(|t| &t.service_series), t_len);
    let interest_expense_series: Vec<Money> = (0..operating_periods as usize)
        .map(|k| tranches.iter().map(|t| t.schedule[k].interest).sum())
        .collect();

    // --- DSCR and audit ---
    let mut cfads_timeline = vec![Decimal::ZERO; construction_years as usize];
    cfads_timeline.extend_from_slice(&cfads);
    let dscr = dscr_series(&cfads_timeline, &debt_service_total);
    let (dscr_min, dscr_avg) = ratio_min_avg(&dscr);
    if dscr.is_empty() {
        warnings.push("No period carries debt service; DSCR series is empty".into());
    }

    let threshold = terms.audit_dscr_threshold;
    let status = audit_status(dscr_min, threshold);
    let violations = dscr_violations(&dscr, &terms.constraints);

    let principal_total: Money = tranches.iter().map(|t| t.principal).sum();
    let balloon_remaining: Money = tranches.iter().map(|t| t.balloon).sum();
    let balloon = assess_balloon(
        balloon_remaining,
        principal_total,
        &terms.constraints,
        &terms.refinancing,
    );

    let summary = |c: TrancheCurrency| {
        tranches
            .iter()
            .find(|t| t.currency == c)
            .map(|t| TrancheSummary {
                principal: t.principal,
                idc: t.idc_capitalized,
            })
            .unwrap_or_default()
    };
    let (lkr, usd, dfi) = (
        summary(TrancheCurrency::Lkr),
        summary(TrancheCurrency::Usd),
        summary(TrancheCurrency::Dfi),
    );

    let output = DebtPlanResult {
        timeline_periods,
        construction_years,
        operating_periods,
        tenor_years: tenor,
        grace_periods: interest_only,
        amortization_style: terms.amortization_style,
        total_debt,
        total_drawn: construction.total_drawn,
        total_idc: construction.total_idc,
        debt_outstanding,
        debt_service_total,
        interest_expense_series,
        dscr_series: dscr,
        dscr_min,
        dscr_avg,
        audit_dscr_threshold: threshold,
        audit_status: status,
        lkr,
        usd,
        dfi,
        tranches,
        idc_schedule: construction.idc_schedule,
        balloon_remaining,
        balloon,
        validation_warnings,
        dscr_violations: violations,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &format!(
            "Debt Planner (tranche mix, construction IDC, {:?} amortization)",
            terms.amortization_style
        ),
        &serde_json::json!({
            "capex_usd_total": capex.to_string(),
            "debt_ratio": debt_ratio.to_string(),
            "tenor_years": terms.tenor_years,
            "construction_periods": construction_years,
            "interest_only_periods": interest_only,
            "target_dscr": terms.target_dscr.to_string(),
            "audit_dscr_threshold": threshold.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sum_series<'a>(series: impl Iterator<Item = &'a Vec<Money>>, len: usize) -> Vec<Money> {
    let mut total = vec![Decimal::ZERO; len];
    for s in series {
        for (acc, v) in total.iter_mut().zip(s) {
            *acc += *v;
        }
    }
    total
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
