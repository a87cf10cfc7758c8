use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::covenants::{check_covenant, CovenantCheck, CoverageCovenants};
use crate::error::ProjectFinanceError;
use crate::time_value::npv;
use crate::types::{ratio_min_avg, with_metadata, ComputationOutput, Money, Multiple, PeriodRatio, Rate};
use crate::ProjectFinanceResult;

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Timeline-aligned CFADS and opening debt balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageInput {
    pub cfads_series: Vec<Money>,
    pub debt_outstanding: Vec<Money>,
    #[serde(default)]
    pub covenants: CoverageCovenants,
    /// Last period of the loan life. Derived from `debt_outstanding` when
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_maturity_period: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub llcr_series: Vec<PeriodRatio>,
    pub llcr_min: Multiple,
    pub llcr_avg: Multiple,
    pub plcr_series: Vec<PeriodRatio>,
    pub plcr_min: Multiple,
    pub plcr_avg: Multiple,
    pub discount_rate: Rate,
    pub loan_maturity_period: Option<u32>,
    pub llcr_covenant: CovenantCheck,
    pub plcr_covenant: CovenantCheck,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// LLCR and PLCR for every period with a positive opening balance.
///
/// Numerators are the PV at `discount_rate` of CFADS from period t onward
/// (period t itself undiscounted): to loan maturity for LLCR, to the end of
/// the series for PLCR. Maturity is the last period with a positive balance.
pub fn compute_llcr_plcr(
    cfads_series: &[Money],
    debt_outstanding: &[Money],
    discount_rate: Rate,
) -> ProjectFinanceResult<(Vec<PeriodRatio>, Vec<PeriodRatio>)> {
    coverage_ratios(cfads_series, debt_outstanding, discount_rate, None)
}

/// As [`compute_llcr_plcr`] with an explicit loan maturity period.
pub fn coverage_ratios(
    cfads_series: &[Money],
    debt_outstanding: &[Money],
    discount_rate: Rate,
    loan_maturity: Option<usize>,
) -> ProjectFinanceResult<(Vec<PeriodRatio>, Vec<PeriodRatio>)> {
    let mut llcr = Vec::new();
    let mut plcr = Vec::new();

    let Some(maturity) = loan_maturity.or_else(|| last_outstanding(debt_outstanding)) else {
        return Ok((llcr, plcr));
    };

    for (t, balance) in debt_outstanding.iter().enumerate() {
        if *balance <= Decimal::ZERO {
            continue;
        }

        let project_flows = cfads_series.get(t..).unwrap_or(&[]);
        let pv_project = npv(discount_rate, project_flows)?;
        plcr.push(PeriodRatio {
            period: t as u32,
            value: pv_project / *balance,
        });

        if t <= maturity {
            let loan_end = (maturity + 1).min(cfads_series.len()).max(t);
            let loan_flows = cfads_series.get(t..loan_end).unwrap_or(&[]);
            let pv_loan = npv(discount_rate, loan_flows)?;
            llcr.push(PeriodRatio {
                period: t as u32,
                value: pv_loan / *balance,
            });
        }
    }

    Ok((llcr, plcr))
}

/// LLCR/PLCR series, aggregates and covenant status.
pub fn evaluate_coverage(
    input: &CoverageInput,
) -> ProjectFinanceResult<ComputationOutput<CoverageSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let covenants = &input.covenants;

    if covenants.discount_rate <= Decimal::NEGATIVE_ONE {
        return Err(ProjectFinanceError::invalid(
            "metrics.discount_rate",
            "Discount rate must be greater than -100%",
        ));
    }
    if input.cfads_series.len() != input.debt_outstanding.len() {
        warnings.push(format!(
            "CFADS series ({}) and debt outstanding series ({}) differ in length",
            input.cfads_series.len(),
            input.debt_outstanding.len()
        ));
    }
    if input.cfads_series.iter().any(|c| *c < Decimal::ZERO) {
        warnings.push("Negative CFADS present; PLCR may fall below LLCR".into());
    }

    let maturity = input
        .loan_maturity_period
        .map(|m| m as usize)
        .or_else(|| last_outstanding(&input.debt_outstanding));

    let (llcr_series, plcr_series) = coverage_ratios(
        &input.cfads_series,
        &input.debt_outstanding,
        covenants.discount_rate,
        maturity,
    )?;
    if llcr_series.is_empty() {
        warnings.push("No outstanding debt; coverage ratios are not defined".into());
    }
    if let Some(m) = maturity {
        let after = input
            .debt_outstanding
            .iter()
            .enumerate()
            .filter(|(t, b)| *t > m && **b > Decimal::ZERO)
            .count();
        if after > 0 {
            warnings.push(format!(
                "Balance outstanding in {after} periods after loan maturity (period {m}); \
                 LLCR stops at maturity, PLCR covers those periods"
            ));
        }
    }

    let (llcr_min, llcr_avg) = ratio_min_avg(&llcr_series);
    let (plcr_min, plcr_avg) = ratio_min_avg(&plcr_series);

    let llcr_covenant = check_covenant(
        &llcr_series,
        covenants.llcr_min_covenant,
        covenants.llcr_warn_threshold,
    );
    let plcr_covenant = check_covenant(
        &plcr_series,
        covenants.plcr_min_covenant,
        covenants.plcr_target,
    );

    let output = CoverageSummary {
        llcr_series,
        llcr_min,
        llcr_avg,
        plcr_series,
        plcr_min,
        plcr_avg,
        discount_rate: covenants.discount_rate,
        loan_maturity_period: maturity.map(|m| m as u32),
        llcr_covenant,
        plcr_covenant,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Coverage Evaluator (LLCR/PLCR on discounted forward CFADS)",
        &serde_json::json!({
            "discount_rate": covenants.discount_rate.to_string(),
            "periods": input.debt_outstanding.len(),
            "llcr_min_covenant": covenants.llcr_min_covenant.to_string(),
            "plcr_min_covenant": covenants.plcr_min_covenant.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn last_outstanding(debt_outstanding: &[Money]) -> Option<usize> {
    debt_outstanding.iter().rposition(|b| *b > Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_rate_simple_sums() {
        let cfads = vec![dec!(100), dec!(100), dec!(100), dec!(100)];
        let outstanding = vec![dec!(150), dec!(100), Decimal::ZERO, Decimal::ZERO];
        let (llcr, plcr) = compute_llcr_plcr(&cfads, &outstanding, Decimal::ZERO).unwrap();

        // Maturity is period 1
        assert_eq!(llcr.len(), 2);
        assert_eq!(llcr[0].value, dec!(200) / dec!(150));
        assert_eq!(llcr[1].value, Decimal::ONE);
        assert_eq!(plcr[0].value, dec!(400) / dec!(150));
        assert_eq!(plcr[1].value, dec!(3));
    }

    #[test]
    fn test_first_period_undiscounted() {
        let cfads = vec![dec!(110), dec!(110)];
        let outstanding = vec![dec!(100), dec!(50)];
        let (llcr, _) = compute_llcr_plcr(&cfads, &outstanding, dec!(0.10)).unwrap();
        assert_eq!(llcr[0].value, dec!(2.1));
        assert_eq!(llcr[1].value, dec!(2.2));
    }

    #[test]
    fn test_plcr_at_least_llcr() {
        let cfads = vec![dec!(10); 12];
        let mut outstanding: Vec<Decimal> = (0..8).map(|i| dec!(80) - Decimal::from(i * 10)).collect();
        outstanding.extend(vec![Decimal::ZERO; 4]);
        let (llcr, plcr) = compute_llcr_plcr(&cfads, &outstanding, dec!(0.08)).unwrap();
        for (l, p) in llcr.iter().zip(&plcr) {
            assert_eq!(l.period, p.period);
            assert!(p.value >= l.value);
        }
    }

    #[test]
    fn test_no_debt_empty_series() {
        let input = CoverageInput {
            cfads_series: vec![dec!(10); 5],
            debt_outstanding: vec![Decimal::ZERO; 5],
            covenants: CoverageCovenants::default(),
            loan_maturity_period: None,
        };
        let out = evaluate_coverage(&input).unwrap();
        assert!(out.result.llcr_series.is_empty());
        assert_eq!(out.result.llcr_min, Decimal::ZERO);
        assert_eq!(out.result.loan_maturity_period, None);
    }

    #[test]
    fn test_explicit_maturity_limits_llcr() {
        let cfads = vec![dec!(10); 4];
        let outstanding = vec![dec!(10); 4];
        let (llcr, plcr) = coverage_ratios(&cfads, &outstanding, Decimal::ZERO, Some(1)).unwrap();
        assert_eq!(llcr.len(), 2);
        assert_eq!(llcr[0].value, dec!(2));
        assert_eq!(plcr.len(), 4);
        assert_eq!(plcr[0].value, dec!(4));
    }
}
