use project_finance_core::config::ScenarioConfig;
use project_finance_core::debt::AuditStatus;
use project_finance_core::pipeline::evaluate_project;
use project_finance_core::ProjectFinanceError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

// ===========================================================================
// End-to-end scenario evaluation
// ===========================================================================

fn scenario() -> Value {
    json!({
        "project": {
            "capacity_mw": 150,
            "capacity_factor": 0.40,
            "degradation": 0.005,
            "grid_loss_pct": 0.02,
            "life_years": 20
        },
        "tariff": { "local_per_kwh": 20.3 },
        "opex": { "usd_per_year": 3000000 },
        "statutory": {
            "success_fee_pct": 0.02,
            "env_surcharge_pct": 0.0025,
            "social_levy_pct": 0.0025
        },
        "tax": {
            "corporate_tax_rate": 0.30,
            "depreciation_years": 15,
            "tax_holiday_years": 0,
            "tax_holiday_start_year": 1,
            "enhanced_capital_allowance_pct": 1.0
        },
        "risk": { "haircut_pct": 0.0 },
        "fx": { "start_rate": 300, "annual_depr": 0.03 },
        "capex": { "usd_total": 150000000 },
        "financing_terms": {
            "debt_ratio": 0.70,
            "tenor_years": 15,
            "construction_periods": 2,
            "construction_schedule": [40, 60],
            "debt_drawdown_pct": [1.0, 1.0],
            "grace_years": 1,
            "amortization_style": "sculpted",
            "target_dscr": 1.30,
            "mix": { "lkr_max": 0.45, "dfi_max": 0.10, "usd_commercial_min": 0.45 },
            "rates": { "lkr_nominal": 0.12, "usd_nominal": 0.08, "dfi_nominal": 0.065 }
        },
        "metrics": { "discount_rate": 0.10 }
    })
}

fn evaluate(value: Value) -> project_finance_core::ComputationOutput<project_finance_core::pipeline::ProjectEvaluation> {
    let cfg = ScenarioConfig::from_json_value(value).unwrap();
    evaluate_project(&cfg).unwrap()
}

#[test]
fn test_timeline_alignment() {
    let out = evaluate(scenario());
    let e = &out.result;
    let debt = e.debt.as_ref().unwrap();

    assert_eq!(e.pre_shield.rows.len(), 20);
    assert_eq!(debt.timeline_periods, 22);
    assert_eq!(e.cfads_timeline.len(), 22);
    assert_eq!(debt.debt_outstanding.len(), 22);
    assert_eq!(e.cfads_timeline[0], Decimal::ZERO);
    assert_eq!(e.cfads_timeline[2], e.pre_shield.rows[0].cfads_usd);
}

#[test]
fn test_coverage_consistent_with_debt() {
    let out = evaluate(scenario());
    let e = &out.result;
    let coverage = e.coverage.as_ref().unwrap();

    assert!(!coverage.llcr_series.is_empty());
    for (l, p) in coverage.llcr_series.iter().zip(&coverage.plcr_series) {
        assert!(p.value >= l.value);
    }
}

#[test]
fn test_llcr_horizon_ends_at_tenor() {
    let mut v = scenario();
    v["financing_terms"]["tenor_years"] = json!(10);
    let out = evaluate(v);
    let e = &out.result;
    let debt = e.debt.as_ref().unwrap();
    let coverage = e.coverage.as_ref().unwrap();

    assert_eq!(debt.tenor_years, 10);
    assert_eq!(coverage.loan_maturity_period, Some(11));
    assert!(coverage.llcr_series.iter().all(|r| r.period <= 11));
    assert!(!coverage.llcr_series.is_empty());
    // CFADS keeps flowing for nine years after the tenor
    for (l, p) in coverage.llcr_series.iter().zip(&coverage.plcr_series) {
        assert_eq!(l.period, p.period);
        assert!(p.value > l.value, "period {}", l.period);
    }
}

#[test]
fn test_zero_amortizing_window_keeps_llcr_to_tenor() {
    let mut v = scenario();
    v["financing_terms"]["tenor_years"] = json!(5);
    v["financing_terms"]["grace_years"] = json!(5);
    let out = evaluate(v);
    let e = &out.result;
    let debt = e.debt.as_ref().unwrap();
    let coverage = e.coverage.as_ref().unwrap();

    assert!(debt.balloon_remaining > Decimal::ZERO);
    assert_eq!(coverage.loan_maturity_period, Some(6));
    assert_eq!(coverage.llcr_series.last().map(|r| r.period), Some(6));
    assert!(coverage.plcr_series.len() > coverage.llcr_series.len());
    assert!(out.warnings.iter().any(|w| w.contains("after loan maturity")));
}

#[test]
fn test_audit_status_follows_dscr_min() {
    let out = evaluate(scenario());
    let debt = out.result.debt.unwrap();
    let expected = if debt.dscr_min >= dec!(1.30) {
        AuditStatus::Pass
    } else {
        AuditStatus::Review
    };
    assert_eq!(debt.audit_status, expected);
}

#[test]
fn test_interest_shield_second_pass() {
    let mut v = scenario();
    v["tax"]["interest_deductible"] = json!(true);
    let out = evaluate(v);
    let e = &out.result;
    let post = e.post_shield.as_ref().unwrap();

    assert!(post.total_cfads_usd >= e.pre_shield.total_cfads_usd);
    assert_eq!(e.cfads_timeline[2], post.rows[0].cfads_usd);
    // Debt is planned once, on the pre-shield series
    let debt = e.debt.as_ref().unwrap();
    assert_eq!(
        post.rows[0].interest_expense_usd,
        debt.interest_expense_series[0]
    );
}

#[test]
fn test_data_quality_warnings_not_errors() {
    let mut v = scenario();
    v["opex"]["usd_per_year"] = json!("unknown");
    v.as_object_mut().unwrap().remove("fx");
    let out = evaluate(v);
    assert!(out.warnings.iter().any(|w| w.contains("opex.usd_per_year")));
    assert!(out.warnings.iter().any(|w| w.contains("fx mapping missing")));
}

#[test]
fn test_missing_capex_is_structural() {
    let mut v = scenario();
    v.as_object_mut().unwrap().remove("capex");
    let cfg = ScenarioConfig::from_json_value(v).unwrap();
    match evaluate_project(&cfg) {
        Err(ProjectFinanceError::InvalidInput { field, .. }) => assert_eq!(field, "capex.usd_total"),
        other => panic!("Expected InvalidInput, got: {other:?}"),
    }
}

#[test]
fn test_schedule_mismatch_is_structural() {
    let mut v = scenario();
    v["financing_terms"]["construction_schedule"] = json!([100]);
    let cfg = ScenarioConfig::from_json_value(v).unwrap();
    assert!(evaluate_project(&cfg).is_err());
}

#[test]
fn test_zero_debt_scenario() {
    let mut v = scenario();
    v["financing_terms"]["debt_ratio"] = json!(0);
    let out = evaluate(v);
    let e = &out.result;
    let debt = e.debt.as_ref().unwrap();
    assert!(debt.dscr_series.is_empty());
    assert!(e.coverage.as_ref().unwrap().llcr_series.is_empty());
}
