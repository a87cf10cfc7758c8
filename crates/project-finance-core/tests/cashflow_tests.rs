use project_finance_core::cashflow::{
    build_annual_rows, build_annual_rows_with_interest, CfadsInput, StatutoryDeductions,
    TariffAndOpex,
};
use project_finance_core::production::{FxSpec, ProjectProfile};
use project_finance_core::tax::TaxPolicy;
use project_finance_core::{PeriodPhase, ProjectFinanceError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// CFADS Builder tests
// ===========================================================================

fn wind_farm() -> CfadsInput {
    // 150 MW at 40%, 20.3 local/kWh, $3m opex, 30% tax, 20-year life
    CfadsInput {
        project: ProjectProfile {
            capacity_mw: dec!(150),
            capacity_factor: dec!(0.40),
            degradation_pct_per_year: Decimal::ZERO,
            grid_loss_pct: Decimal::ZERO,
            life_years: 20,
        },
        tariff_opex: TariffAndOpex {
            tariff_local_per_kwh: dec!(20.3),
            opex_usd_per_year: dec!(3_000_000),
        },
        statutory: StatutoryDeductions::default(),
        tax: TaxPolicy {
            corporate_tax_rate: dec!(0.30),
            depreciation_years: 20,
            tax_holiday_years: 0,
            tax_holiday_start_year: 1,
            enhanced_capital_allowance_multiplier: Decimal::ONE,
            enhanced_allowance_years: None,
            interest_deductible: false,
        },
        fx: FxSpec::Parametric {
            start_rate: dec!(300),
            annual_depreciation_pct: dec!(0.03),
        },
        capex_usd_total: Some(dec!(150_000_000)),
        risk_haircut_pct: Decimal::ZERO,
        pre_operation_periods: 0,
    }
}

fn total_cfads(input: &CfadsInput) -> Decimal {
    build_annual_rows(input).unwrap().result.total_cfads_usd
}

#[test]
fn test_one_row_per_operating_year() {
    let out = build_annual_rows(&wind_farm()).unwrap();
    assert_eq!(out.result.rows.len(), 20);
    assert!(out
        .result
        .rows
        .iter()
        .all(|r| r.phase == PeriodPhase::Operation));
}

#[test]
fn test_year_one_matches_waterfall_formulas() {
    let out = build_annual_rows(&wind_farm()).unwrap();
    let r = &out.result.rows[0];

    let gross = dec!(150) * dec!(1000) * dec!(8760) * dec!(0.40);
    assert_eq!(r.gross_kwh, gross);
    assert_eq!(r.net_kwh, gross);
    assert_eq!(r.revenue_local, gross * dec!(20.3));
    assert_eq!(r.revenue_usd, r.revenue_local / dec!(300));

    let taxable = r.revenue_usd - dec!(3_000_000) - dec!(7_500_000);
    assert_eq!(r.tax_usd, taxable * dec!(0.30));
    assert_eq!(r.cfads_usd, r.revenue_usd - r.opex_usd - r.tax_usd);
}

#[test]
fn test_fx_depreciation_erodes_usd_revenue() {
    let out = build_annual_rows(&wind_farm()).unwrap();
    let rows = &out.result.rows;
    assert_eq!(rows[1].fx_rate, dec!(309));
    assert!(rows[1].revenue_usd < rows[0].revenue_usd);
    assert!(rows[19].cfads_usd < rows[0].cfads_usd);
}

#[test]
fn test_zero_tariff_cfads_not_positive() {
    let mut input = wind_farm();
    input.tariff_opex.tariff_local_per_kwh = Decimal::ZERO;
    let out = build_annual_rows(&input).unwrap();
    assert!(out.result.rows.iter().all(|r| r.cfads_usd <= Decimal::ZERO));
}

#[test]
fn test_zero_capacity_factor_cfads_not_positive() {
    let mut input = wind_farm();
    input.project.capacity_factor = Decimal::ZERO;
    let out = build_annual_rows(&input).unwrap();
    assert!(out.result.max_cfads_usd <= Decimal::ZERO);
}

#[test]
fn test_lower_tax_rate_raises_total_cfads() {
    let taxed = total_cfads(&wind_farm());
    let mut untaxed = wind_farm();
    untaxed.tax.corporate_tax_rate = Decimal::ZERO;
    assert!(total_cfads(&untaxed) >= taxed);
}

#[test]
fn test_tax_holiday_never_lowers_cfads() {
    let base = build_annual_rows(&wind_farm()).unwrap().result;
    let mut holiday = wind_farm();
    holiday.tax.tax_holiday_years = 5;
    holiday.tax.tax_holiday_start_year = 2;
    let with_holiday = build_annual_rows(&holiday).unwrap().result;

    for (h, b) in with_holiday.rows.iter().zip(&base.rows) {
        assert!(h.cfads_usd >= b.cfads_usd);
        let year = h.operating_year.unwrap();
        assert_eq!(h.in_tax_holiday, (2..=6).contains(&year));
        if h.in_tax_holiday {
            assert_eq!(h.tax_usd, Decimal::ZERO);
        } else {
            assert_eq!(h.cfads_usd, b.cfads_usd);
        }
    }
}

#[test]
fn test_enhanced_allowance_lowers_tax() {
    let base = build_annual_rows(&wind_farm()).unwrap().result;
    let mut enhanced = wind_farm();
    enhanced.tax.enhanced_capital_allowance_multiplier = dec!(1.5);
    let out = build_annual_rows(&enhanced).unwrap().result;
    assert_eq!(out.rows[0].depreciation_usd, dec!(11_250_000));
    assert!(out.rows[0].tax_usd < base.rows[0].tax_usd);
}

#[test]
fn test_degradation_and_grid_loss() {
    let mut input = wind_farm();
    input.project.degradation_pct_per_year = dec!(0.01);
    input.project.grid_loss_pct = dec!(0.02);
    let out = build_annual_rows(&input).unwrap();
    let rows = &out.result.rows;

    assert_eq!(rows[1].gross_kwh, rows[0].gross_kwh * dec!(0.99));
    assert_eq!(rows[0].grid_loss_kwh, rows[0].gross_kwh * dec!(0.02));
    assert_eq!(rows[0].net_kwh, rows[0].gross_kwh - rows[0].grid_loss_kwh);
}

#[test]
fn test_explicit_short_fx_curve_extended() {
    let mut input = wind_farm();
    input.fx = FxSpec::Explicit {
        rates: vec![dec!(300), dec!(320)],
    };
    let out = build_annual_rows(&input).unwrap();
    assert_eq!(out.result.rows[19].fx_rate, dec!(320));
    assert!(out.warnings.iter().any(|w| w.contains("FX curve")));
}

#[test]
fn test_non_positive_explicit_fx_is_structural() {
    let mut input = wind_farm();
    input.fx = FxSpec::Explicit {
        rates: vec![dec!(300), Decimal::ZERO],
    };
    assert!(matches!(
        build_annual_rows(&input),
        Err(ProjectFinanceError::InvalidInput { .. })
    ));
}

#[test]
fn test_interest_shield_only_in_interest_years() {
    let input = wind_farm();
    let plain = build_annual_rows(&input).unwrap().result;
    let interest = vec![dec!(4_000_000), dec!(3_000_000)];
    let shielded = build_annual_rows_with_interest(&input, &interest).unwrap().result;

    assert_eq!(shielded.rows[0].interest_expense_usd, dec!(4_000_000));
    assert_eq!(plain.rows[0].tax_usd - shielded.rows[0].tax_usd, dec!(1_200_000));
    assert_eq!(shielded.rows[2].cfads_usd, plain.rows[2].cfads_usd);
}

#[test]
fn test_pre_operation_rows_carry_no_cash() {
    let mut input = wind_farm();
    input.pre_operation_periods = 2;
    let out = build_annual_rows(&input).unwrap().result;
    assert_eq!(out.rows.len(), 22);
    assert_eq!(out.rows[0].operating_year, None);
    assert_eq!(out.rows[2].operating_year, Some(1));
    // FX keeps depreciating through the pre-operation periods
    assert_eq!(out.rows[2].fx_rate, dec!(300) * dec!(1.03) * dec!(1.03));
}
