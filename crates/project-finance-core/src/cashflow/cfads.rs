use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProjectFinanceError;
use crate::production::{EnergyYield, FxCurve, FxSpec, ProjectProfile};
use crate::tax::{depreciation_over_horizon, TaxPolicy};
use crate::types::{with_metadata, ComputationOutput, Money, PeriodPhase, Rate, MAX_TIMELINE_PERIODS};
use crate::ProjectFinanceResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Offtake tariff and operating cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffAndOpex {
    /// PPA tariff in local currency per kWh delivered
    pub tariff_local_per_kwh: Decimal,
    /// Annual operating cost, USD
    pub opex_usd_per_year: Money,
}

/// Statutory charges levied on local-currency revenue before FX conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatutoryDeductions {
    pub success_fee_pct: Rate,
    pub env_surcharge_pct: Rate,
    pub social_levy_pct: Rate,
}

impl StatutoryDeductions {
    pub fn total_pct(&self) -> Rate {
        self.success_fee_pct.max(Decimal::ZERO)
            + self.env_surcharge_pct.max(Decimal::ZERO)
            + self.social_levy_pct.max(Decimal::ZERO)
    }
}

/// Everything the CFADS chain needs for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfadsInput {
    pub project: ProjectProfile,
    pub tariff_opex: TariffAndOpex,
    #[serde(default)]
    pub statutory: StatutoryDeductions,
    pub tax: TaxPolicy,
    pub fx: FxSpec,
    /// Depreciable capital cost, USD. Depreciation is zero when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capex_usd_total: Option<Money>,
    /// Prudential haircut on post-tax CFADS
    #[serde(default)]
    pub risk_haircut_pct: Rate,
    /// Zero-generation periods placed ahead of operations (PPA-to-financial
    /// close plus construction)
    #[serde(default)]
    pub pre_operation_periods: u32,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One timeline period of the cash flow waterfall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualCashflowRow {
    /// 0-based timeline period (pre-operation periods first)
    pub period: u32,
    pub phase: PeriodPhase,
    /// 1-based operating year, None before operations
    pub operating_year: Option<u32>,
    /// Local currency per USD
    pub fx_rate: Decimal,
    pub gross_kwh: Decimal,
    pub grid_loss_kwh: Decimal,
    pub net_kwh: Decimal,
    /// Gross tariff revenue, local currency
    pub revenue_local: Money,
    /// Success fee + environmental surcharge + social levy, local currency
    pub statutory_local: Money,
    /// Revenue after statutory deductions, converted to USD
    pub revenue_usd: Money,
    pub opex_usd: Money,
    pub depreciation_usd: Money,
    pub interest_expense_usd: Money,
    pub taxable_income_usd: Money,
    pub tax_usd: Money,
    pub in_tax_holiday: bool,
    pub haircut_usd: Money,
    pub cfads_local: Money,
    pub cfads_usd: Money,
}

/// CFADS series plus headline statistics over the operating periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfadsOutput {
    pub rows: Vec<AnnualCashflowRow>,
    pub pre_operation_periods: u32,
    pub operating_periods: u32,
    pub interest_shield_applied: bool,
    pub total_cfads_usd: Money,
    pub min_cfads_usd: Money,
    pub max_cfads_usd: Money,
    pub avg_cfads_usd: Money,
}

impl CfadsOutput {
    /// CFADS for operating periods only, in order.
    pub fn operating_cfads(&self) -> Vec<Money> {
        operating_cfads(&self.rows)
    }
}

/// CFADS (USD) of the operating rows of a series.
pub fn operating_cfads(rows: &[AnnualCashflowRow]) -> Vec<Money> {
    rows.iter()
        .filter(|r| r.phase == PeriodPhase::Operation)
        .map(|r| r.cfads_usd)
        .collect()
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Build the per-period CFADS series without an interest tax shield.
pub fn build_annual_rows(
    input: &CfadsInput,
) -> ProjectFinanceResult<ComputationOutput<CfadsOutput>> {
    build_rows(input, None)
}

/// Build the per-period CFADS series deducting `interest_expense_usd`
/// (indexed by operating year, 0-based) from taxable income.
pub fn build_annual_rows_with_interest(
    input: &CfadsInput,
    interest_expense_usd: &[Money],
) -> ProjectFinanceResult<ComputationOutput<CfadsOutput>> {
    build_rows(input, Some(interest_expense_usd))
}

fn build_rows(
    input: &CfadsInput,
    interest_expense_usd: Option<&[Money]>,
) -> ProjectFinanceResult<ComputationOutput<CfadsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let life = input.project.life_years;
    if life == 0 {
        return Err(ProjectFinanceError::invalid(
            "project.life_years",
            "Operating life must be at least 1 year",
        ));
    }

    let pre_ops = input.pre_operation_periods;
    let total_periods = match pre_ops.checked_add(life) {
        Some(n) if n <= MAX_TIMELINE_PERIODS => n as usize,
        _ => {
            return Err(ProjectFinanceError::invalid(
                "project.life_years",
                format!(
                    "{pre_ops} pre-operation plus {life} operating periods exceed the \
                     {MAX_TIMELINE_PERIODS}-period limit"
                ),
            ))
        }
    };
    let fx_curve = FxCurve::build(&input.fx, total_periods, &mut warnings)?;

    let capex = match input.capex_usd_total {
        Some(c) if c > Decimal::ZERO => c,
        Some(c) => {
            warnings.push(format!(
                "capex.usd_total is {c}; depreciation allowance set to zero"
            ));
            Decimal::ZERO
        }
        None => {
            warnings.push("capex.usd_total missing; depreciation allowance set to zero".into());
            Decimal::ZERO
        }
    };
    let depreciation = depreciation_over_horizon(
        capex,
        input.tax.depreciation_years,
        input.tax.enhanced_capital_allowance_multiplier,
        input.tax.enhanced_allowance_years,
        life,
    );

    if let Some(interest) = interest_expense_usd {
        if interest.len() > life as usize {
            warnings.push(format!(
                "Interest series has {} entries for {life} operating years; extra entries ignored",
                interest.len()
            ));
        }
    }

    let tariff = clamp_non_negative(input.tariff_opex.tariff_local_per_kwh);
    let opex = clamp_non_negative(input.tariff_opex.opex_usd_per_year);
    let statutory_pct = input.statutory.total_pct();
    let haircut = input.risk_haircut_pct.max(Decimal::ZERO).min(Decimal::ONE);

    if tariff.is_zero() {
        warnings.push("Tariff is zero; CFADS will be non-positive".into());
    }

    let mut rows: Vec<AnnualCashflowRow> = Vec::with_capacity(total_periods);

    for period in 0..total_periods {
        let fx_rate = fx_curve.rate(period);

        if period < pre_ops as usize {
            rows.push(pre_operation_row(period as u32, fx_rate));
            continue;
        }

        // Degradation counts from the start of operations
        let op_index = period - pre_ops as usize;
        let op_year = op_index as u32 + 1;
        let energy = input.project.energy_yield(op_index as u32);

        let revenue_local = energy.net_kwh * tariff;
        let statutory_local = revenue_local * statutory_pct;
        let revenue_usd = fx_curve.to_usd(period, revenue_local - statutory_local);

        let dep = depreciation.get(op_index).copied().unwrap_or(Decimal::ZERO);
        let interest = interest_expense_usd
            .and_then(|s| s.get(op_index))
            .copied()
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO);

        let assessment = input.tax.assess(op_year, revenue_usd, opex, dep, interest);

        let post_tax = revenue_usd - opex - assessment.tax;
        let cfads_usd = post_tax * (Decimal::ONE - haircut);

        rows.push(AnnualCashflowRow {
            period: period as u32,
            phase: PeriodPhase::Operation,
            operating_year: Some(op_year),
            fx_rate,
            gross_kwh: energy.gross_kwh,
            grid_loss_kwh: energy.grid_loss_kwh,
            net_kwh: energy.net_kwh,
            revenue_local,
            statutory_local,
            revenue_usd,
            opex_usd: opex,
            depreciation_usd: assessment.depreciation,
            interest_expense_usd: assessment.interest_expense,
            taxable_income_usd: assessment.taxable_income,
            tax_usd: assessment.tax,
            in_tax_holiday: assessment.in_holiday,
            haircut_usd: post_tax - cfads_usd,
            cfads_local: cfads_usd * fx_rate,
            cfads_usd,
        });
    }

    let operating = operating_cfads(&rows);
    let total_cfads_usd: Money = operating.iter().sum();
    let min_cfads_usd = operating.iter().copied().min().unwrap_or(Decimal::ZERO);
    let max_cfads_usd = operating.iter().copied().max().unwrap_or(Decimal::ZERO);
    let avg_cfads_usd = total_cfads_usd / Decimal::from(life);

    if min_cfads_usd < Decimal::ZERO {
        warnings.push(format!(
            "CFADS is negative in at least one operating year (min {min_cfads_usd})"
        ));
    }

    let output = CfadsOutput {
        rows,
        pre_operation_periods: pre_ops,
        operating_periods: life,
        interest_shield_applied: interest_expense_usd.is_some(),
        total_cfads_usd,
        min_cfads_usd,
        max_cfads_usd,
        avg_cfads_usd,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "CFADS Builder (energy, statutory deductions, FX, tax, risk haircut)",
        &serde_json::json!({
            "capacity_mw": input.project.capacity_mw.to_string(),
            "capacity_factor": input.project.capacity_factor.to_string(),
            "life_years": life,
            "pre_operation_periods": pre_ops,
            "tariff_local_per_kwh": tariff.to_string(),
            "opex_usd_per_year": opex.to_string(),
            "corporate_tax_rate": input.tax.corporate_tax_rate.to_string(),
            "risk_haircut_pct": haircut.to_string(),
            "interest_shield": interest_expense_usd.is_some(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn pre_operation_row(period: u32, fx_rate: Decimal) -> AnnualCashflowRow {
    let energy = EnergyYield::zero();
    AnnualCashflowRow {
        period,
        phase: PeriodPhase::PreOperation,
        operating_year: None,
        fx_rate,
        gross_kwh: energy.gross_kwh,
        grid_loss_kwh: energy.grid_loss_kwh,
        net_kwh: energy.net_kwh,
        revenue_local: Decimal::ZERO,
        statutory_local: Decimal::ZERO,
        revenue_usd: Decimal::ZERO,
        opex_usd: Decimal::ZERO,
        depreciation_usd: Decimal::ZERO,
        interest_expense_usd: Decimal::ZERO,
        taxable_income_usd: Decimal::ZERO,
        tax_usd: Decimal::ZERO,
        in_tax_holiday: false,
        haircut_usd: Decimal::ZERO,
        cfads_local: Decimal::ZERO,
        cfads_usd: Decimal::ZERO,
    }
}

fn clamp_non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// Helper: 150 MW wind farm selling at 20.3 local/kWh.
    fn standard_input() -> CfadsInput {
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
                annual_depreciation_pct: Decimal::ZERO,
            },
            capex_usd_total: Some(dec!(150_000_000)),
            risk_haircut_pct: Decimal::ZERO,
            pre_operation_periods: 0,
        }
    }

    #[test]
    fn test_row_count_equals_life() {
        let out = build_annual_rows(&standard_input()).unwrap();
        assert_eq!(out.result.rows.len(), 20);
        assert_eq!(out.result.operating_periods, 20);
    }

    #[test]
    fn test_year_one_waterfall() {
        let out = build_annual_rows(&standard_input()).unwrap();
        let r = &out.result.rows[0];

        // 525,600,000 kWh × 20.3 = 10,669,680,000 local; / 300 = 35,565,600 USD
        assert_eq!(r.revenue_local, dec!(10_669_680_000));
        assert_eq!(r.revenue_usd, dec!(35_565_600));
        // Depreciation 150m / 20 = 7.5m; taxable = 35.5656m − 3m − 7.5m
        assert_eq!(r.depreciation_usd, dec!(7_500_000));
        assert_eq!(r.taxable_income_usd, dec!(25_065_600));
        assert_eq!(r.tax_usd, dec!(7_519_680));
        assert_eq!(r.cfads_usd, r.revenue_usd - r.opex_usd - r.tax_usd);
        assert_eq!(r.cfads_local, r.cfads_usd * dec!(300));
    }

    #[test]
    fn test_statutory_deducted_before_fx() {
        let mut input = standard_input();
        input.statutory = StatutoryDeductions {
            success_fee_pct: dec!(0.02),
            env_surcharge_pct: dec!(0.0025),
            social_levy_pct: dec!(0.0025),
        };
        let out = build_annual_rows(&input).unwrap();
        let r = &out.result.rows[0];
        assert_eq!(r.statutory_local, r.revenue_local * dec!(0.025));
        assert_eq!(r.revenue_usd, (r.revenue_local - r.statutory_local) / dec!(300));
    }

    #[test]
    fn test_haircut_applied_last() {
        let mut input = standard_input();
        input.risk_haircut_pct = dec!(0.10);
        let out = build_annual_rows(&input).unwrap();
        let r = &out.result.rows[0];
        let post_tax = r.revenue_usd - r.opex_usd - r.tax_usd;
        assert_eq!(r.cfads_usd, post_tax * dec!(0.9));
        assert_eq!(r.haircut_usd, post_tax * dec!(0.1));
    }

    #[test]
    fn test_zero_tariff_non_positive_cfads() {
        let mut input = standard_input();
        input.tariff_opex.tariff_local_per_kwh = Decimal::ZERO;
        let out = build_annual_rows(&input).unwrap();
        assert!(out.result.max_cfads_usd <= Decimal::ZERO);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_interest_shield_lowers_tax() {
        let input = standard_input();
        let plain = build_annual_rows(&input).unwrap();
        let interest = vec![dec!(5_000_000); 20];
        let shielded = build_annual_rows_with_interest(&input, &interest).unwrap();

        assert!(shielded.result.interest_shield_applied);
        let a = &plain.result.rows[0];
        let b = &shielded.result.rows[0];
        assert_eq!(a.tax_usd - b.tax_usd, dec!(1_500_000));
        assert!(b.cfads_usd > a.cfads_usd);
    }

    #[test]
    fn test_pre_operation_padding() {
        let mut input = standard_input();
        input.pre_operation_periods = 3;
        let out = build_annual_rows(&input).unwrap();
        let rows = &out.result.rows;
        assert_eq!(rows.len(), 23);
        for r in rows.iter().take(3) {
            assert_eq!(r.phase, PeriodPhase::PreOperation);
            assert_eq!(r.net_kwh, Decimal::ZERO);
            assert_eq!(r.cfads_usd, Decimal::ZERO);
        }
        // Degradation starts counting at operations, so year 1 is undegraded
        assert_eq!(rows[3].operating_year, Some(1));
        assert_eq!(rows[3].gross_kwh, dec!(525_600_000));
        assert_eq!(out.result.operating_cfads().len(), 20);
    }

    #[test]
    fn test_zero_life_is_structural_error() {
        let mut input = standard_input();
        input.project.life_years = 0;
        match build_annual_rows(&input) {
            Err(ProjectFinanceError::InvalidInput { field, .. }) => {
                assert_eq!(field, "project.life_years")
            }
            other => panic!("Expected InvalidInput, got: {other:?}"),
        }
    }

    #[test]
    fn test_oversized_timeline_is_structural_error() {
        let mut input = standard_input();
        input.project.life_years = u32::MAX;
        input.pre_operation_periods = 2;
        match build_annual_rows(&input) {
            Err(ProjectFinanceError::InvalidInput { field, .. }) => {
                assert_eq!(field, "project.life_years")
            }
            other => panic!("Expected InvalidInput, got: {other:?}"),
        }
    }

    #[test]
    fn test_long_depreciation_life_and_holiday() {
        let mut input = standard_input();
        input.tax.depreciation_years = u32::MAX;
        input.tax.tax_holiday_years = u32::MAX;
        input.tax.tax_holiday_start_year = 2;
        let out = build_annual_rows(&input).unwrap();
        let rows = &out.result.rows;
        assert_eq!(rows.len(), 20);
        assert!(!rows[0].in_tax_holiday);
        assert!(rows[1..].iter().all(|r| r.in_tax_holiday && r.tax_usd == Decimal::ZERO));
    }

    #[test]
    fn test_missing_capex_warns() {
        let mut input = standard_input();
        input.capex_usd_total = None;
        let out = build_annual_rows(&input).unwrap();
        assert_eq!(out.result.rows[0].depreciation_usd, Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("capex.usd_total")));
    }
}
