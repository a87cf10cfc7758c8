//! Scenario configuration in the nested shape used by scenario files.
//!
//! Numeric leaves are optional and parsed leniently: numbers and numeric
//! strings are accepted, anything else reads as missing. [`ScenarioConfig::resolve`]
//! turns the raw tree into the typed inputs of each stage, defaulting
//! missing leaves and recording a warning for every required one.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::cashflow::{CfadsInput, StatutoryDeductions, TariffAndOpex};
use crate::production::fx::DEFAULT_FX_RATE;
use crate::production::{FxSpec, ProjectProfile};
use crate::tax::TaxPolicy;
use crate::ProjectFinanceResult;

#[cfg(feature = "coverage")]
use crate::coverage::CoverageCovenants;
#[cfg(feature = "debt")]
use crate::debt::{
    AmortizationStyle, DebtPlanInput, FinancingConstraints, FinancingTerms, MixCaps,
    RefinancingTerms, TrancheRates, DEFAULT_AUDIT_DSCR,
};

// ---------------------------------------------------------------------------
// Raw configuration tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub project: RawProject,
    #[serde(default)]
    pub tariff: RawTariff,
    #[serde(default)]
    pub opex: RawOpex,
    #[serde(default)]
    pub statutory: RawStatutory,
    #[serde(default)]
    pub tax: RawTax,
    #[serde(default)]
    pub risk: RawRisk,
    /// Must be a mapping; a scalar is rejected when parsing
    #[serde(default)]
    pub fx: Option<RawFx>,
    #[serde(default)]
    pub capex: RawCapex,
    #[serde(default, alias = "Financing_Terms")]
    pub financing_terms: Option<RawFinancingTerms>,
    #[serde(default)]
    pub metrics: RawMetrics,
    #[serde(default)]
    pub timeline: RawTimeline,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProject {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub capacity_mw: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub capacity_factor: Option<Decimal>,
    #[serde(default, alias = "degradation_pct_per_year", deserialize_with = "lenient_decimal")]
    pub degradation: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub grid_loss_pct: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub life_years: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTariff {
    #[serde(default, alias = "lkr_per_kwh", deserialize_with = "lenient_decimal")]
    pub local_per_kwh: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOpex {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub usd_per_year: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStatutory {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub success_fee_pct: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub env_surcharge_pct: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub social_levy_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTax {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub corporate_tax_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub depreciation_years: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub tax_holiday_years: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub tax_holiday_start_year: Option<u32>,
    /// Capital allowance multiplier (1.5 = 150%)
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub enhanced_capital_allowance_pct: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub enhanced_allowance_years: Option<u32>,
    #[serde(default)]
    pub interest_deductible: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRisk {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub haircut_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFx {
    #[serde(default, alias = "base_rate", deserialize_with = "lenient_decimal")]
    pub start_rate: Option<Decimal>,
    #[serde(default, alias = "annual_depreciation_pct", deserialize_with = "lenient_decimal")]
    pub annual_depr: Option<Decimal>,
    /// Explicit per-period rates; takes precedence over the parametric form
    #[serde(default, deserialize_with = "lenient_decimal_list")]
    pub curve: Option<Vec<Option<Decimal>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCapex {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub usd_total: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFinancingTerms {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub debt_ratio: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub tenor_years: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub construction_periods: Option<u32>,
    #[serde(default, deserialize_with = "lenient_decimal_list")]
    pub construction_schedule: Option<Vec<Option<Decimal>>>,
    #[serde(default, deserialize_with = "lenient_decimal_list")]
    pub debt_drawdown_pct: Option<Vec<Option<Decimal>>>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub grace_years: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub interest_only_years: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub amortization_style: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub target_dscr: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub audit_dscr_threshold: Option<Decimal>,
    #[serde(default)]
    pub mix: RawMix,
    #[serde(default)]
    pub rates: RawRates,
    #[cfg(feature = "debt")]
    #[serde(default)]
    pub constraints: RawConstraints,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMix {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub lkr_max: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub dfi_max: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub usd_commercial_min: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRates {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub lkr_nominal: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub usd_nominal: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub dfi_nominal: Option<Decimal>,
}

/// Lender limits with the refinancing allowance nested inside.
#[cfg(feature = "debt")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConstraints {
    #[serde(flatten)]
    pub limits: FinancingConstraints,
    #[serde(default)]
    pub refinancing: RefinancingTerms,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMetrics {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub discount_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub llcr_min_covenant: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub llcr_warn_threshold: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub plcr_min_covenant: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub plcr_target: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTimeline {
    /// Zero-generation periods before operations
    #[serde(default, deserialize_with = "lenient_u32")]
    pub pre_operation_periods: Option<u32>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Typed inputs for every stage, plus the data-quality warnings raised
/// while defaulting.
#[derive(Debug, Clone)]
pub struct ResolvedScenario {
    pub cfads: CfadsInput,
    #[cfg(feature = "debt")]
    pub debt: Option<DebtPlanInput>,
    #[cfg(feature = "coverage")]
    pub covenants: CoverageCovenants,
    pub warnings: Vec<String>,
}

impl ScenarioConfig {
    pub fn from_json_value(value: Value) -> ProjectFinanceResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn resolve(&self) -> ResolvedScenario {
        let mut warnings = Vec::new();
        let cfads = self.cfads_input(&mut warnings);
        #[cfg(feature = "debt")]
        let debt = self.debt_input(&mut warnings);
        ResolvedScenario {
            cfads,
            #[cfg(feature = "debt")]
            debt,
            #[cfg(feature = "coverage")]
            covenants: self.coverage_covenants(),
            warnings,
        }
    }

    pub fn cfads_input(&self, warnings: &mut Vec<String>) -> CfadsInput {
        let p = &self.project;
        let project = ProjectProfile {
            capacity_mw: required(p.capacity_mw, "project.capacity_mw", warnings),
            capacity_factor: required(p.capacity_factor, "project.capacity_factor", warnings),
            degradation_pct_per_year: p.degradation.unwrap_or(Decimal::ZERO),
            grid_loss_pct: p.grid_loss_pct.unwrap_or(Decimal::ZERO),
            life_years: required_u32(p.life_years, "project.life_years", warnings),
        };

        let tariff_opex = TariffAndOpex {
            tariff_local_per_kwh: required(self.tariff.local_per_kwh, "tariff.local_per_kwh", warnings),
            opex_usd_per_year: required(self.opex.usd_per_year, "opex.usd_per_year", warnings),
        };

        let s = &self.statutory;
        let statutory = StatutoryDeductions {
            success_fee_pct: s.success_fee_pct.unwrap_or(Decimal::ZERO),
            env_surcharge_pct: s.env_surcharge_pct.unwrap_or(Decimal::ZERO),
            social_levy_pct: s.social_levy_pct.unwrap_or(Decimal::ZERO),
        };

        let t = &self.tax;
        let tax = TaxPolicy {
            corporate_tax_rate: required(t.corporate_tax_rate, "tax.corporate_tax_rate", warnings),
            depreciation_years: required_u32(t.depreciation_years, "tax.depreciation_years", warnings),
            tax_holiday_years: t.tax_holiday_years.unwrap_or(0),
            tax_holiday_start_year: t.tax_holiday_start_year.unwrap_or(1).max(1),
            enhanced_capital_allowance_multiplier: t
                .enhanced_capital_allowance_pct
                .unwrap_or(Decimal::ONE),
            enhanced_allowance_years: t.enhanced_allowance_years,
            interest_deductible: t.interest_deductible.unwrap_or(false),
        };

        CfadsInput {
            project,
            tariff_opex,
            statutory,
            tax,
            fx: self.fx_spec(warnings),
            capex_usd_total: self.capex.usd_total,
            risk_haircut_pct: self.risk.haircut_pct.unwrap_or(Decimal::ZERO),
            pre_operation_periods: self.timeline.pre_operation_periods.unwrap_or(0),
        }
    }

    fn fx_spec(&self, warnings: &mut Vec<String>) -> FxSpec {
        let fallback = FxSpec::Parametric {
            start_rate: DEFAULT_FX_RATE,
            annual_depreciation_pct: Decimal::ZERO,
        };
        let Some(fx) = &self.fx else {
            warnings.push(format!("fx mapping missing; using flat {DEFAULT_FX_RATE} local/USD"));
            return fallback;
        };

        if let Some(curve) = &fx.curve {
            if let Some(rates) = fill_curve_gaps(curve, warnings) {
                return FxSpec::Explicit { rates };
            }
            warnings.push("fx.curve has no numeric entries; ignored".into());
        }

        match fx.start_rate {
            Some(start_rate) => FxSpec::Parametric {
                start_rate,
                annual_depreciation_pct: fx.annual_depr.unwrap_or(Decimal::ZERO),
            },
            None => {
                warnings.push(format!(
                    "fx.start_rate missing or non-numeric; using flat {DEFAULT_FX_RATE} local/USD"
                ));
                fallback
            }
        }
    }

    /// Debt planner input, or None when the scenario carries no financing
    /// terms.
    #[cfg(feature = "debt")]
    pub fn debt_input(&self, warnings: &mut Vec<String>) -> Option<DebtPlanInput> {
        let f = self.financing_terms.as_ref()?;

        let amortization_style = match f.amortization_style.as_deref() {
            None => AmortizationStyle::Sculpted,
            Some(raw) => parse_amortization_style(raw).unwrap_or_else(|| {
                warnings.push(format!(
                    "financing_terms.amortization_style '{raw}' not recognised; using sculpted"
                ));
                AmortizationStyle::Sculpted
            }),
        };

        let terms = FinancingTerms {
            debt_ratio: required(f.debt_ratio, "financing_terms.debt_ratio", warnings),
            tenor_years: required_u32(f.tenor_years, "financing_terms.tenor_years", warnings),
            construction_periods: f.construction_periods.unwrap_or(0),
            construction_schedule: decimal_list(
                &f.construction_schedule,
                "financing_terms.construction_schedule",
                warnings,
            ),
            debt_drawdown_pct: decimal_list(
                &f.debt_drawdown_pct,
                "financing_terms.debt_drawdown_pct",
                warnings,
            ),
            grace_years: f.grace_years.unwrap_or(0),
            interest_only_years: f.interest_only_years.unwrap_or(0),
            amortization_style,
            target_dscr: f.target_dscr.unwrap_or(DEFAULT_AUDIT_DSCR),
            audit_dscr_threshold: f.audit_dscr_threshold.unwrap_or(DEFAULT_AUDIT_DSCR),
            mix: MixCaps {
                lkr_max: f.mix.lkr_max.unwrap_or(Decimal::ZERO),
                dfi_max: f.mix.dfi_max.unwrap_or(Decimal::ZERO),
                usd_commercial_min: f.mix.usd_commercial_min.unwrap_or(Decimal::ZERO),
            },
            rates: TrancheRates {
                lkr_nominal: required(f.rates.lkr_nominal, "financing_terms.rates.lkr_nominal", warnings),
                usd_nominal: required(f.rates.usd_nominal, "financing_terms.rates.usd_nominal", warnings),
                dfi_nominal: required(f.rates.dfi_nominal, "financing_terms.rates.dfi_nominal", warnings),
            },
            constraints: f.constraints.limits.clone(),
            refinancing: f.constraints.refinancing.clone(),
        };

        Some(DebtPlanInput {
            capex_usd_total: self.capex.usd_total,
            terms,
        })
    }

    #[cfg(feature = "coverage")]
    pub fn coverage_covenants(&self) -> CoverageCovenants {
        let m = &self.metrics;
        let d = CoverageCovenants::default();
        CoverageCovenants {
            llcr_min_covenant: m.llcr_min_covenant.unwrap_or(d.llcr_min_covenant),
            llcr_warn_threshold: m.llcr_warn_threshold.unwrap_or(d.llcr_warn_threshold),
            plcr_min_covenant: m.plcr_min_covenant.unwrap_or(d.plcr_min_covenant),
            plcr_target: m.plcr_target.unwrap_or(d.plcr_target),
            discount_rate: m.discount_rate.unwrap_or(d.discount_rate),
        }
    }
}

#[cfg(feature = "debt")]
fn parse_amortization_style(raw: &str) -> Option<AmortizationStyle> {
    let s = raw.trim().to_ascii_lowercase();
    if s.starts_with("sculpt") {
        Some(AmortizationStyle::Sculpted)
    } else if s == "annuity" || s == "fixed" || s == "level" {
        Some(AmortizationStyle::Annuity)
    } else if s == "linear" || s == "straight_line" {
        Some(AmortizationStyle::Linear)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Defaulting helpers
// ---------------------------------------------------------------------------

fn required(value: Option<Decimal>, path: &str, warnings: &mut Vec<String>) -> Decimal {
    value.unwrap_or_else(|| {
        warnings.push(format!("{path} missing or non-numeric; defaulted to 0"));
        Decimal::ZERO
    })
}

fn required_u32(value: Option<u32>, path: &str, warnings: &mut Vec<String>) -> u32 {
    value.unwrap_or_else(|| {
        warnings.push(format!("{path} missing or non-numeric; defaulted to 0"));
        0
    })
}

#[cfg(feature = "debt")]
/// Non-numeric curve entries take the previous numeric rate (the first
/// numeric rate for leading gaps). None when nothing in the curve is
/// numeric.
fn fill_curve_gaps(curve: &[Option<Decimal>], warnings: &mut Vec<String>) -> Option<Vec<Decimal>> {
    let first = curve.iter().flatten().next().copied()?;
    let gaps = curve.iter().filter(|r| r.is_none()).count();
    if gaps > 0 {
        warnings.push(format!(
            "fx.curve has {gaps} non-numeric entries; each carries the previous rate forward"
        ));
    }

    let mut last = first;
    Some(
        curve
            .iter()
            .map(|r| {
                if let Some(rate) = r {
                    last = *rate;
                }
                last
            })
            .collect(),
    )
}

fn decimal_list(
    values: &Option<Vec<Option<Decimal>>>,
    path: &str,
    warnings: &mut Vec<String>,
) -> Vec<Decimal> {
    let Some(values) = values else {
        return Vec::new();
    };
    if values.iter().any(Option::is_none) {
        warnings.push(format!("{path} has non-numeric entries; read as 0"));
    }
    values.iter().map(|v| v.unwrap_or(Decimal::ZERO)).collect()
}

// ---------------------------------------------------------------------------
// Lenient leaf parsing
// ---------------------------------------------------------------------------

fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| Decimal::from_scientific(&n.to_string()).ok())
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_decimal))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_decimal(deserializer)?;
    Ok(value.map(|v| v.max(Decimal::ZERO).trunc().to_u32().unwrap_or(u32::MAX)))
}

fn lenient_decimal_list<'de, D>(deserializer: D) -> Result<Option<Vec<Option<Decimal>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(items.iter().map(value_to_decimal).collect()),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}
