use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Multiple, Rate, TrancheCurrency};

/// Minimum DSCR for a PASS audit unless the scenario overrides it.
pub const DEFAULT_AUDIT_DSCR: Multiple = dec!(1.30);

/// Repayment profile after the interest-only window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmortizationStyle {
    /// Level debt service per tranche
    #[serde(alias = "fixed")]
    Annuity,
    /// Principal chosen each period to hold CFADS / service at the target DSCR
    #[default]
    Sculpted,
    /// Equal principal installments, interest on the declining balance
    Linear,
}

/// Tranche mix constraints, as fractions of total debt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MixCaps {
    /// Ceiling on the local-currency tranche
    pub lkr_max: Rate,
    /// Ceiling on the DFI tranche
    pub dfi_max: Rate,
    /// Floor on the USD commercial tranche
    pub usd_commercial_min: Rate,
}

/// Nominal annual rate per tranche.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrancheRates {
    pub lkr_nominal: Rate,
    pub usd_nominal: Rate,
    pub dfi_nominal: Rate,
}

impl TrancheRates {
    pub fn rate_for(&self, currency: TrancheCurrency) -> Rate {
        match currency {
            TrancheCurrency::Lkr => self.lkr_nominal,
            TrancheCurrency::Usd => self.usd_nominal,
            TrancheCurrency::Dfi => self.dfi_nominal,
        }
    }
}

/// Lender limits the financing parameters and outcomes are checked against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancingConstraints {
    pub max_debt_ratio: Rate,
    pub warn_debt_ratio: Rate,
    pub min_dscr_covenant: Multiple,
    pub warn_dscr: Multiple,
    pub max_balloon_pct: Rate,
    pub warn_balloon_pct: Rate,
    pub max_tenor_years: u32,
    pub warn_tenor_years: u32,
    pub max_interest_rate: Rate,
    pub min_interest_rate: Rate,
}

impl Default for FinancingConstraints {
    fn default() -> Self {
        FinancingConstraints {
            max_debt_ratio: dec!(0.85),
            warn_debt_ratio: dec!(0.80),
            min_dscr_covenant: dec!(1.30),
            warn_dscr: dec!(1.25),
            max_balloon_pct: dec!(0.10),
            warn_balloon_pct: dec!(0.05),
            max_tenor_years: 25,
            warn_tenor_years: 20,
            max_interest_rate: dec!(0.25),
            min_interest_rate: Decimal::ZERO,
        }
    }
}

/// Whether a residual balance at maturity may be refinanced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinancingTerms {
    pub enabled: bool,
    pub max_refinance_pct: Rate,
}

impl Default for RefinancingTerms {
    fn default() -> Self {
        RefinancingTerms {
            enabled: false,
            max_refinance_pct: dec!(0.15),
        }
    }
}

/// Financing terms for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingTerms {
    /// Share of capex funded by debt
    pub debt_ratio: Rate,
    /// Repayment tenor in operating years, grace included
    pub tenor_years: u32,
    pub construction_periods: u32,
    /// Capex spend percent per construction period (sums to 100)
    #[serde(default)]
    pub construction_schedule: Vec<Decimal>,
    /// Debt-funded fraction of each period's spend
    #[serde(default)]
    pub debt_drawdown_pct: Vec<Decimal>,
    #[serde(default)]
    pub grace_years: u32,
    #[serde(default)]
    pub interest_only_years: u32,
    #[serde(default)]
    pub amortization_style: AmortizationStyle,
    #[serde(default = "default_target_dscr")]
    pub target_dscr: Multiple,
    #[serde(default = "default_target_dscr")]
    pub audit_dscr_threshold: Multiple,
    #[serde(default)]
    pub mix: MixCaps,
    #[serde(default)]
    pub rates: TrancheRates,
    #[serde(default)]
    pub constraints: FinancingConstraints,
    #[serde(default)]
    pub refinancing: RefinancingTerms,
}

fn default_target_dscr() -> Multiple {
    DEFAULT_AUDIT_DSCR
}

impl FinancingTerms {
    /// Periods at the start of operations that pay interest only.
    pub fn interest_only_periods(&self) -> u32 {
        self.grace_years.max(self.interest_only_years)
    }
}

/// Input to the Debt Planner: the sizing base plus the terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtPlanInput {
    /// Total capital cost, USD. Required to size the debt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capex_usd_total: Option<Money>,
    pub terms: FinancingTerms,
}
