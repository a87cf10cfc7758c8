use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Coverage multiples (e.g., 1.30x DSCR)
pub type Multiple = Decimal;

/// Currency / lender class of a debt tranche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrancheCurrency {
    /// Local-currency commercial debt
    #[serde(rename = "LKR")]
    Lkr,
    /// USD commercial debt
    #[serde(rename = "USD")]
    Usd,
    /// Development finance institution (concessional) debt
    #[serde(rename = "DFI")]
    Dfi,
}

impl TrancheCurrency {
    pub const ALL: [TrancheCurrency; 3] = [
        TrancheCurrency::Lkr,
        TrancheCurrency::Usd,
        TrancheCurrency::Dfi,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TrancheCurrency::Lkr => "LKR",
            TrancheCurrency::Usd => "USD",
            TrancheCurrency::Dfi => "DFI",
        }
    }
}

/// Where a timeline period sits relative to commercial operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodPhase {
    /// PPA-to-financial-close and construction years (no generation)
    PreOperation,
    Operation,
}

/// A ratio observed in one timeline period. Periods where the ratio is
/// undefined are left out of a series rather than carried as a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRatio {
    /// 0-based timeline period
    pub period: u32,
    pub value: Multiple,
}

/// Longest timeline (construction or pre-operation periods plus operating
/// life) a run accepts.
pub const MAX_TIMELINE_PERIODS: u32 = 200;

/// Minimum and mean of a ratio series. Both are zero for an empty series.
pub fn ratio_min_avg(series: &[PeriodRatio]) -> (Multiple, Multiple) {
    if series.is_empty() {
        return (Decimal::ZERO, Decimal::ZERO);
    }
    let min = series
        .iter()
        .map(|r| r.value)
        .min()
        .unwrap_or(Decimal::ZERO);
    let sum: Decimal = series.iter().map(|r| r.value).sum();
    (min, sum / Decimal::from(series.len() as i64))
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
