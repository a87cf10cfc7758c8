use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Multiple, PeriodRatio, Rate};

/// LLCR/PLCR thresholds and the discount rate used to value forward CFADS.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageCovenants {
    pub llcr_min_covenant: Multiple,
    pub llcr_warn_threshold: Multiple,
    pub plcr_min_covenant: Multiple,
    pub plcr_target: Multiple,
    pub discount_rate: Rate,
}

impl Default for CoverageCovenants {
    fn default() -> Self {
        CoverageCovenants {
            llcr_min_covenant: dec!(1.20),
            llcr_warn_threshold: dec!(1.25),
            plcr_min_covenant: dec!(1.40),
            plcr_target: dec!(1.60),
            discount_rate: dec!(0.10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CovenantStatus {
    Pass,
    Warn,
    Breach,
}

/// A period whose ratio sits below the warning level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageViolation {
    pub period: u32,
    pub value: Multiple,
    /// Breach below the covenant, Warn between covenant and warning level
    pub severity: CovenantStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CovenantCheck {
    pub status: CovenantStatus,
    pub covenant: Multiple,
    pub warn_threshold: Multiple,
    pub violations: Vec<CoverageViolation>,
}

/// Grade a ratio series: BREACH if any period is below `covenant`, WARN if
/// any is below `warn_threshold`, otherwise PASS. An empty series has
/// nothing outstanding to cover and passes.
pub fn check_covenant(
    series: &[PeriodRatio],
    covenant: Multiple,
    warn_threshold: Multiple,
) -> CovenantCheck {
    let violations: Vec<CoverageViolation> = series
        .iter()
        .filter_map(|r| {
            let severity = if r.value < covenant {
                CovenantStatus::Breach
            } else if r.value < warn_threshold {
                CovenantStatus::Warn
            } else {
                return None;
            };
            Some(CoverageViolation {
                period: r.period,
                value: r.value,
                severity,
            })
        })
        .collect();

    let status = if violations
        .iter()
        .any(|v| v.severity == CovenantStatus::Breach)
    {
        CovenantStatus::Breach
    } else if violations.is_empty() {
        CovenantStatus::Pass
    } else {
        CovenantStatus::Warn
    };

    CovenantCheck {
        status,
        covenant,
        warn_threshold,
        violations,
    }
}
