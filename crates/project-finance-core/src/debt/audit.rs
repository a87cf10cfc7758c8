use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::terms::{AmortizationStyle, FinancingConstraints, FinancingTerms, RefinancingTerms};
use crate::types::{Money, Multiple, PeriodRatio, Rate, TrancheCurrency};

/// Balloons below this share of principal are treated as immaterial.
const IMMATERIAL_BALLOON_PCT: Rate = dec!(0.01);

/// Reported DSCRs are rounded so a schedule sculpted exactly to a target
/// compares equal to it.
const DSCR_DECIMALS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Pass,
    Review,
}

/// PASS when the minimum DSCR clears the threshold.
pub fn audit_status(dscr_min: Multiple, threshold: Multiple) -> AuditStatus {
    if dscr_min >= threshold {
        AuditStatus::Pass
    } else {
        AuditStatus::Review
    }
}

/// DSCR for every timeline period with positive debt service, rounded to
/// 12 decimal places.
pub fn dscr_series(cfads: &[Money], debt_service: &[Money]) -> Vec<PeriodRatio> {
    cfads
        .iter()
        .zip(debt_service)
        .enumerate()
        .filter(|(_, (_, ds))| **ds > Decimal::ZERO)
        .map(|(t, (cf, ds))| PeriodRatio {
            period: t as u32,
            value: (*cf / *ds).round_dp(DSCR_DECIMALS),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// DSCR covenant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationSeverity {
    /// DSCR below 1.0x: cash flow does not cover debt service
    Critical,
    BelowCovenant,
    BelowWarning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DscrViolation {
    pub period: u32,
    pub dscr: Multiple,
    pub severity: ViolationSeverity,
}

pub fn dscr_violations(series: &[PeriodRatio], constraints: &FinancingConstraints) -> Vec<DscrViolation> {
    series
        .iter()
        .filter_map(|r| {
            let severity = if r.value < Decimal::ONE {
                ViolationSeverity::Critical
            } else if r.value < constraints.min_dscr_covenant {
                ViolationSeverity::BelowCovenant
            } else if r.value < constraints.warn_dscr {
                ViolationSeverity::BelowWarning
            } else {
                return None;
            };
            Some(DscrViolation {
                period: r.period,
                dscr: r.value,
                severity,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parameter validation
// ---------------------------------------------------------------------------

/// Check the financing terms against the lender constraints. Findings are
/// returned as messages, never as errors.
pub fn validate_terms(terms: &FinancingTerms) -> Vec<String> {
    let c = &terms.constraints;
    let mut issues = Vec::new();

    let ratio = terms.debt_ratio;
    if ratio < Decimal::ZERO || ratio > Decimal::ONE {
        issues.push(format!("ERROR: debt_ratio {ratio} outside [0, 1]"));
    } else if ratio > c.max_debt_ratio {
        issues.push(format!("ERROR: debt_ratio {ratio} above max {}", c.max_debt_ratio));
    } else if ratio > c.warn_debt_ratio {
        issues.push(format!("WARNING: debt_ratio {ratio} above warn level {}", c.warn_debt_ratio));
    }

    let tenor = terms.tenor_years;
    if tenor == 0 {
        issues.push("ERROR: tenor_years must be positive".into());
    } else if tenor > c.max_tenor_years {
        issues.push(format!("ERROR: tenor {tenor} above max {}", c.max_tenor_years));
    } else if tenor > c.warn_tenor_years {
        issues.push(format!("WARNING: tenor {tenor} above warn level {}", c.warn_tenor_years));
    }

    if terms.amortization_style == AmortizationStyle::Sculpted {
        let target = terms.target_dscr;
        if target < Decimal::ONE {
            issues.push(format!(
                "ERROR: sculpted amortization requires target_dscr >= 1.0, got {target}"
            ));
        } else if target < c.min_dscr_covenant {
            issues.push(format!(
                "WARNING: target_dscr {target} below covenant {}",
                c.min_dscr_covenant
            ));
        }
    }

    for currency in TrancheCurrency::ALL {
        let rate = terms.rates.rate_for(currency);
        if rate < c.min_interest_rate {
            issues.push(format!(
                "ERROR: {} rate {rate} below min {}",
                currency.label(),
                c.min_interest_rate
            ));
        } else if rate > c.max_interest_rate {
            issues.push(format!(
                "ERROR: {} rate {rate} above max {}",
                currency.label(),
                c.max_interest_rate
            ));
        }
    }

    issues
}

// ---------------------------------------------------------------------------
// Balloon
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalloonStatus {
    /// No material residual balance
    None,
    Acceptable,
    MitigationRequired,
    Refinanceable,
    NotAcceptable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalloonAssessment {
    pub balloon_amount: Money,
    /// Balloon as a share of principal
    pub balloon_pct: Rate,
    pub status: BalloonStatus,
    pub notes: String,
}

/// Grade the residual balance at maturity against the balloon limits and
/// the refinancing allowance.
pub fn assess_balloon(
    balloon: Money,
    principal: Money,
    constraints: &FinancingConstraints,
    refinancing: &RefinancingTerms,
) -> BalloonAssessment {
    let balloon = balloon.max(Decimal::ZERO);
    let pct = if principal > Decimal::ZERO {
        balloon / principal
    } else {
        Decimal::ZERO
    };
    let shown = (pct * dec!(100)).round_dp(1);

    let (status, notes) = if pct < IMMATERIAL_BALLOON_PCT {
        (BalloonStatus::None, "No material balloon payment".to_string())
    } else if pct <= constraints.warn_balloon_pct {
        (
            BalloonStatus::Acceptable,
            format!("Small balloon ({shown}%) is acceptable"),
        )
    } else if pct <= constraints.max_balloon_pct {
        if !refinancing.enabled {
            (
                BalloonStatus::MitigationRequired,
                format!("Balloon {shown}% requires mitigation; refinancing disabled"),
            )
        } else if pct <= refinancing.max_refinance_pct {
            (
                BalloonStatus::Refinanceable,
                format!(
                    "Balloon {shown}% can be refinanced (limit {}%)",
                    (refinancing.max_refinance_pct * dec!(100)).round_dp(1)
                ),
            )
        } else {
            (
                BalloonStatus::MitigationRequired,
                format!("Balloon {shown}% exceeds the refinancing limit"),
            )
        }
    } else {
        (
            BalloonStatus::NotAcceptable,
            format!(
                "Balloon {shown}% exceeds maximum {}%; restructure tenor, target DSCR or leverage",
                (constraints.max_balloon_pct * dec!(100)).round_dp(1)
            ),
        )
    };

    BalloonAssessment {
        balloon_amount: balloon,
        balloon_pct: pct,
        status,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debt::terms::{MixCaps, TrancheRates};

    fn terms() -> FinancingTerms {
        FinancingTerms {
            debt_ratio: dec!(0.70),
            tenor_years: 15,
            construction_periods: 0,
            construction_schedule: vec![],
            debt_drawdown_pct: vec![],
            grace_years: 0,
            interest_only_years: 0,
            amortization_style: AmortizationStyle::Sculpted,
            target_dscr: dec!(1.30),
            audit_dscr_threshold: dec!(1.30),
            mix: MixCaps::default(),
            rates: TrancheRates {
                lkr_nominal: dec!(0.12),
                usd_nominal: dec!(0.08),
                dfi_nominal: dec!(0.05),
            },
            constraints: FinancingConstraints::default(),
            refinancing: RefinancingTerms::default(),
        }
    }

    #[test]
    fn test_audit_threshold_inclusive() {
        assert_eq!(audit_status(dec!(1.30), dec!(1.30)), AuditStatus::Pass);
        assert_eq!(audit_status(dec!(1.2999), dec!(1.30)), AuditStatus::Review);
        assert_eq!(audit_status(Decimal::ZERO, dec!(1.30)), AuditStatus::Review);
    }

    #[test]
    fn test_dscr_series_skips_zero_service() {
        let s = dscr_series(&[dec!(0), dec!(130), dec!(50)], &[dec!(0), dec!(100), dec!(0)]);
        assert_eq!(
            s,
            vec![PeriodRatio {
                period: 1,
                value: dec!(1.3)
            }]
        );
    }

    #[test]
    fn test_violation_severity_bands() {
        let series: Vec<PeriodRatio> = [dec!(0.9), dec!(1.27), dec!(1.31), dec!(1.5)]
            .iter()
            .enumerate()
            .map(|(i, v)| PeriodRatio {
                period: i as u32,
                value: *v,
            })
            .collect();
        let mut c = FinancingConstraints::default();
        c.warn_dscr = dec!(1.35);
        let v = dscr_violations(&series, &c);
        assert_eq!(v.len(), 3);
        assert_eq!(v[0].severity, ViolationSeverity::Critical);
        assert_eq!(v[1].severity, ViolationSeverity::BelowCovenant);
        assert_eq!(v[2].severity, ViolationSeverity::BelowWarning);
    }

    #[test]
    fn test_validation_clean_terms() {
        assert!(validate_terms(&terms()).is_empty());
    }

    #[test]
    fn test_validation_flags() {
        let mut t = terms();
        t.debt_ratio = dec!(0.82);
        t.tenor_years = 30;
        t.target_dscr = dec!(0.9);
        t.rates.lkr_nominal = dec!(0.30);
        let issues = validate_terms(&t);
        assert_eq!(issues.len(), 4);
        assert!(issues[0].starts_with("WARNING: debt_ratio"));
        assert!(issues[1].starts_with("ERROR: tenor"));
        assert!(issues[2].contains("target_dscr"));
        assert!(issues[3].contains("LKR"));
    }

    #[test]
    fn test_balloon_bands() {
        let c = FinancingConstraints::default();
        let mut refi = RefinancingTerms::default();

        assert_eq!(
            assess_balloon(dec!(0.5), dec!(100), &c, &refi).status,
            BalloonStatus::None
        );
        assert_eq!(
            assess_balloon(dec!(4), dec!(100), &c, &refi).status,
            BalloonStatus::Acceptable
        );
        assert_eq!(
            assess_balloon(dec!(8), dec!(100), &c, &refi).status,
            BalloonStatus::MitigationRequired
        );
        refi.enabled = true;
        assert_eq!(
            assess_balloon(dec!(8), dec!(100), &c, &refi).status,
            BalloonStatus::Refinanceable
        );
        assert_eq!(
            assess_balloon(dec!(20), dec!(100), &c, &refi).status,
            BalloonStatus::NotAcceptable
        );
    }

    #[test]
    fn test_balloon_without_principal() {
        let a = assess_balloon(
            Decimal::ZERO,
            Decimal::ZERO,
            &FinancingConstraints::default(),
            &RefinancingTerms::default(),
        );
        assert_eq!(a.status, BalloonStatus::None);
        assert_eq!(a.balloon_pct, Decimal::ZERO);
    }
}
