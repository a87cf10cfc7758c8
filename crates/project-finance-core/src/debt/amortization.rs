use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::terms::AmortizationStyle;
use crate::error::ProjectFinanceError;
use crate::time_value::annuity_payment;
use crate::types::{Money, Multiple, Rate};
use crate::ProjectFinanceResult;

/// One operating period of a tranche's repayment schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranchePeriod {
    /// 0-based timeline period
    pub period: u32,
    pub opening_balance: Money,
    pub interest: Money,
    pub principal: Money,
    pub service: Money,
    pub closing_balance: Money,
}

/// Operating periods split into the interest-only window and the
/// amortising window that follows it. Anything after is matured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepaymentWindow {
    pub interest_only: u32,
    pub amortizing: u32,
}

impl RepaymentWindow {
    fn amortization_start(&self) -> usize {
        self.interest_only as usize
    }

    fn maturity(&self) -> usize {
        (self.interest_only + self.amortizing) as usize
    }
}

/// Principal and rate of a tranche at the start of operations.
#[derive(Debug, Clone, Copy)]
pub struct OpeningTranche {
    pub principal: Money,
    pub rate: Rate,
}

/// Repay every tranche across the operating periods.
///
/// Returns one schedule per tranche, each with one entry per element of
/// `cfads`. `first_period` is the timeline index of the first operating
/// period. Annuity and linear schedules clear the balance in the last
/// amortising period; sculpted schedules may leave a balloon.
pub fn amortize(
    style: AmortizationStyle,
    tranches: &[OpeningTranche],
    cfads: &[Money],
    window: RepaymentWindow,
    target_dscr: Multiple,
    first_period: u32,
) -> ProjectFinanceResult<Vec<Vec<TranchePeriod>>> {
    if style == AmortizationStyle::Sculpted && target_dscr <= Decimal::ZERO {
        return Err(ProjectFinanceError::invalid(
            "financing_terms.target_dscr",
            "Sculpted amortization needs a positive target DSCR",
        ));
    }

    let n = cfads.len();
    let amort_start = window.amortization_start();
    let maturity = window.maturity().min(n);

    let rates: Vec<Rate> = tranches.iter().map(|t| t.rate.max(Decimal::ZERO)).collect();
    let mut balances: Vec<Money> = tranches.iter().map(|t| t.principal.max(Decimal::ZERO)).collect();
    let mut level: Vec<Money> = vec![Decimal::ZERO; tranches.len()];
    let mut schedules: Vec<Vec<TranchePeriod>> = vec![Vec::with_capacity(n); tranches.len()];

    for k in 0..n {
        if k == amort_start && window.amortizing > 0 {
            level = level_installments(style, &balances, &rates, window.amortizing)?;
        }

        let matured = k >= maturity;
        let interest: Vec<Money> = if matured {
            vec![Decimal::ZERO; balances.len()]
        } else {
            balances.iter().zip(&rates).map(|(b, r)| *b * *r).collect()
        };

        let principal: Vec<Money> = if k < amort_start || matured {
            vec![Decimal::ZERO; balances.len()]
        } else {
            let last = k + 1 == maturity;
            match style {
                AmortizationStyle::Annuity => balances
                    .iter()
                    .zip(&interest)
                    .zip(&level)
                    .map(|((b, i), pmt)| {
                        if last {
                            *b
                        } else {
                            (*pmt - *i).max(Decimal::ZERO).min(*b)
                        }
                    })
                    .collect(),
                AmortizationStyle::Linear => balances
                    .iter()
                    .zip(&level)
                    .map(|(b, inst)| if last { *b } else { (*inst).min(*b) })
                    .collect(),
                AmortizationStyle::Sculpted => {
                    sculpted_principal(cfads[k], target_dscr, &balances, &interest)
                }
            }
        };

        for (j, schedule) in schedules.iter_mut().enumerate() {
            let opening = balances[j];
            let closing = (opening - principal[j]).max(Decimal::ZERO);
            schedule.push(TranchePeriod {
                period: first_period + k as u32,
                opening_balance: opening,
                interest: interest[j],
                principal: principal[j],
                service: interest[j] + principal[j],
                closing_balance: closing,
            });
            balances[j] = closing;
        }
    }

    Ok(schedules)
}

/// Blended sculpting: the debt service that holds CFADS at the target DSCR,
/// less total interest, is the principal for the period. It is capped at
/// the total balance and shared pro-rata by outstanding balance.
pub fn sculpted_principal(
    cfads: Money,
    target_dscr: Multiple,
    balances: &[Money],
    interest: &[Money],
) -> Vec<Money> {
    let total_balance: Money = balances.iter().sum();
    if total_balance <= Decimal::ZERO || target_dscr <= Decimal::ZERO {
        return vec![Decimal::ZERO; balances.len()];
    }

    let target_service = (cfads / target_dscr).max(Decimal::ZERO);
    let total_interest: Money = interest.iter().sum();
    let principal_total = (target_service - total_interest)
        .max(Decimal::ZERO)
        .min(total_balance);

    // Final repayment clears every tranche exactly
    if principal_total == total_balance {
        return balances.to_vec();
    }

    balances
        .iter()
        .map(|b| (principal_total * *b / total_balance).min(*b))
        .collect()
}

fn level_installments(
    style: AmortizationStyle,
    balances: &[Money],
    rates: &[Rate],
    periods: u32,
) -> ProjectFinanceResult<Vec<Money>> {
    match style {
        AmortizationStyle::Annuity => balances
            .iter()
            .zip(rates)
            .map(|(b, r)| annuity_payment(*r, periods, *b))
            .collect(),
        AmortizationStyle::Linear => Ok(balances
            .iter()
            .map(|b| *b / Decimal::from(periods))
            .collect()),
        AmortizationStyle::Sculpted => Ok(vec![Decimal::ZERO; balances.len()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn two_tranches() -> Vec<OpeningTranche> {
        vec![
            OpeningTranche {
                principal: dec!(600),
                rate: dec!(0.10),
            },
            OpeningTranche {
                principal: dec!(400),
                rate: dec!(0.05),
            },
        ]
    }

    fn principal_sum(schedule: &[TranchePeriod]) -> Decimal {
        schedule.iter().map(|p| p.principal).sum()
    }

    #[test]
    fn test_annuity_fully_repays_each_tranche() {
        let cfads = vec![dec!(500); 10];
        let window = RepaymentWindow {
            interest_only: 0,
            amortizing: 10,
        };
        let s = amortize(AmortizationStyle::Annuity, &two_tranches(), &cfads, window, dec!(1.3), 0)
            .unwrap();
        assert_eq!(principal_sum(&s[0]), dec!(600));
        assert_eq!(principal_sum(&s[1]), dec!(400));
        assert_eq!(s[0][9].closing_balance, Decimal::ZERO);

        // Level service except for the final clean-up installment
        let diff = (s[0][0].service - s[0][5].service).abs();
        assert!(diff < dec!(0.000001), "service not level: {diff}");
    }

    #[test]
    fn test_linear_equal_principal() {
        let cfads = vec![dec!(500); 5];
        let window = RepaymentWindow {
            interest_only: 0,
            amortizing: 5,
        };
        let s = amortize(AmortizationStyle::Linear, &two_tranches(), &cfads, window, dec!(1.3), 0)
            .unwrap();
        assert!(s[0].iter().all(|p| p.principal == dec!(120)));
        assert_eq!(s[1][0].interest, dec!(20));
        assert_eq!(s[1][1].interest, dec!(16));
    }

    #[test]
    fn test_interest_only_window() {
        let cfads = vec![dec!(500); 6];
        let window = RepaymentWindow {
            interest_only: 2,
            amortizing: 4,
        };
        let s = amortize(AmortizationStyle::Linear, &two_tranches(), &cfads, window, dec!(1.3), 3)
            .unwrap();
        assert_eq!(s[0][0].period, 3);
        assert_eq!(s[0][0].principal, Decimal::ZERO);
        assert_eq!(s[0][1].service, dec!(60));
        assert_eq!(s[0][2].principal, dec!(150));
        assert_eq!(principal_sum(&s[0]), dec!(600));
    }

    #[test]
    fn test_matured_periods_have_no_service() {
        let cfads = vec![dec!(500); 8];
        let window = RepaymentWindow {
            interest_only: 0,
            amortizing: 4,
        };
        let s = amortize(AmortizationStyle::Annuity, &two_tranches(), &cfads, window, dec!(1.3), 0)
            .unwrap();
        for p in &s[0][4..] {
            assert_eq!(p.service, Decimal::ZERO);
            assert_eq!(p.opening_balance, Decimal::ZERO);
        }
    }

    #[test]
    fn test_sculpted_allocation_pro_rata() {
        let balances = vec![dec!(600), dec!(400)];
        let interest = vec![dec!(60), dec!(20)];
        // Target service 130 / 1.3 = 100; principal 100 − 80 = 20, split 60/40
        let p = sculpted_principal(dec!(130), dec!(1.3), &balances, &interest);
        assert_eq!(p, vec![dec!(12), dec!(8)]);
    }

    #[test]
    fn test_sculpted_insufficient_cfads_pays_no_principal() {
        let balances = vec![dec!(600), dec!(400)];
        let interest = vec![dec!(60), dec!(20)];
        let p = sculpted_principal(dec!(50), dec!(1.3), &balances, &interest);
        assert!(p.iter().all(|x| x.is_zero()));
    }

    #[test]
    fn test_sculpted_capped_at_balance() {
        let balances = vec![dec!(6), dec!(4)];
        let interest = vec![dec!(0.6), dec!(0.2)];
        let p = sculpted_principal(dec!(1300), dec!(1.3), &balances, &interest);
        assert_eq!(p, vec![dec!(6), dec!(4)]);
    }

    #[test]
    fn test_sculpted_rejects_non_positive_target() {
        let window = RepaymentWindow {
            interest_only: 0,
            amortizing: 2,
        };
        let r = amortize(
            AmortizationStyle::Sculpted,
            &two_tranches(),
            &[dec!(100), dec!(100)],
            window,
            Decimal::ZERO,
            0,
        );
        assert!(r.is_err());
    }
}
