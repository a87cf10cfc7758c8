use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::sizing::TrancheAllocation;
use super::terms::{FinancingTerms, TrancheRates};
use crate::error::ProjectFinanceError;
use crate::types::{Money, Rate, TrancheCurrency};
use crate::ProjectFinanceResult;

const SCHEDULE_TOTAL: Decimal = dec!(100);
const SCHEDULE_TOLERANCE: Decimal = dec!(0.01);

/// Blended draw and IDC for one construction period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionPeriod {
    pub period: u32,
    /// Capex spend in the period, percent of total
    pub spend_pct: Decimal,
    /// Debt-funded fraction of the spend
    pub drawdown_pct: Decimal,
    pub opening_balance: Money,
    pub draw: Money,
    pub idc: Money,
    pub closing_balance: Money,
}

/// One tranche at the end of construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructedTranche {
    pub currency: TrancheCurrency,
    pub share: Rate,
    pub nominal_rate: Rate,
    pub drawn: Money,
    pub idc_capitalized: Money,
    /// Opening balance of each construction period
    pub opening_balances: Vec<Money>,
}

impl ConstructedTranche {
    /// Principal entering operations: draws plus capitalised interest.
    pub fn principal(&self) -> Money {
        self.drawn + self.idc_capitalized
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionOutcome {
    pub tranches: Vec<ConstructedTranche>,
    pub idc_schedule: Vec<ConstructionPeriod>,
    pub total_drawn: Money,
    pub total_idc: Money,
}

/// Draw the sized debt over the construction periods and capitalise interest.
///
/// In period i each tranche draws `amount × schedule[i]/100 × drawdown[i]`,
/// accrues a full period of interest on its balance after the draw, and
/// adds that interest to principal. With no construction periods the whole
/// allocation is drawn at financial close with no IDC.
pub fn draw_construction(
    allocations: &[TrancheAllocation],
    terms: &FinancingTerms,
    rates: &TrancheRates,
    warnings: &mut Vec<String>,
) -> ProjectFinanceResult<ConstructionOutcome> {
    let periods = terms.construction_periods as usize;

    if periods == 0 {
        let tranches: Vec<ConstructedTranche> = allocations
            .iter()
            .map(|a| ConstructedTranche {
                currency: a.currency,
                share: a.share,
                nominal_rate: rates.rate_for(a.currency),
                drawn: a.amount,
                idc_capitalized: Decimal::ZERO,
                opening_balances: Vec::new(),
            })
            .collect();
        let total_drawn = tranches.iter().map(|t| t.drawn).sum();
        return Ok(ConstructionOutcome {
            tranches,
            idc_schedule: Vec::new(),
            total_drawn,
            total_idc: Decimal::ZERO,
        });
    }

    validate_schedule(terms, warnings)?;

    let spend: Vec<Decimal> = terms
        .construction_schedule
        .iter()
        .map(|s| (*s).max(Decimal::ZERO))
        .collect();
    let drawdown: Vec<Decimal> = terms
        .debt_drawdown_pct
        .iter()
        .map(|d| (*d).max(Decimal::ZERO).min(Decimal::ONE))
        .collect();

    let mut tranches: Vec<ConstructedTranche> = Vec::with_capacity(allocations.len());
    let mut blended = vec![(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO); periods];

    for alloc in allocations {
        let rate = rates.rate_for(alloc.currency).max(Decimal::ZERO);
        let mut balance = Decimal::ZERO;
        let mut drawn = Decimal::ZERO;
        let mut idc_total = Decimal::ZERO;
        let mut opening_balances = Vec::with_capacity(periods);

        for i in 0..periods {
            let opening = balance;
            let draw = alloc.amount * (spend[i] / SCHEDULE_TOTAL) * drawdown[i];
            balance += draw;
            let idc = balance * rate;
            balance += idc;

            drawn += draw;
            idc_total += idc;
            opening_balances.push(opening);

            let slot = &mut blended[i];
            slot.0 += opening;
            slot.1 += draw;
            slot.2 += idc;
            slot.3 += balance;
        }

        tranches.push(ConstructedTranche {
            currency: alloc.currency,
            share: alloc.share,
            nominal_rate: rate,
            drawn,
            idc_capitalized: idc_total,
            opening_balances,
        });
    }

    let idc_schedule: Vec<ConstructionPeriod> = blended
        .into_iter()
        .enumerate()
        .map(|(i, (opening, draw, idc, closing))| ConstructionPeriod {
            period: i as u32,
            spend_pct: spend[i],
            drawdown_pct: drawdown[i],
            opening_balance: opening,
            draw,
            idc,
            closing_balance: closing,
        })
        .collect();

    let total_drawn: Money = tranches.iter().map(|t| t.drawn).sum();
    let total_idc: Money = tranches.iter().map(|t| t.idc_capitalized).sum();
    let sized: Money = allocations.iter().map(|a| a.amount).sum();
    if sized - total_drawn > SCHEDULE_TOLERANCE {
        warnings.push(format!(
            "Construction draws {total_drawn} are below sized debt {sized}; the remainder is equity funded"
        ));
    }

    Ok(ConstructionOutcome {
        tranches,
        idc_schedule,
        total_drawn,
        total_idc,
    })
}

fn validate_schedule(terms: &FinancingTerms, warnings: &mut Vec<String>) -> ProjectFinanceResult<()> {
    let periods = terms.construction_periods as usize;

    if terms.construction_schedule.len() != periods {
        return Err(ProjectFinanceError::invalid(
            "financing_terms.construction_schedule",
            format!(
                "Expected {periods} entries (one per construction period), got {}",
                terms.construction_schedule.len()
            ),
        ));
    }
    if terms.debt_drawdown_pct.len() != periods {
        return Err(ProjectFinanceError::invalid(
            "financing_terms.debt_drawdown_pct",
            format!(
                "Expected {periods} entries (one per construction period), got {}",
                terms.debt_drawdown_pct.len()
            ),
        ));
    }

    let total: Decimal = terms.construction_schedule.iter().sum();
    if (total - SCHEDULE_TOTAL).abs() > SCHEDULE_TOLERANCE {
        warnings.push(format!(
            "construction_schedule sums to {total}, not 100; draws follow the schedule as given"
        ));
    }
    if terms
        .debt_drawdown_pct
        .iter()
        .any(|d| *d < Decimal::ZERO || *d > Decimal::ONE)
    {
        warnings.push("debt_drawdown_pct entries outside [0, 1] were clamped".into());
    }
    Ok(())
}
