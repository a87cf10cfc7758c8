pub mod amortization;
pub mod audit;
pub mod construction;
pub mod planner;
pub mod sizing;
pub mod terms;

pub use amortization::{sculpted_principal, TranchePeriod};
pub use audit::{
    AuditStatus, BalloonAssessment, BalloonStatus, DscrViolation, ViolationSeverity,
};
pub use construction::ConstructionPeriod;
pub use planner::{plan_debt, DebtPlanResult, DebtTranche, TrancheSummary};
pub use sizing::{solve_mix, TrancheAllocation};
pub use terms::{
    AmortizationStyle, DebtPlanInput, FinancingConstraints, FinancingTerms, MixCaps,
    RefinancingTerms, TrancheRates, DEFAULT_AUDIT_DSCR,
};
