pub mod covenants;
pub mod ratios;

pub use covenants::{
    check_covenant, CovenantCheck, CovenantStatus, CoverageCovenants, CoverageViolation,
};
pub use ratios::{
    compute_llcr_plcr, coverage_ratios, evaluate_coverage, CoverageInput, CoverageSummary,
};
