pub mod depreciation;
pub mod policy;

pub use depreciation::{depreciation_over_horizon, depreciation_schedule};
pub use policy::{TaxAssessment, TaxPolicy};
