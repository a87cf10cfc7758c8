pub mod cashflow;
pub mod config;
pub mod error;
pub mod production;
pub mod tax;
pub mod time_value;
pub mod types;

#[cfg(feature = "debt")]
pub mod debt;

#[cfg(feature = "coverage")]
pub mod coverage;

#[cfg(all(feature = "debt", feature = "coverage"))]
pub mod pipeline;

pub use error::ProjectFinanceError;
pub use types::*;

/// Standard result type for all project finance computations
pub type ProjectFinanceResult<T> = Result<T, ProjectFinanceError>;
