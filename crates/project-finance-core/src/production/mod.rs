pub mod energy;
pub mod fx;

pub use energy::{EnergyYield, ProjectProfile};
pub use fx::{FxCurve, FxSpec};
