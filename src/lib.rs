pub mod error;
pub mod filter;
pub mod loader;
pub mod projection;
pub mod report;
pub mod scenario;
pub mod schema;
pub mod simulator;

#[cfg(feature = "python")]
mod python;

pub use error::SimError;
pub use filter::{apply_filters, available_options, available_options_all, Dimension, FilterState};
pub use projection::{GlobalAnchor, Projection, SimulationParams, YearMonth};
pub use report::Report;
pub use scenario::Scenario;
pub use simulator::{BudgetSimulator, Simulation};
