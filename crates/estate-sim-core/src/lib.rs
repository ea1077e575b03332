pub mod api;
pub mod error;
pub mod profile;
pub mod simulation;
pub mod strategy;
pub mod time_value;
pub mod types;

pub use error::EstateSimError;
pub use types::*;

pub use profile::{analyze_profile, InvestmentProfile};
pub use simulation::{compare_strategies, run_simulation, simulate, SimulationOutcome, Snapshot};
pub use strategy::StrategyConfig;

/// Standard result type for all estate-sim operations
pub type EstateSimResult<T> = Result<T, EstateSimError>;
