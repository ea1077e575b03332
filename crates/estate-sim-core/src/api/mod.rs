//! In-process boundary layer: loosely typed requests in, engine inputs and
//! merged results out.

pub mod presets;
pub mod request;

pub use presets::{preset_by_name, strategy_presets, StrategyPreset};
pub use request::{
    build_inputs, compare_request, health, simulate_request, strategy_kind_from_str,
    validate_request, HealthStatus, OperatingRequest, PropertyRequest, RefinanceFrequency, SimulationRequest,
    SimulationResponse, StrategyRequest, StrategyResult, ValidationReport,
};
