pub mod config;
pub mod injection;

pub use config::{
    AcquisitionPricing, FirstPropertyType, StrategyConfig, StrategyKind, TrackingFrequency,
    MAX_HORIZON_PERIODS,
};
pub use injection::{due_injections, CapitalInjectionRule, InjectionFrequency};
