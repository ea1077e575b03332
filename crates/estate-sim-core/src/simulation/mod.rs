pub mod acquisition;
pub mod compare;
pub mod engine;
pub mod events;
pub mod refinance;
pub mod snapshot;
pub mod state;
pub mod yields;

pub use compare::{
    compare_strategies, run_batch, summarize_jobs, NamedStrategy, SimulationJob, StrategyComparison,
    StrategySummary,
};
pub use engine::{run_simulation, simulate, SimulationOutcome, Simulator};
pub use events::{
    CapitalInjectionEvent, PeriodEvents, PortfolioEvent, PropertyPurchase, RefinancingEvent,
    TimelineEvent,
};
pub use snapshot::{PortfolioSummary, Snapshot};
pub use state::{PortfolioState, PropertyRecord};
pub use yields::{PortfolioYields, PropertyYields};
