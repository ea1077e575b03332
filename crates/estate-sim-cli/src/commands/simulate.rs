use clap::{Args, ValueEnum};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info};

use estate_sim_core::api::{
    compare_request, preset_by_name, simulate_request, validate_request, SimulationRequest,
};
use estate_sim_core::strategy::TrackingFrequency;
use estate_sim_core::{with_metadata, Period};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TrackingArg {
    Monthly,
    Yearly,
}

impl From<TrackingArg> for TrackingFrequency {
    fn from(arg: TrackingArg) -> Self {
        match arg {
            TrackingArg::Monthly => TrackingFrequency::Monthly,
            TrackingArg::Yearly => TrackingFrequency::Yearly,
        }
    }
}

/// Arguments shared by simulate and compare
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON or YAML request file
    #[arg(long)]
    pub input: Option<String>,

    /// Append a built-in preset to the request's strategies (repeatable)
    #[arg(long)]
    pub preset: Vec<String>,

    /// Override the horizon of every strategy, in months
    #[arg(long)]
    pub months: Option<Period>,

    /// Override the snapshot cadence of every strategy
    #[arg(long, value_enum)]
    pub tracking: Option<TrackingArg>,
}

pub type CompareArgs = SimulateArgs;

/// Arguments for request validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to JSON or YAML request file
    #[arg(long)]
    pub input: Option<String>,
}

fn load_request(args: &SimulateArgs) -> Result<SimulationRequest, Box<dyn std::error::Error>> {
    let mut request: SimulationRequest =
        input::read_input(args.input.as_deref(), "portfolio simulation")?;

    for name in &args.preset {
        let preset = preset_by_name(name)?;
        debug!(preset = %preset.name, "appending preset strategy");
        request.strategies.push(preset.config);
    }

    for strategy in &mut request.strategies {
        if let Some(months) = args.months {
            strategy.simulation_months = months;
        }
        if let Some(tracking) = args.tracking {
            strategy.tracking_frequency = tracking.into();
        }
    }

    Ok(request)
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let request = load_request(&args)?;
    let response = simulate_request(&request)?;

    let warnings: Vec<String> = response
        .results
        .iter()
        .filter_map(|r| {
            r.summary
                .termination_reason
                .as_ref()
                .map(|reason| format!("{} terminated early: {reason}", r.strategy_name))
        })
        .collect();

    let elapsed = start.elapsed().as_micros() as u64;
    info!(
        strategies = response.results.len(),
        elapsed_us = elapsed,
        "simulation request finished"
    );

    let output = with_metadata(
        "Monthly property portfolio simulation",
        &request,
        warnings,
        elapsed,
        response,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = load_request(&args)?;
    let result = compare_request(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: SimulationRequest =
        input::read_input(args.input.as_deref(), "request validation")?;
    let report = validate_request(&request);
    Ok(serde_json::to_value(report)?)
}
