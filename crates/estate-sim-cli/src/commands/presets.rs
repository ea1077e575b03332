use clap::Args;
use serde_json::Value;

use estate_sim_core::api::{health, preset_by_name, strategy_presets};

/// Arguments for preset listing
#[derive(Args)]
pub struct PresetsArgs {
    /// Show a single preset by name
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run_presets(args: PresetsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    match args.name {
        Some(ref name) => Ok(serde_json::to_value(preset_by_name(name)?)?),
        None => Ok(serde_json::json!({ "presets": strategy_presets() })),
    }
}

pub fn run_health() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(health())?)
}
