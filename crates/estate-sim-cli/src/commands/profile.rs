use clap::Args;
use serde_json::Value;

use estate_sim_core::profile::{analyze_profile, InvestmentProfile};

use crate::input;

/// Arguments for the profile report
#[derive(Args)]
pub struct ReportArgs {
    /// Path to JSON or YAML investment profile
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let profile: InvestmentProfile = input::read_input(args.input.as_deref(), "profile report")?;
    let result = analyze_profile(&profile)?;
    Ok(serde_json::to_value(result)?)
}
