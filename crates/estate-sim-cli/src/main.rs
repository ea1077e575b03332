mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::presets::PresetsArgs;
use commands::profile::ReportArgs;
use commands::simulate::{CompareArgs, SimulateArgs, ValidateArgs};

/// Property portfolio growth simulation
#[derive(Parser)]
#[command(
    name = "esim",
    version,
    about = "Property portfolio growth simulation",
    long_about = "Simulate how a rental property portfolio grows month by month under \
                  cash-only, leveraged or mixed acquisition strategies, with optional \
                  refinancing, cash flow reinvestment and scheduled capital injections."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level written to stderr when RUST_LOG is unset
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every strategy of a request and return snapshots and events
    Simulate(SimulateArgs),
    /// Run every strategy of a request and rank the final positions
    Compare(CompareArgs),
    /// Check a request without running it
    Validate(ValidateArgs),
    /// List the built-in strategy presets
    Presets(PresetsArgs),
    /// Static acquisition and yield figures for one investment profile
    Report(ReportArgs),
    /// Report service health
    Health,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Compare(args) => commands::simulate::run_compare(args),
        Commands::Validate(args) => commands::simulate::run_validate(args),
        Commands::Presets(args) => commands::presets::run_presets(args),
        Commands::Report(args) => commands::profile::run_report(args),
        Commands::Health => commands::presets::run_health(),
        Commands::Version => {
            println!("esim {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result.and_then(|value| output::format_output(&cli.output, &value)) {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
