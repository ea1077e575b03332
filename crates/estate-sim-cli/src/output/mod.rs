pub mod csv_out;
pub mod minimal;
pub mod table;

use std::error::Error;

use crate::OutputFormat;
use serde_json::Value;

/// Write a command result to stdout in the requested format.
///
/// JSON is pretty-printed as-is, so decimal amounts keep the string form the
/// core serialises them in. Serialisation failures are returned to the caller.
pub fn format_output(format: &OutputFormat, value: &Value) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
    Ok(())
}
