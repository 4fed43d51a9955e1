//! Convert command handler.
//!
//! Implements the `convert` subcommand: read one SBOM, write it to one or more
//! destinations.

use crate::config::AppConfig;
use crate::pipeline::{convert, exit_code_for, exit_codes, InputSource};
use anyhow::Result;
use std::path::Path;

/// Destination used when neither the command line nor the config names one.
pub const DEFAULT_DESTINATION: &str = "table";

/// Run the convert command, returning the process exit code.
///
/// `config` already carries any `-o` destinations merged over the file
/// values.
pub fn run_convert(input: &Path, config: &AppConfig) -> Result<i32> {
    let destinations = effective_destinations(config);
    let source = InputSource::from_arg(input);

    let mut stdout = std::io::stdout().lock();
    match convert(&source, &destinations, config, &mut stdout) {
        Ok(summary) => {
            tracing::debug!(
                "Converted {} ({}) to {}",
                source,
                summary.input_format,
                summary.destinations.join(", ")
            );
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            Ok(exit_code_for(&e))
        }
    }
}

fn effective_destinations(config: &AppConfig) -> Vec<String> {
    if config.output.destinations.is_empty() {
        vec![DEFAULT_DESTINATION.to_string()]
    } else {
        config.output.destinations.clone()
    }
}
