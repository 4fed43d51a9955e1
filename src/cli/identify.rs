//! Identify command handler.
//!
//! Reports which registered format produced each input, without decoding.

use crate::config::AppConfig;
use crate::error::SbomError;
use crate::formats::Identification;
use crate::pipeline::{exit_code_for, exit_codes, identify, InputSource};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

/// One line of `identify` output.
#[derive(Debug, Serialize)]
struct IdentifyRow {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Identification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run the identify command, returning the process exit code.
///
/// The exit code is the most severe code of any input, so a single
/// unidentifiable file makes the run fail.
pub fn run_identify(inputs: &[PathBuf], json: bool, config: &AppConfig) -> Result<i32> {
    let mut rows = Vec::with_capacity(inputs.len());
    let mut exit_code = exit_codes::SUCCESS;

    for input in inputs {
        let source = InputSource::from_arg(input);
        let row = match identify(&source, config) {
            Ok(found) => IdentifyRow {
                input: source.to_string(),
                format: Some(found),
                error: None,
            },
            Err(e) => {
                exit_code = exit_code.max(exit_code_for(&e));
                IdentifyRow {
                    input: source.to_string(),
                    format: None,
                    error: Some(describe(&e)),
                }
            }
        };
        rows.push(row);
    }

    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &rows).context("failed to write JSON")?;
        writeln!(stdout)?;
    } else {
        for row in &rows {
            match (&row.format, &row.error) {
                (Some(format), _) => writeln!(stdout, "{}: {format}", row.input)?,
                (None, Some(error)) => writeln!(stdout, "{}: {error}", row.input)?,
                (None, None) => writeln!(stdout, "{}: unknown", row.input)?,
            }
        }
    }
    Ok(exit_code)
}

fn describe(err: &SbomError) -> String {
    match err {
        SbomError::Format { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}
