//! Conversion pipeline: read → identify → decode → encode to each destination.
//!
//! Decoders and encoders never call each other; every conversion goes through
//! the [`Sbom`](crate::model::Sbom) document model.

mod input;
mod output;

pub use input::InputSource;
pub use output::{
    resolve_destinations, write_destinations, Destination, DestinationSpec, OutputTarget,
};

use crate::config::AppConfig;
use crate::error::{ErrorContext, Result, SbomError};
use crate::formats::{ErrorKind, FormatError, Identification};
use std::io::Write;

/// Exit codes of the command-line tool.
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// The input format could not be identified
    pub const UNKNOWN_FORMAT: i32 = 1;
    /// Unsupported format or malformed input
    pub const INVALID_INPUT: i32 = 2;
    /// Any other error
    pub const ERROR: i32 = 3;
}

/// Map an error to the process exit code.
#[must_use]
pub fn exit_code_for(err: &SbomError) -> i32 {
    match err.kind() {
        Some(ErrorKind::UnidentifiableInput) => exit_codes::UNKNOWN_FORMAT,
        Some(
            ErrorKind::UnsupportedFormat
            | ErrorKind::MalformedDocument
            | ErrorKind::IntegrityViolation,
        ) => exit_codes::INVALID_INPUT,
        Some(ErrorKind::Io) | None => exit_codes::ERROR,
    }
}

/// What a successful conversion read and wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Format the input was identified as
    pub input_format: Identification,
    pub package_count: usize,
    pub relationship_count: usize,
    /// Destinations written, as requested
    pub destinations: Vec<String>,
}

/// Convert `input` to every destination in `destinations`.
///
/// Destinations are resolved against the registry built from `config` before
/// the input is read, so a typo never costs a decode.
pub fn convert(
    input: &InputSource,
    destinations: &[String],
    config: &AppConfig,
    stdout: &mut dyn Write,
) -> Result<ConvertSummary> {
    if destinations.is_empty() {
        return Err(SbomError::validation("no output destinations given"));
    }

    let registry = config
        .registry()
        .map_err(|e| SbomError::config(e.to_string()))?;
    let resolved = resolve_destinations(&registry, destinations)?;

    let bytes = input.read(config.input.max_bytes)?;
    let (input_format, sbom) = registry
        .decode(&bytes)
        .with_context(|| format!("reading {input}"))?;

    let quiet = config.behavior.quiet;
    if !quiet {
        tracing::info!(
            "Read {} as {} ({} packages, {} relationships)",
            input,
            input_format,
            sbom.package_count(),
            sbom.relationship_count()
        );
    }

    write_destinations(&sbom, &resolved, stdout, quiet)?;

    Ok(ConvertSummary {
        input_format,
        package_count: sbom.package_count(),
        relationship_count: sbom.relationship_count(),
        destinations: resolved.iter().map(|d| d.spec().to_string()).collect(),
    })
}

/// Identify a single input without decoding it.
pub fn identify(input: &InputSource, config: &AppConfig) -> Result<Identification> {
    let registry = config
        .registry()
        .map_err(|e| SbomError::config(e.to_string()))?;
    let bytes = input.read(config.input.max_bytes)?;
    registry
        .identify(&bytes)
        .ok_or(FormatError::UnknownFormat)
        .with_context(|| format!("identifying {input}"))
}
