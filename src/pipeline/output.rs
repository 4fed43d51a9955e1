//! Output destinations for the convert pipeline.
//!
//! A destination is written as `<format>[@<version>][=<path>]`. Every
//! destination is resolved before anything is encoded; encoding then runs in
//! parallel and each file is replaced atomically.

use crate::error::{DestinationFailure, Result, SbomError};
use crate::formats::{encode_to_vec, Format, FormatRegistry};
use crate::model::Sbom;
use rayon::prelude::*;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Target for output - either stdout or a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to stdout
    Stdout,
    /// Write to a file
    File(PathBuf),
}

impl OutputTarget {
    /// Create output target from optional path
    #[must_use]
    pub fn from_option(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Stdout, Self::File)
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("<stdout>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

// ============================================================================
// Destination parsing
// ============================================================================

/// A destination as written by the user, not yet resolved against a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSpec {
    raw: String,
    format: String,
    path: Option<PathBuf>,
}

impl DestinationSpec {
    /// Format name, including any `@<version>` suffix.
    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Output file; `None` means stdout.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for DestinationSpec {
    type Err = SbomError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        let (format, path) = match raw.split_once('=') {
            Some((format, path)) => {
                let path = path.trim();
                if path.is_empty() {
                    return Err(SbomError::validation(format!(
                        "destination '{raw}' has an empty path"
                    )));
                }
                (format.trim(), Some(PathBuf::from(path)))
            }
            None => (raw, None),
        };
        if format.is_empty() {
            return Err(SbomError::validation(format!(
                "destination '{raw}' does not name a format"
            )));
        }
        Ok(Self {
            raw: raw.to_string(),
            format: format.to_string(),
            path,
        })
    }
}

impl fmt::Display for DestinationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ============================================================================
// Resolved destinations
// ============================================================================

/// A destination bound to a registered format.
#[derive(Clone)]
pub struct Destination {
    spec: DestinationSpec,
    format: Arc<dyn Format>,
    target: OutputTarget,
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("spec", &self.spec.raw)
            .field("format", &self.format.identity().to_string())
            .field("target", &self.target)
            .finish()
    }
}

impl Destination {
    #[must_use]
    pub const fn spec(&self) -> &DestinationSpec {
        &self.spec
    }

    #[must_use]
    pub fn format(&self) -> &dyn Format {
        self.format.as_ref()
    }

    #[must_use]
    pub const fn target(&self) -> &OutputTarget {
        &self.target
    }

    /// Encode and, for file targets, write. Stdout bytes are handed back so
    /// the caller can write them on its own thread.
    fn emit(&self, sbom: &Sbom, quiet: bool) -> Result<Option<Vec<u8>>> {
        let bytes = encode_to_vec(self.format.as_ref(), sbom)
            .map_err(|e| SbomError::format(format!("encoding {}", self.format.identity()), e))?;
        match &self.target {
            OutputTarget::Stdout => Ok(Some(bytes)),
            OutputTarget::File(path) => {
                write_atomic(path, &bytes)?;
                if !quiet {
                    tracing::info!("Wrote {} to {}", self.format.identity(), path.display());
                }
                Ok(None)
            }
        }
    }
}

/// Resolve every destination against `registry`.
///
/// Fails on the first unknown format or unparseable destination, and when
/// more than one destination writes to stdout.
pub fn resolve_destinations(
    registry: &FormatRegistry,
    destinations: &[String],
) -> Result<Vec<Destination>> {
    let mut resolved = Vec::with_capacity(destinations.len());
    for raw in destinations {
        let spec: DestinationSpec = raw.parse()?;
        let format = registry
            .by_name(spec.format())
            .map_err(|e| SbomError::format(format!("destination '{spec}'"), e))?;
        let target = OutputTarget::from_option(spec.path.clone());
        resolved.push(Destination {
            spec,
            format,
            target,
        });
    }

    let stdout_count = resolved
        .iter()
        .filter(|d| d.target == OutputTarget::Stdout)
        .count();
    if stdout_count > 1 {
        return Err(SbomError::validation(format!(
            "at most one destination may write to stdout, got {stdout_count}"
        )));
    }
    Ok(resolved)
}

/// Encode `sbom` to every destination.
///
/// Destinations are independent: a failure does not stop or roll back the
/// others. All failures are reported together as
/// [`SbomError::Destinations`].
pub fn write_destinations(
    sbom: &Sbom,
    destinations: &[Destination],
    stdout: &mut dyn Write,
    quiet: bool,
) -> Result<()> {
    let results: Vec<Result<Option<Vec<u8>>>> = destinations
        .par_iter()
        .map(|destination| destination.emit(sbom, quiet))
        .collect();

    let mut failures = Vec::new();
    for (destination, result) in destinations.iter().zip(results) {
        let written = result.and_then(|bytes| match bytes {
            Some(bytes) => stdout
                .write_all(&bytes)
                .and_then(|()| stdout.flush())
                .map_err(SbomError::from),
            None => Ok(()),
        });
        if let Err(error) = written {
            tracing::debug!("Destination {} failed: {}", destination.spec, error);
            failures.push(DestinationFailure {
                destination: destination.spec.to_string(),
                error,
            });
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(SbomError::Destinations(failures))
    }
}

/// Replace `path` with `bytes` through a sibling temp file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(parent).map_err(|e| SbomError::io(path, e))?;
    file.write_all(bytes).map_err(|e| SbomError::io(path, e))?;
    file.as_file().sync_all().map_err(|e| SbomError::io(path, e))?;
    file.persist(path).map_err(|e| SbomError::io(path, e.error))?;
    Ok(())
}
