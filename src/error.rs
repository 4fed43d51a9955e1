//! Unified error types for sbom-convert.
//!
//! Codec failures carry their own taxonomy ([`FormatError`]); this module wraps
//! them with the context of the operation that failed (which input, which
//! destination) for the pipeline and CLI.

use crate::formats::{ErrorKind, FormatError};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sbom-convert operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SbomError {
    /// Identification, decoding or encoding failed
    #[error("{}{source}", context_prefix(.context))]
    Format {
        context: String,
        #[source]
        source: FormatError,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid arguments or missing values
    #[error("Validation failed: {0}")]
    Validation(String),

    /// One or more output destinations failed; the others were written
    #[error("{}", DestinationSummary(.0))]
    Destinations(Vec<DestinationFailure>),
}

/// A destination that could not be written.
#[derive(Error, Debug)]
#[error("{destination}: {error}")]
pub struct DestinationFailure {
    /// The destination as requested (`format[@version][=path]`)
    pub destination: String,
    #[source]
    pub error: SbomError,
}

fn context_prefix(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!("{context}: ")
    }
}

struct DestinationSummary<'a>(&'a [DestinationFailure]);

impl fmt::Display for DestinationSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} destination(s) failed", self.0.len())?;
        for failure in self.0 {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for sbom-convert operations
pub type Result<T> = std::result::Result<T, SbomError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl SbomError {
    /// Wrap a codec error with context
    pub fn format(context: impl Into<String>, source: FormatError) -> Self {
        Self::Format {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            message: source.to_string(),
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The codec error kind behind this error, if any.
    ///
    /// For an aggregate destination failure this is the kind of the first
    /// failure.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Format { source, .. } => Some(source.kind()),
            Self::Io { .. } => Some(ErrorKind::Io),
            Self::Destinations(failures) => failures.first().and_then(|f| f.error.kind()),
            Self::Config(_) | Self::Validation(_) => None,
        }
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for SbomError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<FormatError> for SbomError {
    fn from(err: FormatError) -> Self {
        Self::format(String::new(), err)
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings chain outermost-first, so a failure reads as the path
/// through the code that led to it.
///
/// ```
/// use sbom_convert::error::{ErrorContext, Result};
///
/// fn load(bytes: &[u8]) -> Result<sbom_convert::model::Sbom> {
///     sbom_convert::formats::decode(bytes).context("decoding input")
/// }
///
/// assert!(load(b"not an sbom").is_err());
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, only evaluated on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<SbomError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

fn add_context_to_error(err: SbomError, new_ctx: &str) -> SbomError {
    match err {
        SbomError::Format { context, source } => SbomError::Format {
            context: chain_context(new_ctx, &context),
            source,
        },
        SbomError::Io {
            path,
            message,
            source,
        } => SbomError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        SbomError::Config(msg) => SbomError::Config(chain_context(new_ctx, &msg)),
        SbomError::Validation(msg) => SbomError::Validation(chain_context(new_ctx, &msg)),
        SbomError::Destinations(failures) => SbomError::Destinations(failures),
    }
}

/// Chain two context strings: `"new: existing"`, or just `new`.
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}
