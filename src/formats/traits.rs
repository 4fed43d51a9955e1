//! Format trait definitions and error types.
//!
//! A format is one (schema, version) pair the codec can write and, for most
//! formats, read back. Implementations are stateless and shared across
//! threads through the [`FormatRegistry`](super::FormatRegistry).

use crate::model::{IntegrityError, Sbom};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;
use thiserror::Error;

/// Maximum number of leading bytes inspected when identifying content.
pub const SNIFF_WINDOW: usize = 1024 * 1024;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ============================================================================
// Format identity
// ============================================================================

/// Closed set of format families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormatId {
    #[serde(rename = "sbom-json")]
    SbomJson,
    #[serde(rename = "cyclonedx-json")]
    CycloneDxJson,
    #[serde(rename = "cyclonedx-xml")]
    CycloneDxXml,
    #[serde(rename = "spdx-json")]
    SpdxJson,
    #[serde(rename = "spdx-tag-value")]
    SpdxTagValue,
    #[serde(rename = "table")]
    Table,
}

impl FormatId {
    pub const ALL: [Self; 6] = [
        Self::SbomJson,
        Self::CycloneDxJson,
        Self::CycloneDxXml,
        Self::SpdxJson,
        Self::SpdxTagValue,
        Self::Table,
    ];

    /// Canonical lowercase name, as accepted on the command line.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SbomJson => "sbom-json",
            Self::CycloneDxJson => "cyclonedx-json",
            Self::CycloneDxXml => "cyclonedx-xml",
            Self::SpdxJson => "spdx-json",
            Self::SpdxTagValue => "spdx-tag-value",
            Self::Table => "table",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::SbomJson => "Native JSON",
            Self::CycloneDxJson => "CycloneDX JSON",
            Self::CycloneDxXml => "CycloneDX XML",
            Self::SpdxJson => "SPDX JSON",
            Self::SpdxTagValue => "SPDX tag-value",
            Self::Table => "Table",
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatId {
    type Err = FormatError;

    /// Parse a canonical name. Aliases are resolved by the registry.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == lower)
            .ok_or_else(|| FormatError::UnsupportedFormat {
                name: s.to_string(),
                suggestion: None,
            })
    }
}

/// A positive identification: format family plus detected schema version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identification {
    pub id: FormatId,
    pub version: String,
}

impl Identification {
    #[must_use]
    pub fn new(id: FormatId, version: impl Into<String>) -> Self {
        Self {
            id,
            version: version.into(),
        }
    }
}

impl fmt::Display for Identification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}@{}", self.id, self.version)
        }
    }
}

// ============================================================================
// Sniffing input
// ============================================================================

/// The leading window of an input, as seen by sniffers.
#[derive(Debug, Clone, Copy)]
pub struct ContentHead<'a> {
    bytes: &'a [u8],
    truncated: bool,
}

impl<'a> ContentHead<'a> {
    /// Take the sniff window of `input`, dropping a leading UTF-8 BOM.
    #[must_use]
    pub fn new(input: &'a [u8]) -> Self {
        let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
        let len = input.len().min(SNIFF_WINDOW);
        Self {
            bytes: &input[..len],
            truncated: input.len() > SNIFF_WINDOW,
        }
    }

    #[must_use]
    pub const fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Whether the input continues past the window.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// The window as text.
    ///
    /// A multi-byte character split by the window edge is dropped; any other
    /// invalid UTF-8 yields `None`.
    #[must_use]
    pub fn text(&self) -> Option<&'a str> {
        match std::str::from_utf8(self.bytes) {
            Ok(text) => Some(text),
            Err(e) if self.truncated && e.error_len().is_none() => {
                std::str::from_utf8(&self.bytes[..e.valid_up_to()]).ok()
            }
            Err(_) => None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Coarse error taxonomy, used to pick exit codes and user messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedFormat,
    UnidentifiableInput,
    MalformedDocument,
    IntegrityViolation,
    Io,
}

/// Errors produced by the format codecs and registry lookups.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("unsupported format '{name}'{}", suggestion_suffix(.suggestion.as_deref()))]
    UnsupportedFormat {
        name: String,
        suggestion: Option<String>,
    },

    #[error("format {0} does not support decoding")]
    DecodeUnsupported(FormatId),

    #[error("unable to identify the input format")]
    UnknownFormat,

    #[error("malformed {format} document: {reason}")]
    Malformed { format: FormatId, reason: String },

    #[error("unsupported {format} version '{version}' (supported: {supported})")]
    UnsupportedVersion {
        format: FormatId,
        version: String,
        supported: String,
    },

    #[error("failed to encode {format}: {reason}")]
    Encode { format: FormatId, reason: String },

    #[error("integrity violation: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn suggestion_suffix(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"))
}

impl FormatError {
    #[must_use]
    pub fn malformed(format: FormatId, reason: impl Into<String>) -> Self {
        Self::Malformed {
            format,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn encode(format: FormatId, reason: impl Into<String>) -> Self {
        Self::Encode {
            format,
            reason: reason.into(),
        }
    }

    /// Map a `serde_json` error raised while decoding.
    ///
    /// Reader failures stay I/O errors; everything else is a malformed document.
    #[must_use]
    pub fn from_json_decode(format: FormatId, err: serde_json::Error) -> Self {
        if err.is_io() {
            Self::Io(err.into())
        } else {
            Self::malformed(format, err.to_string())
        }
    }

    /// Map a `serde_json` error raised while encoding.
    #[must_use]
    pub fn from_json_encode(format: FormatId, err: serde_json::Error) -> Self {
        if err.is_io() {
            Self::Io(err.into())
        } else {
            Self::encode(format, err.to_string())
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat { .. } | Self::DecodeUnsupported(_) => {
                ErrorKind::UnsupportedFormat
            }
            Self::UnknownFormat => ErrorKind::UnidentifiableInput,
            Self::Malformed { .. } | Self::UnsupportedVersion { .. } => {
                ErrorKind::MalformedDocument
            }
            Self::Integrity(_) => ErrorKind::IntegrityViolation,
            Self::Io(_) | Self::Encode { .. } => ErrorKind::Io,
        }
    }
}

// ============================================================================
// Format trait
// ============================================================================

/// One registered (format family, schema version) codec.
///
/// `encode` must be deterministic for a given document: the only timestamp it
/// may emit is [`Sbom::created`]. `decode` never sniffs; callers identify the
/// input first.
pub trait Format: Send + Sync {
    fn id(&self) -> FormatId;

    /// Schema version this entry writes. Empty for unversioned formats.
    fn version(&self) -> &str;

    fn identity(&self) -> Identification {
        Identification::new(self.id(), self.version())
    }

    /// Structural check of the content head.
    ///
    /// Returns the detected schema version on a positive match. The detected
    /// version may differ from [`Format::version`]; the registry uses it to
    /// pick the best entry within the family.
    fn sniff(&self, head: &ContentHead<'_>) -> Option<String>;

    fn encode(&self, writer: &mut dyn Write, sbom: &Sbom) -> Result<(), FormatError>;

    fn can_decode(&self) -> bool {
        false
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<Sbom, FormatError> {
        let _ = reader;
        Err(FormatError::DecodeUnsupported(self.id()))
    }
}

impl fmt::Debug for dyn Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Format").field(&self.identity()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_id_names_roundtrip() {
        for id in FormatId::ALL {
            assert_eq!(id.as_str().parse::<FormatId>().ok(), Some(id));
            let json = serde_json::to_string(&id).expect("serialize");
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
    }

    #[test]
    fn test_identification_display() {
        assert_eq!(
            Identification::new(FormatId::CycloneDxJson, "1.5").to_string(),
            "cyclonedx-json@1.5"
        );
        assert_eq!(Identification::new(FormatId::Table, "").to_string(), "table");
    }

    #[test]
    fn test_content_head_strips_bom() {
        let head = ContentHead::new(b"\xEF\xBB\xBF{}");
        assert_eq!(head.bytes(), b"{}");
        assert!(!head.is_truncated());
    }

    #[test]
    fn test_content_head_window() {
        let input = vec![b' '; SNIFF_WINDOW + 10];
        let head = ContentHead::new(&input);
        assert_eq!(head.bytes().len(), SNIFF_WINDOW);
        assert!(head.is_truncated());
    }

    #[test]
    fn test_content_head_text_tolerates_split_char_only_when_truncated() {
        let mut input = vec![b'a'; SNIFF_WINDOW - 1];
        input.extend_from_slice("é".as_bytes());
        let head = ContentHead::new(&input);
        assert_eq!(head.text().map(str::len), Some(SNIFF_WINDOW - 1));

        let head = ContentHead::new(b"abc\xC3");
        assert_eq!(head.text(), None);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            FormatError::UnknownFormat.kind(),
            ErrorKind::UnidentifiableInput
        );
        assert_eq!(
            FormatError::DecodeUnsupported(FormatId::Table).kind(),
            ErrorKind::UnsupportedFormat
        );
        assert_eq!(
            FormatError::malformed(FormatId::SpdxJson, "bad").kind(),
            ErrorKind::MalformedDocument
        );
        let io = io::Error::new(io::ErrorKind::BrokenPipe, "pipe");
        assert_eq!(FormatError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = FormatError::UnsupportedFormat {
            name: "cyclonedx-jsn".to_string(),
            suggestion: Some("cyclonedx-json".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "unsupported format 'cyclonedx-jsn' (did you mean 'cyclonedx-json'?)"
        );
    }
}
