//! SBOM format codecs.
//!
//! Every supported schema is a [`Format`]: a stateless codec identified by
//! `(FormatId, version)` that can encode a [`Sbom`] and, except for the
//! human-readable table, decode one back.
//!
//! ## Format Identification
//!
//! [`identify`] inspects raw bytes structurally (JSON discriminator keys, the
//! XML root element, the leading tag-value line) and reports which format
//! produced them. Formats are tried in registry order; the first match wins.
//!
//! ## Usage
//!
//! ```no_run
//! use sbom_convert::formats::{self, FormatId};
//!
//! let bytes = std::fs::read("sbom.json").unwrap();
//! let (found, sbom) = formats::registry().decode(&bytes).unwrap();
//! println!("read {} packages from {found}", sbom.package_count());
//!
//! let spdx = formats::registry().by_id(FormatId::SpdxJson).unwrap();
//! spdx.encode(&mut std::io::stdout(), &sbom).unwrap();
//! ```

pub mod cyclonedx;
mod detection;
#[cfg(test)]
mod fixtures;
pub mod native;
mod registry;
pub mod spdx;
pub mod table;
mod traits;

pub use registry::{FormatRegistry, FormatRegistryBuilder, RegistryError};
pub use traits::{
    ContentHead, ErrorKind, Format, FormatError, FormatId, Identification, SNIFF_WINDOW,
};

use crate::model::Sbom;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Prefix of the tool-owned properties and annotations the codecs emit.
pub(crate) const PROPERTY_PREFIX: &str = "sbom-convert:";

/// Default base URI of generated SPDX document namespaces.
pub const DEFAULT_SPDX_NAMESPACE_BASE: &str = "https://spdx.org/spdxdocs";

/// Encoder settings shared by the built-in formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Version `cyclonedx-json` / `cyclonedx-xml` resolve to
    pub cyclonedx_version: String,
    /// Version `spdx-json` / `spdx-tag-value` resolve to
    pub spdx_version: String,
    /// Base URI of SPDX document namespaces
    pub spdx_namespace_base: String,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            cyclonedx_version: cyclonedx::DEFAULT_VERSION.to_string(),
            spdx_version: spdx::DEFAULT_VERSION.to_string(),
            spdx_namespace_base: DEFAULT_SPDX_NAMESPACE_BASE.to_string(),
            pretty: true,
        }
    }
}

static REGISTRY: OnceLock<FormatRegistry> = OnceLock::new();

/// The process-wide registry of built-in formats with default options.
///
/// # Panics
///
/// Panics on first use if two built-in formats share an identity, which is a
/// programming error.
pub fn registry() -> &'static FormatRegistry {
    REGISTRY.get_or_init(|| {
        FormatRegistry::builtin(&FormatOptions::default())
            .expect("built-in format registrations must be unique")
    })
}

/// Identify raw content against the built-in formats.
#[must_use]
pub fn identify(input: &[u8]) -> Option<Identification> {
    registry().identify(input)
}

/// Look up a built-in format by name or alias.
pub fn by_name(name: &str) -> Result<Arc<dyn Format>, FormatError> {
    registry().by_name(name)
}

/// Identify and decode raw content with the built-in formats.
pub fn decode(input: &[u8]) -> Result<Sbom, FormatError> {
    registry().decode(input).map(|(_, sbom)| sbom)
}

/// Encode a document into an in-memory buffer.
pub fn encode_to_vec(format: &dyn Format, sbom: &Sbom) -> Result<Vec<u8>, FormatError> {
    let mut buffer = Vec::new();
    format.encode(&mut buffer, sbom)?;
    Ok(buffer)
}
