//! Synthetic identifiers for artifacts and documents.
//!
//! Artifact identifiers are content-derived: they hash the identity-bearing
//! fields of a package (name, version, type and locations), so decoding a
//! previously encoded document reproduces the same identifiers without any
//! schema needing to carry them. Document identifiers are UUIDs, either
//! freshly generated or derived from a foreign document's own identity.

use super::package::{Location, PackageType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use xxhash_rust::xxh3::xxh3_64;

/// Field separator used when building hash input (ASCII unit separator).
const FIELD_SEPARATOR: u8 = 0x1f;

/// Stable synthetic identifier for an artifact within a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Derive the identifier for the given identity fields.
    ///
    /// `salt` is zero for the first derivation and is only bumped when two
    /// different artifacts collide on the same 64-bit hash.
    #[must_use]
    pub fn derive(
        name: &str,
        version: &str,
        package_type: PackageType,
        locations: &[Location],
        salt: u32,
    ) -> Self {
        let mut input = Vec::with_capacity(64);
        input.extend_from_slice(name.as_bytes());
        input.push(FIELD_SEPARATOR);
        input.extend_from_slice(version.as_bytes());
        input.push(FIELD_SEPARATOR);
        input.extend_from_slice(package_type.as_str().as_bytes());
        for location in locations {
            input.push(FIELD_SEPARATOR);
            input.extend_from_slice(location.path.as_bytes());
            if let Some(layer) = &location.layer_id {
                input.push(b'@');
                input.extend_from_slice(layer.as_bytes());
            }
        }
        if salt > 0 {
            input.push(FIELD_SEPARATOR);
            input.extend_from_slice(&salt.to_le_bytes());
        }

        Self(format!("{:016x}", xxh3_64(&input)))
    }

    /// Wrap an identifier read back from a serialized document.
    pub(crate) const fn from_raw(value: String) -> Self {
        Self(value)
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArtifactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Document-level unique identifier.
///
/// Drives schema-mandated document identities such as the `CycloneDX`
/// `serialNumber` and the SPDX `documentNamespace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a new random document identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derive a stable identifier from an arbitrary name (UUID v5, URL namespace).
    ///
    /// Used for foreign documents whose own identity is not a UUID.
    #[must_use]
    pub fn derive(name: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()))
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Find a UUID at the end of `value` (e.g. an SPDX namespace suffix).
    #[must_use]
    pub fn from_suffix(value: &str) -> Option<Self> {
        const UUID_LEN: usize = 36;
        let start = value.len().checked_sub(UUID_LEN)?;
        let tail = value.get(start..)?;
        Uuid::parse_str(tail).ok().map(Self)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
