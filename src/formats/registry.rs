//! Format registry.
//!
//! The registry is an ordered, immutable list of format entries keyed by
//! `(FormatId, version)`. Registration order is also sniff priority. A
//! registry is assembled once through [`FormatRegistryBuilder`]; nothing can
//! be appended afterwards.

use super::cyclonedx::{CycloneDxJsonFormat, CycloneDxXmlFormat, CYCLONEDX_VERSIONS};
use super::native::{NativeJsonFormat, NATIVE_SCHEMA_VERSION};
use super::spdx::{SpdxJsonFormat, SpdxTagValueFormat, SPDX_VERSIONS};
use super::table::TableFormat;
use super::traits::{Format, FormatError, FormatId, Identification};
use super::FormatOptions;
use crate::model::Sbom;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use thiserror::Error;

/// Alternative names accepted by [`FormatRegistry::by_name`].
const ALIASES: &[(&str, FormatId)] = &[
    ("json", FormatId::SbomJson),
    ("native", FormatId::SbomJson),
    ("cyclonedx", FormatId::CycloneDxJson),
    ("cdx", FormatId::CycloneDxJson),
    ("cyclone", FormatId::CycloneDxJson),
    ("cdx-json", FormatId::CycloneDxJson),
    ("cdx-xml", FormatId::CycloneDxXml),
    ("spdx", FormatId::SpdxTagValue),
    ("spdx-tv", FormatId::SpdxTagValue),
    ("text", FormatId::Table),
    ("tbl", FormatId::Table),
];

/// Maximum edit distance for a "did you mean" suggestion.
const SUGGESTION_DISTANCE: usize = 3;

/// Errors raised while assembling a registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("format {id}@{version} is already registered")]
    Duplicate { id: FormatId, version: String },

    #[error("default version {version} for {id} is not registered")]
    UnknownDefault { id: FormatId, version: String },
}

/// Ordered, immutable set of format entries.
#[derive(Clone)]
pub struct FormatRegistry {
    formats: Vec<Arc<dyn Format>>,
    defaults: HashMap<FormatId, usize>,
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.formats.iter().map(|format| format.identity().to_string()))
            .finish()
    }
}

impl FormatRegistry {
    #[must_use]
    pub fn builder() -> FormatRegistryBuilder {
        FormatRegistryBuilder::default()
    }

    /// Registry with every built-in format.
    ///
    /// Families are registered newest version first; `options` picks which
    /// version `by_id` and unversioned names resolve to.
    pub fn builtin(options: &FormatOptions) -> Result<Self, RegistryError> {
        let mut builder = Self::builder().register(Arc::new(NativeJsonFormat::new(
            NATIVE_SCHEMA_VERSION,
            options.pretty,
        )))?;

        for version in CYCLONEDX_VERSIONS {
            builder = builder.register(Arc::new(CycloneDxJsonFormat::new(version, options)))?;
        }
        for version in CYCLONEDX_VERSIONS {
            builder = builder.register(Arc::new(CycloneDxXmlFormat::new(version, options)))?;
        }
        for version in SPDX_VERSIONS {
            builder = builder.register(Arc::new(SpdxJsonFormat::new(version, options)))?;
        }
        for version in SPDX_VERSIONS {
            builder = builder.register(Arc::new(SpdxTagValueFormat::new(version, options)))?;
        }

        builder
            .register(Arc::new(TableFormat))?
            .default_version(FormatId::CycloneDxJson, &options.cyclonedx_version)
            .default_version(FormatId::CycloneDxXml, &options.cyclonedx_version)
            .default_version(FormatId::SpdxJson, &options.spdx_version)
            .default_version(FormatId::SpdxTagValue, &options.spdx_version)
            .build()
    }

    /// Every entry, in registration order.
    #[must_use]
    pub fn all(&self) -> &[Arc<dyn Format>] {
        &self.formats
    }

    /// Every entry that can decode, in registration order.
    pub fn decoders(&self) -> impl Iterator<Item = &Arc<dyn Format>> {
        self.formats.iter().filter(|f| f.can_decode())
    }

    /// Exact `(id, version)` lookup.
    #[must_use]
    pub fn get(&self, id: FormatId, version: &str) -> Option<Arc<dyn Format>> {
        self.formats
            .iter()
            .find(|f| f.id() == id && f.version() == version)
            .cloned()
    }

    /// Default entry for a family.
    #[must_use]
    pub fn by_id(&self, id: FormatId) -> Option<Arc<dyn Format>> {
        self.defaults
            .get(&id)
            .and_then(|&index| self.formats.get(index))
            .or_else(|| self.formats.iter().find(|f| f.id() == id))
            .cloned()
    }

    /// Resolve a user-supplied name such as `cyclonedx`, `SPDX-JSON` or
    /// `cyclonedx-xml@1.4`.
    pub fn by_name(&self, name: &str) -> Result<Arc<dyn Format>, FormatError> {
        let lower = name.trim().to_lowercase();
        let (family, version) = match lower.split_once('@') {
            Some((family, version)) => (family.trim(), Some(version.trim())),
            None => (lower.as_str(), None),
        };

        let found = resolve_family(family).and_then(|id| match version {
            Some(version) => self.get(id, version),
            None => self.by_id(id),
        });

        found.ok_or_else(|| FormatError::UnsupportedFormat {
            name: name.trim().to_string(),
            suggestion: self.suggest(&lower),
        })
    }

    /// Identify raw content. See [`detection`](super::detection).
    #[must_use]
    pub fn identify(&self, input: &[u8]) -> Option<Identification> {
        super::detection::identify_entry(self, input).map(|(_, identification)| identification)
    }

    /// Identify and decode raw content.
    pub fn decode(&self, input: &[u8]) -> Result<(Identification, Sbom), FormatError> {
        let (format, identification) =
            super::detection::identify_entry(self, input).ok_or(FormatError::UnknownFormat)?;
        if !format.can_decode() {
            return Err(FormatError::DecodeUnsupported(identification.id));
        }
        let mut reader: &[u8] = input;
        let sbom = format.decode(&mut reader as &mut dyn Read)?;
        Ok((identification, sbom))
    }

    /// All names `by_name` accepts without a version, canonical names first.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for format in &self.formats {
            let canonical = format.id().as_str().to_string();
            if !names.contains(&canonical) {
                names.push(canonical);
            }
        }
        for (alias, id) in ALIASES {
            if self.by_id(*id).is_some() {
                names.push((*alias).to_string());
            }
        }
        names
    }

    /// Aliases that resolve to `id`.
    #[must_use]
    pub fn aliases_of(id: FormatId) -> Vec<&'static str> {
        ALIASES
            .iter()
            .filter(|(_, target)| *target == id)
            .map(|(alias, _)| *alias)
            .collect()
    }

    fn suggest(&self, name: &str) -> Option<String> {
        let mut candidates = self.names();
        candidates.extend(self.formats.iter().filter(|f| !f.version().is_empty()).map(
            |f| format!("{}@{}", f.id(), f.version()),
        ));

        candidates
            .into_iter()
            .map(|candidate| (strsim::levenshtein(name, &candidate), candidate))
            .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, candidate)| candidate)
    }
}

fn resolve_family(name: &str) -> Option<FormatId> {
    FormatId::ALL
        .into_iter()
        .find(|id| id.as_str() == name)
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == name)
                .map(|(_, id)| *id)
        })
}

/// Builder for [`FormatRegistry`].
#[derive(Default)]
#[must_use]
pub struct FormatRegistryBuilder {
    formats: Vec<Arc<dyn Format>>,
    defaults: Vec<(FormatId, String)>,
}

impl FormatRegistryBuilder {
    /// Append a format. Fails when `(id, version)` is already taken.
    pub fn register(mut self, format: Arc<dyn Format>) -> Result<Self, RegistryError> {
        let duplicate = self
            .formats
            .iter()
            .any(|f| f.id() == format.id() && f.version() == format.version());
        if duplicate {
            return Err(RegistryError::Duplicate {
                id: format.id(),
                version: format.version().to_string(),
            });
        }
        self.formats.push(format);
        Ok(self)
    }

    /// Choose the entry `by_id` returns for a family.
    pub fn default_version(mut self, id: FormatId, version: &str) -> Self {
        self.defaults.push((id, version.to_string()));
        self
    }

    pub fn build(self) -> Result<FormatRegistry, RegistryError> {
        let mut defaults = HashMap::new();
        for (id, version) in self.defaults {
            let index = self
                .formats
                .iter()
                .position(|f| f.id() == id && f.version() == version)
                .ok_or_else(|| RegistryError::UnknownDefault {
                    id,
                    version: version.clone(),
                })?;
            defaults.insert(id, index);
        }
        Ok(FormatRegistry {
            formats: self.formats,
            defaults,
        })
    }
}
