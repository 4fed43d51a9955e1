//! Native JSON format (`sbom-json`).
//!
//! A lossless serialization of the document model, versioned independently
//! of any external schema. Artifact IDs are written as-is and re-derived on
//! decode; relationship endpoints are remapped accordingly.

use super::detection::probe_json;
use super::traits::{ContentHead, Format, FormatError, FormatId};
use crate::model::{
    Descriptor, DocumentId, Endpoint, Language, Location, Package, PackageMetadata, PackageType,
    Relationship, RelationshipKind, ROOT_REFERENCE, Sbom, Source,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};

/// Schema version written by this crate.
pub const NATIVE_SCHEMA_VERSION: &str = "1.0.0";

/// Prefix of the schema URL; the version follows it.
pub const NATIVE_SCHEMA_URL_PREFIX: &str = "urn:sbom-convert:json:schema:";

const ID: FormatId = FormatId::SbomJson;

// ============================================================================
// Wire structures
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeDocument {
    schema: NativeSchema,
    document: NativeDocumentInfo,
    descriptor: Descriptor,
    source: Source,
    #[serde(default)]
    artifacts: Vec<NativeArtifact>,
    #[serde(default)]
    artifact_relationships: Vec<NativeRelationship>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NativeSchema {
    version: String,
    url: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct NativeDocumentInfo {
    id: DocumentId,
    created: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NativeArtifact {
    id: String,
    name: String,
    #[serde(default)]
    version: String,
    #[serde(rename = "type", default)]
    package_type: PackageType,
    #[serde(default)]
    language: Language,
    #[serde(default)]
    locations: Vec<Location>,
    #[serde(default)]
    licenses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
    #[serde(default, skip_serializing_if = "PackageMetadata::is_empty")]
    metadata: PackageMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
struct NativeRelationship {
    parent: String,
    child: String,
    #[serde(rename = "type")]
    kind: RelationshipKind,
}

// ============================================================================
// Format
// ============================================================================

/// The native JSON codec.
#[derive(Debug, Clone)]
pub struct NativeJsonFormat {
    version: String,
    pretty: bool,
}

impl NativeJsonFormat {
    #[must_use]
    pub fn new(version: &str, pretty: bool) -> Self {
        Self {
            version: version.to_string(),
            pretty,
        }
    }
}

impl Default for NativeJsonFormat {
    fn default() -> Self {
        Self::new(NATIVE_SCHEMA_VERSION, true)
    }
}

impl Format for NativeJsonFormat {
    fn id(&self) -> FormatId {
        ID
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn sniff(&self, head: &ContentHead<'_>) -> Option<String> {
        let keys = probe_json(head, &["schema"])?;
        let schema = keys.get("schema")?;
        let url = schema.get("url").and_then(serde_json::Value::as_str)?;
        let from_url = url.strip_prefix(NATIVE_SCHEMA_URL_PREFIX)?;

        let version = schema
            .get("version")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(from_url);
        Some(version.to_string())
    }

    fn encode(&self, writer: &mut dyn Write, sbom: &Sbom) -> Result<(), FormatError> {
        let document = to_native(sbom, &self.version);
        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &document)
        } else {
            serde_json::to_writer(&mut *writer, &document)
        };
        result.map_err(|e| FormatError::from_json_encode(ID, e))?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn can_decode(&self) -> bool {
        true
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<Sbom, FormatError> {
        let document: NativeDocument =
            serde_json::from_reader(reader).map_err(|e| FormatError::from_json_decode(ID, e))?;
        from_native(document)
    }
}

fn to_native(sbom: &Sbom, version: &str) -> NativeDocument {
    let artifacts = sbom
        .sorted_packages()
        .into_iter()
        .map(|p| NativeArtifact {
            id: p.id().to_string(),
            name: p.name().to_string(),
            version: p.version().to_string(),
            package_type: p.package_type(),
            language: p.language(),
            locations: p.locations().to_vec(),
            licenses: p.licenses().iter().cloned().collect(),
            purl: p.purl().map(str::to_string),
            metadata: p.metadata().clone(),
        })
        .collect();

    let mut relationships: Vec<&Relationship> = sbom.relationships().collect();
    relationships.sort();
    let artifact_relationships = relationships
        .into_iter()
        .map(|r| NativeRelationship {
            parent: r.from.to_string(),
            child: r.to.to_string(),
            kind: r.kind,
        })
        .collect();

    NativeDocument {
        schema: NativeSchema {
            version: version.to_string(),
            url: format!("{NATIVE_SCHEMA_URL_PREFIX}{version}"),
        },
        document: NativeDocumentInfo {
            id: sbom.id(),
            created: sbom.created(),
        },
        descriptor: sbom.descriptor().clone(),
        source: sbom.source().clone(),
        artifacts,
        artifact_relationships,
    }
}

fn check_schema_version(version: &str) -> Result<(), FormatError> {
    let unsupported = || FormatError::UnsupportedVersion {
        format: ID,
        version: version.to_string(),
        supported: "^1".to_string(),
    };
    let parsed = semver::Version::parse(version).map_err(|_| unsupported())?;
    if parsed.major == 1 {
        Ok(())
    } else {
        Err(unsupported())
    }
}

fn from_native(document: NativeDocument) -> Result<Sbom, FormatError> {
    check_schema_version(&document.schema.version)?;

    let mut builder = Sbom::builder(document.source)
        .id(document.document.id)
        .created(document.document.created)
        .descriptor(document.descriptor);

    let mut ids = HashMap::with_capacity(document.artifacts.len());
    for artifact in document.artifacts {
        if artifact.name.trim().is_empty() {
            return Err(FormatError::malformed(
                ID,
                format!("artifact {} has no name", artifact.id),
            ));
        }
        let mut package = Package::new(artifact.name, artifact.version, artifact.package_type)
            .with_locations(artifact.locations)
            .with_language(artifact.language);
        for license in artifact.licenses {
            package = package.with_license(license);
        }
        if let Some(purl) = artifact.purl {
            package = package.with_purl(purl);
        }
        for (key, value) in artifact.metadata {
            package = package.with_metadata(key, value);
        }
        let id = builder.add_package(package)?;
        ids.insert(artifact.id, id);
    }

    let resolve = |reference: &str| -> Result<Endpoint, FormatError> {
        if reference == ROOT_REFERENCE {
            return Ok(Endpoint::Root);
        }
        ids.get(reference)
            .map(Endpoint::from)
            .ok_or_else(|| {
                FormatError::malformed(
                    ID,
                    format!("relationship references unknown artifact '{reference}'"),
                )
            })
    };

    for rel in &document.artifact_relationships {
        let from = resolve(&rel.parent)?;
        let to = resolve(&rel.child)?;
        builder.add_relationship(Relationship::new(from, to, rel.kind))?;
    }

    Ok(builder.build())
}
