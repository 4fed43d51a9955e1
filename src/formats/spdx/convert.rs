//! Conversion between [`Sbom`] and the SPDX document model.
//!
//! SPDX has no slot for package type, language or locations, so those travel
//! in one tool annotation per package (`sbom-convert:package=<json>`). The
//! source description travels in a document annotation
//! (`sbom-convert:source=<json>`). Package fields the model does not type are
//! kept as `spdx:<field>` metadata and written back on encode.
//!
//! Annotation payloads escape `/` as `\/`, so no payload can contain
//! `</text>` and end a tag-value text block early. A `sbom-convert:*`
//! annotation whose payload does not parse is malformed.

use super::document::{
    is_unset, CreationInfo, ExternalRef, ExtractedLicense, SpdxAnnotation, SpdxDocument,
    SpdxPackage, SpdxRelationship, ANNOTATION_TYPE_OTHER, DATA_LICENSE, DOCUMENT_SPDX_ID,
    FILES_ANALYZED_FIELD, NOASSERTION, NONE, PACKAGE_MANAGER_CATEGORY, PURL_REFERENCE_TYPE,
};
use super::SPDX_VERSIONS;
use crate::formats::traits::{FormatError, FormatId};
use crate::formats::PROPERTY_PREFIX;
use crate::model::{
    derive_purl, is_spdx_expression, package_type_from_purl, Descriptor, DocumentId, Endpoint,
    Location, Package, Relationship, RelationshipKind, Sbom, Source, SourceKind,
};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;
use tracing::debug;

/// Metadata key prefix for SPDX package fields without a model counterpart.
pub const METADATA_PREFIX: &str = "spdx:";

const EXTERNAL_REFS_FIELD: &str = "externalRefs";
const LICENSE_CONCLUDED_FIELD: &str = "licenseConcluded";

/// Package fields the converter owns; `spdx:*` metadata never overrides them.
const TYPED_FIELDS: [&str; 5] = [
    "SPDXID",
    "name",
    "versionInfo",
    "licenseDeclared",
    "annotations",
];

const PACKAGE_ANNOTATION: &str = "package=";
const SOURCE_ANNOTATION: &str = "source=";

static ID_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9.\-]+").expect("static regex"));

/// Replace every run of characters not allowed in an SPDX idstring with `-`.
pub(crate) fn sanitize(value: &str) -> String {
    ID_UNSAFE.replace_all(value, "-").into_owned()
}

/// SPDXID of a package.
pub(crate) fn package_spdx_id(package: &Package) -> String {
    format!(
        "SPDXRef-Package-{}-{}-{}",
        package.package_type().as_str(),
        sanitize(package.name()),
        package.id()
    )
}

/// `<base>/<source kind>/<sanitized target>-<document id>`
pub(crate) fn document_namespace(sbom: &Sbom, base: &str) -> String {
    let source = sbom.source();
    let target = if source.target.trim().is_empty() {
        "unknown".to_string()
    } else {
        sanitize(source.target.trim())
    };
    format!(
        "{}/{}/{}-{}",
        base.trim_end_matches('/'),
        source.kind.as_str(),
        target,
        sbom.id()
    )
}

/// Model fields SPDX cannot express, carried in a package annotation.
#[derive(Debug, Serialize, Deserialize)]
struct PackageAnnotation {
    #[serde(rename = "type")]
    package_type: String,
    #[serde(default)]
    language: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, Value>,
}

fn tool_payload<'a>(comment: &'a str, kind: &str) -> Option<&'a str> {
    comment.trim().strip_prefix(PROPERTY_PREFIX)?.strip_prefix(kind)
}

/// JSON text of an annotation payload, with every `/` written as `\/`.
///
/// Every `/` in serde_json output sits inside a string literal, where the
/// escaped form decodes to the same character.
fn annotation_json<T: Serialize>(value: &T, format: FormatId) -> Result<String, FormatError> {
    let json =
        serde_json::to_string(value).map_err(|e| FormatError::from_json_encode(format, e))?;
    Ok(json.replace('/', "\\/"))
}

// ============================================================================
// Encoding
// ============================================================================

/// `LicenseRef-*` identifiers handed out for free-text licenses.
#[derive(Debug, Default)]
struct LicenseRefs {
    by_id: BTreeMap<String, String>,
}

impl LicenseRefs {
    fn reference(&mut self, text: &str) -> String {
        let text = text.trim();
        let base = format!("LicenseRef-{}", sanitize(text));
        let mut id = base.clone();
        let mut counter = 1;
        loop {
            match self.by_id.get(&id) {
                None => {
                    self.by_id.insert(id.clone(), text.to_string());
                    return id;
                }
                Some(existing) if existing == text => return id,
                Some(_) => {
                    counter += 1;
                    id = format!("{base}-{counter}");
                }
            }
        }
    }

    fn into_infos(self) -> Vec<ExtractedLicense> {
        self.by_id
            .into_iter()
            .map(|(license_id, text)| ExtractedLicense {
                license_id,
                extracted_text: text.clone(),
                name: Some(text),
            })
            .collect()
    }
}

/// Combine a license set into one declared expression.
///
/// Several licenses are written as `(a) AND (b)` so the set can be recovered.
fn declared_license(licenses: &BTreeSet<String>, refs: &mut LicenseRefs) -> String {
    let terms: Vec<String> = licenses
        .iter()
        .map(|license| {
            if is_spdx_expression(license) {
                license.trim().to_string()
            } else {
                refs.reference(license)
            }
        })
        .collect();
    match terms.as_slice() {
        [] => NOASSERTION.to_string(),
        [single] => single.clone(),
        many => many
            .iter()
            .map(|term| format!("({term})"))
            .collect::<Vec<_>>()
            .join(" AND "),
    }
}

pub(crate) fn to_document(
    sbom: &Sbom,
    format: FormatId,
    version: &str,
    namespace_base: &str,
) -> Result<SpdxDocument, FormatError> {
    let created = sbom.created().to_rfc3339_opts(SecondsFormat::Secs, true);
    let tool = format!("Tool: {}", sbom.descriptor().tool_string());
    let annotation = |comment: String| SpdxAnnotation {
        annotation_date: created.clone(),
        annotation_type: ANNOTATION_TYPE_OTHER.to_string(),
        annotator: tool.clone(),
        comment,
    };

    let mut refs = LicenseRefs::default();
    let mut spdx_ids = HashMap::new();
    let mut packages = Vec::with_capacity(sbom.package_count());
    for package in sbom.sorted_packages() {
        let mut spdx = to_package(package, &mut refs);
        let payload = annotation_json(&package_annotation(package), format)?;
        spdx.annotations.push(annotation(format!(
            "{PROPERTY_PREFIX}{PACKAGE_ANNOTATION}{payload}"
        )));
        spdx_ids.insert(package.id(), spdx.spdx_id.clone());
        packages.push(spdx);
    }

    let element = |endpoint: &Endpoint| match endpoint {
        Endpoint::Root => Some(DOCUMENT_SPDX_ID.to_string()),
        Endpoint::Artifact(id) => spdx_ids.get(id).cloned(),
    };
    let mut edges: Vec<&Relationship> = sbom.relationships().collect();
    edges.sort();
    let relationships = edges
        .into_iter()
        .filter_map(|rel| {
            Some(SpdxRelationship {
                spdx_element_id: element(&rel.from)?,
                relationship_type: relationship_type(rel.kind).to_string(),
                related_spdx_element: element(&rel.to)?,
            })
        })
        .collect();

    let source = annotation_json(sbom.source(), format)?;
    let name = if sbom.source().target.trim().is_empty() {
        "unknown".to_string()
    } else {
        sbom.source().target.clone()
    };

    Ok(SpdxDocument {
        spdx_version: format!("SPDX-{version}"),
        data_license: DATA_LICENSE.to_string(),
        spdx_id: DOCUMENT_SPDX_ID.to_string(),
        name,
        document_namespace: document_namespace(sbom, namespace_base),
        creation_info: CreationInfo {
            license_list_version: None,
            creators: vec![tool.clone()],
            created: created.clone(),
        },
        document_describes: Vec::new(),
        packages,
        relationships,
        has_extracted_licensing_infos: refs.into_infos(),
        annotations: vec![annotation(format!(
            "{PROPERTY_PREFIX}{SOURCE_ANNOTATION}{source}"
        ))],
    })
}

const fn relationship_type(kind: RelationshipKind) -> &'static str {
    match kind {
        RelationshipKind::DependsOn => "DEPENDS_ON",
        RelationshipKind::Contains => "CONTAINS",
        RelationshipKind::DescribedBy => "DESCRIBED_BY",
    }
}

fn package_annotation(package: &Package) -> PackageAnnotation {
    PackageAnnotation {
        package_type: package.package_type().as_str().to_string(),
        language: package.language().as_str().to_string(),
        locations: package.locations().to_vec(),
        metadata: package
            .metadata()
            .iter()
            .filter(|(key, _)| !key.starts_with(METADATA_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}

fn to_package(package: &Package, refs: &mut LicenseRefs) -> SpdxPackage {
    let mut extra = BTreeMap::new();
    let mut external_refs = Vec::new();
    let mut concluded = NOASSERTION.to_string();

    for (field, value) in package.metadata_with_prefix(METADATA_PREFIX) {
        match field {
            EXTERNAL_REFS_FIELD => {
                match serde_json::from_value::<Vec<ExternalRef>>(value.clone()) {
                    Ok(extra_refs) => external_refs.extend(extra_refs),
                    Err(e) => debug!("Ignoring unreadable spdx:externalRefs metadata: {e}"),
                }
            }
            LICENSE_CONCLUDED_FIELD => {
                if let Some(value) = value.as_str() {
                    concluded = value.to_string();
                }
            }
            field if TYPED_FIELDS.contains(&field) => {
                debug!("spdx:{field} metadata conflicts with a converter-owned field; skipped");
            }
            field => {
                extra.insert(field.to_string(), value.clone());
            }
        }
    }
    extra
        .entry("downloadLocation".to_string())
        .or_insert_with(|| Value::String(NOASSERTION.to_string()));
    extra
        .entry(FILES_ANALYZED_FIELD.to_string())
        .or_insert(Value::Bool(false));
    extra
        .entry("copyrightText".to_string())
        .or_insert_with(|| Value::String(NOASSERTION.to_string()));

    if let Some(purl) = package.purl_or_derived() {
        external_refs.insert(
            0,
            ExternalRef {
                reference_category: PACKAGE_MANAGER_CATEGORY.to_string(),
                reference_type: PURL_REFERENCE_TYPE.to_string(),
                reference_locator: purl,
            },
        );
    }

    SpdxPackage {
        name: package.name().to_string(),
        spdx_id: package_spdx_id(package),
        version_info: (!package.version().is_empty()).then(|| package.version().to_string()),
        license_concluded: Some(concluded),
        license_declared: Some(declared_license(package.licenses(), refs)),
        external_refs,
        annotations: Vec::new(),
        extra,
    }
}

// ============================================================================
// Decoding
// ============================================================================

pub(crate) fn from_document(document: SpdxDocument, format: FormatId) -> Result<Sbom, FormatError> {
    check_version(&document.spdx_version, format)?;

    let namespace = document.document_namespace.trim();
    if namespace.is_empty() {
        return Err(FormatError::malformed(format, "missing documentNamespace"));
    }
    let id = DocumentId::from_suffix(namespace).unwrap_or_else(|| DocumentId::derive(namespace));

    let created = parse_created(&document.creation_info.created);
    let descriptor = document
        .creation_info
        .creators
        .iter()
        .find_map(|creator| creator.trim().strip_prefix("Tool:"))
        .map(Descriptor::from_tool_string)
        .unwrap_or_default();
    let source = match tool_annotation(&document.annotations, SOURCE_ANNOTATION, format)? {
        Some(source) => source,
        None => Source::new(SourceKind::Unknown, document.name.clone()),
    };

    let extracted: HashMap<&str, &str> = document
        .has_extracted_licensing_infos
        .iter()
        .map(|l| (l.license_id.as_str(), l.extracted_text.as_str()))
        .collect();

    let mut builder = Sbom::builder(source)
        .id(id)
        .created(created)
        .descriptor(descriptor);

    let root = if document.spdx_id.trim().is_empty() {
        DOCUMENT_SPDX_ID
    } else {
        document.spdx_id.trim()
    };
    let mut elements: HashMap<&str, Endpoint> = HashMap::new();
    elements.insert(root, Endpoint::Root);

    for spdx in &document.packages {
        if spdx.name.trim().is_empty() {
            return Err(FormatError::malformed(
                format,
                format!("package '{}' has no name", spdx.spdx_id),
            ));
        }
        let artifact = builder.add_package(from_package(spdx, &extracted, format)?)?;
        elements.insert(spdx.spdx_id.as_str(), Endpoint::from(artifact));
    }

    let described = document.document_describes.iter().map(|element| {
        (element.as_str(), root, RelationshipKind::DescribedBy)
    });
    let related = document.relationships.iter().filter_map(|rel| {
        let mapped = map_relationship(rel);
        if mapped.is_none() {
            debug!(
                "Skipping unsupported SPDX relationship type {}",
                rel.relationship_type
            );
        }
        mapped
    });

    for (from, to, kind) in described.chain(related) {
        let (Some(from), Some(to)) = (elements.get(from), elements.get(to)) else {
            debug!("Skipping SPDX relationship {from} {kind} {to}: unknown element");
            continue;
        };
        builder.add_relationship(Relationship::new(from.clone(), to.clone(), kind))?;
    }

    Ok(builder.build())
}

fn check_version(spdx_version: &str, format: FormatId) -> Result<(), FormatError> {
    let trimmed = spdx_version.trim();
    if trimmed.is_empty() {
        return Err(FormatError::malformed(format, "missing spdxVersion"));
    }
    match trimmed.strip_prefix("SPDX-") {
        Some(version) if version.starts_with("2.") => Ok(()),
        _ => Err(FormatError::UnsupportedVersion {
            format,
            version: trimmed.to_string(),
            supported: SPDX_VERSIONS.join(", "),
        }),
    }
}

/// Normalize a relationship to `(from, to, kind)`, inverting the `*_OF`,
/// `*_BY` and `DESCRIBES` forms.
fn map_relationship(rel: &SpdxRelationship) -> Option<(&str, &str, RelationshipKind)> {
    let a = rel.spdx_element_id.trim();
    let b = rel.related_spdx_element.trim();
    match rel.relationship_type.trim().to_uppercase().as_str() {
        "DEPENDS_ON" => Some((a, b, RelationshipKind::DependsOn)),
        "DEPENDENCY_OF" => Some((b, a, RelationshipKind::DependsOn)),
        "CONTAINS" => Some((a, b, RelationshipKind::Contains)),
        "CONTAINED_BY" => Some((b, a, RelationshipKind::Contains)),
        "DESCRIBED_BY" => Some((a, b, RelationshipKind::DescribedBy)),
        "DESCRIBES" => Some((b, a, RelationshipKind::DescribedBy)),
        _ => None,
    }
}

fn parse_created(created: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(created.trim()).map_or_else(
        |e| {
            debug!("Unparseable creationInfo.created '{created}': {e}");
            DateTime::<Utc>::default()
        },
        |parsed| parsed.with_timezone(&Utc),
    )
}

/// Payload of the first `sbom-convert:<kind>` annotation.
fn tool_annotation<T: for<'de> Deserialize<'de>>(
    annotations: &[SpdxAnnotation],
    kind: &str,
    format: FormatId,
) -> Result<Option<T>, FormatError> {
    let Some(payload) = annotations
        .iter()
        .find_map(|a| tool_payload(&a.comment, kind))
    else {
        return Ok(None);
    };
    serde_json::from_str(payload).map(Some).map_err(|e| {
        FormatError::malformed(
            format,
            format!("unreadable {PROPERTY_PREFIX}{kind} annotation: {e}"),
        )
    })
}

/// License terms of a declared expression, with `LicenseRef-*` ids resolved
/// to their extracted text.
fn decode_licenses(expression: &str, extracted: &HashMap<&str, &str>) -> Vec<String> {
    let expression = expression.trim();
    split_wrapped_terms(expression)
        .unwrap_or_else(|| vec![expression])
        .into_iter()
        .map(|term| {
            let term = term.trim();
            extracted
                .get(term)
                .map_or_else(|| term.to_string(), |text| (*text).to_string())
        })
        .collect()
}

/// Split `(a) AND (b) ...` into its parenthesized terms.
///
/// Returns `None` unless the whole expression has that shape with at least
/// two terms.
fn split_wrapped_terms(expression: &str) -> Option<Vec<&str>> {
    let mut terms = Vec::new();
    let mut rest = expression.trim();
    loop {
        let close = matching_paren(rest)?;
        terms.push(&rest[1..close]);
        rest = rest[close + 1..].trim_start();
        if rest.is_empty() {
            break;
        }
        rest = rest.strip_prefix("AND")?.trim_start();
    }
    (terms.len() > 1).then_some(terms)
}

/// Byte index of the `)` closing the `(` that `value` starts with.
fn matching_paren(value: &str) -> Option<usize> {
    if !value.starts_with('(') {
        return None;
    }
    let mut depth = 0usize;
    for (index, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_assigned(license: &str) -> bool {
    let license = license.trim();
    !license.is_empty() && license != NOASSERTION && license != NONE
}

/// Extra fields that only carry the encoder's own defaults.
fn is_default_extra(field: &str, value: &Value) -> bool {
    match value {
        Value::String(s) => is_unset(s),
        Value::Bool(false) => field == FILES_ANALYZED_FIELD,
        _ => false,
    }
}

fn from_package(
    spdx: &SpdxPackage,
    extracted: &HashMap<&str, &str>,
    format: FormatId,
) -> Result<Package, FormatError> {
    let annotation: Option<PackageAnnotation> =
        tool_annotation(&spdx.annotations, PACKAGE_ANNOTATION, format)?;
    let purl = spdx
        .external_refs
        .iter()
        .find(|r| r.reference_type == PURL_REFERENCE_TYPE)
        .map(|r| r.reference_locator.trim());

    let package_type = annotation
        .as_ref()
        .and_then(|a| a.package_type.parse().ok())
        .or_else(|| purl.and_then(package_type_from_purl))
        .unwrap_or_default();
    let version = spdx
        .version_info
        .as_deref()
        .filter(|v| !is_unset(v))
        .unwrap_or_default();
    let derived_purl = derive_purl(package_type, &spdx.name, version);

    let mut package = Package::new(spdx.name.as_str(), version, package_type);
    if let Some(annotation) = annotation {
        package = package.with_locations(annotation.locations);
        if let Ok(language) = annotation.language.parse() {
            package = package.with_language(language);
        }
        for (key, value) in annotation.metadata {
            package = package.with_metadata(key, value);
        }
    }

    let declared = spdx.license_declared.as_deref().filter(|l| is_assigned(l));
    let concluded = spdx.license_concluded.as_deref().filter(|l| is_assigned(l));
    if let Some(expression) = declared.or(concluded) {
        for license in decode_licenses(expression, extracted) {
            package = package.with_license(license);
        }
    }
    if let (Some(declared), Some(concluded)) = (declared, concluded)
        && declared.trim() != concluded.trim()
    {
        package = package.with_metadata(
            format!("{METADATA_PREFIX}{LICENSE_CONCLUDED_FIELD}"),
            Value::String(concluded.trim().to_string()),
        );
    }

    if let Some(purl) = purl
        && derived_purl.as_deref() != Some(purl)
    {
        package = package.with_purl(purl);
    }
    let other_refs: Vec<Value> = spdx
        .external_refs
        .iter()
        .filter(|r| r.reference_type != PURL_REFERENCE_TYPE)
        .map(|r| {
            serde_json::json!({
                "referenceCategory": r.reference_category,
                "referenceType": r.reference_type,
                "referenceLocator": r.reference_locator,
            })
        })
        .collect();
    if !other_refs.is_empty() {
        package = package.with_metadata(
            format!("{METADATA_PREFIX}{EXTERNAL_REFS_FIELD}"),
            Value::Array(other_refs),
        );
    }

    for (field, value) in &spdx.extra {
        if is_default_extra(field, value) {
            continue;
        }
        package = package.with_metadata(format!("{METADATA_PREFIX}{field}"), value.clone());
    }
    Ok(package)
}
