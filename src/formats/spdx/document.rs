//! SPDX 2.x document model, shared by the JSON and tag-value codecs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub(crate) const DOCUMENT_SPDX_ID: &str = "SPDXRef-DOCUMENT";
pub(crate) const DATA_LICENSE: &str = "CC0-1.0";
pub(crate) const NOASSERTION: &str = "NOASSERTION";
pub(crate) const NONE: &str = "NONE";
pub(crate) const PURL_REFERENCE_TYPE: &str = "purl";
pub(crate) const PACKAGE_MANAGER_CATEGORY: &str = "PACKAGE-MANAGER";
pub(crate) const ANNOTATION_TYPE_OTHER: &str = "OTHER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpdxDocument {
    pub spdx_version: String,
    #[serde(default)]
    pub data_license: String,
    #[serde(rename = "SPDXID", default)]
    pub spdx_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub document_namespace: String,
    #[serde(default)]
    pub creation_info: CreationInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_describes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<SpdxPackage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<SpdxRelationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub has_extracted_licensing_infos: Vec<ExtractedLicense>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<SpdxAnnotation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_list_version: Option<String>,
    #[serde(default)]
    pub creators: Vec<String>,
    #[serde(default)]
    pub created: String,
}

/// A package entry.
///
/// Fields the converter interprets are typed; the remaining package fields
/// (download location, supplier, checksums, ...) stay as raw JSON in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpdxPackage {
    pub name: String,
    #[serde(rename = "SPDXID")]
    pub spdx_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_concluded: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_declared: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_refs: Vec<ExternalRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<SpdxAnnotation>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Package fields held in [`SpdxPackage::extra`] with a tag-value spelling.
pub(crate) const PACKAGE_TEXT_FIELDS: [(&str, &str); 11] = [
    ("packageFileName", "PackageFileName"),
    ("supplier", "PackageSupplier"),
    ("originator", "PackageOriginator"),
    ("downloadLocation", "PackageDownloadLocation"),
    ("homepage", "PackageHomePage"),
    ("sourceInfo", "PackageSourceInfo"),
    ("copyrightText", "PackageCopyrightText"),
    ("summary", "PackageSummary"),
    ("description", "PackageDescription"),
    ("comment", "PackageComment"),
    ("primaryPackagePurpose", "PrimaryPackagePurpose"),
];

pub(crate) const FILES_ANALYZED_FIELD: &str = "filesAnalyzed";
pub(crate) const CHECKSUMS_FIELD: &str = "checksums";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExternalRef {
    pub reference_category: String,
    pub reference_type: String,
    pub reference_locator: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpdxRelationship {
    pub spdx_element_id: String,
    pub relationship_type: String,
    pub related_spdx_element: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExtractedLicense {
    pub license_id: String,
    #[serde(default)]
    pub extracted_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpdxAnnotation {
    #[serde(default)]
    pub annotation_date: String,
    #[serde(default)]
    pub annotation_type: String,
    #[serde(default)]
    pub annotator: String,
    #[serde(default)]
    pub comment: String,
}

/// Whether a string field carries no information.
pub(crate) fn is_unset(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == NOASSERTION
}
