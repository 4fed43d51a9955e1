//! Package (artifact) types.

use super::identifiers::ArtifactId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Opaque per-package metadata.
///
/// Keys are namespaced by origin: `cyclonedx:<field>` and `spdx:<field>` hold
/// foreign schema fields preserved by decoders, plain keys hold cataloger
/// metadata. Values survive re-encoding into the schema they came from;
/// fidelity across unrelated schemas is best-effort.
pub type PackageMetadata = BTreeMap<String, serde_json::Value>;

/// Package type / ecosystem.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PackageType {
    Npm,
    Python,
    Gem,
    JavaArchive,
    GoModule,
    RustCrate,
    Deb,
    Rpm,
    Apk,
    Binary,
    #[default]
    Unknown,
}

impl PackageType {
    /// All package types, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Npm,
        Self::Python,
        Self::Gem,
        Self::JavaArchive,
        Self::GoModule,
        Self::RustCrate,
        Self::Deb,
        Self::Rpm,
        Self::Apk,
        Self::Binary,
        Self::Unknown,
    ];

    /// Canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Python => "python",
            Self::Gem => "gem",
            Self::JavaArchive => "java-archive",
            Self::GoModule => "go-module",
            Self::RustCrate => "rust-crate",
            Self::Deb => "deb",
            Self::Rpm => "rpm",
            Self::Apk => "apk",
            Self::Binary => "binary",
            Self::Unknown => "unknown",
        }
    }

    /// The PURL type used for this ecosystem.
    #[must_use]
    pub const fn purl_type(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Python => "pypi",
            Self::Gem => "gem",
            Self::JavaArchive => "maven",
            Self::GoModule => "golang",
            Self::RustCrate => "cargo",
            Self::Deb => "deb",
            Self::Rpm => "rpm",
            Self::Apk => "apk",
            Self::Binary | Self::Unknown => "generic",
        }
    }

    /// Map a PURL type back to a package type.
    #[must_use]
    pub fn from_purl_type(purl_type: &str) -> Self {
        match purl_type.to_lowercase().as_str() {
            "npm" => Self::Npm,
            "pypi" => Self::Python,
            "gem" => Self::Gem,
            "maven" => Self::JavaArchive,
            "golang" => Self::GoModule,
            "cargo" => Self::RustCrate,
            "deb" => Self::Deb,
            "rpm" => Self::Rpm,
            "apk" | "alpine" => Self::Apk,
            _ => Self::Unknown,
        }
    }

    /// Language usually associated with the ecosystem.
    #[must_use]
    pub const fn default_language(&self) -> Language {
        match self {
            Self::Npm => Language::JavaScript,
            Self::Python => Language::Python,
            Self::Gem => Language::Ruby,
            Self::JavaArchive => Language::Java,
            Self::GoModule => Language::Go,
            Self::RustCrate => Language::Rust,
            Self::Deb | Self::Rpm | Self::Apk | Self::Binary | Self::Unknown => Language::Unknown,
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "npm" | "node" | "javascript" => Ok(Self::Npm),
            "python" | "pip" | "pypi" => Ok(Self::Python),
            "gem" | "ruby" | "rubygems" => Ok(Self::Gem),
            "java-archive" | "java" | "maven" | "jar" => Ok(Self::JavaArchive),
            "go-module" | "go" | "golang" => Ok(Self::GoModule),
            "rust-crate" | "cargo" | "crate" => Ok(Self::RustCrate),
            "deb" | "debian" => Ok(Self::Deb),
            "rpm" => Ok(Self::Rpm),
            "apk" | "alpine" => Ok(Self::Apk),
            "binary" => Ok(Self::Binary),
            "unknown" | "" => Ok(Self::Unknown),
            other => Err(format!("unknown package type '{other}'")),
        }
    }
}

/// Language / ecosystem tag.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Python,
    Ruby,
    Java,
    Go,
    Rust,
    #[default]
    Unknown,
}

impl Language {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Ruby => "ruby",
            Self::Java => "java",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "javascript" | "js" => Ok(Self::JavaScript),
            "python" => Ok(Self::Python),
            "ruby" => Ok(Self::Ruby),
            "java" => Ok(Self::Java),
            "go" => Ok(Self::Go),
            "rust" => Ok(Self::Rust),
            "unknown" | "" => Ok(Self::Unknown),
            other => Err(format!("unknown language '{other}'")),
        }
    }
}

/// Where a package was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Path inside the scanned source
    pub path: String,
    /// Originating image layer (or other source reference)
    #[serde(rename = "layerID", default, skip_serializing_if = "Option::is_none")]
    pub layer_id: Option<String>,
}

impl Location {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            layer_id: None,
        }
    }

    #[must_use]
    pub fn with_layer(mut self, layer_id: impl Into<String>) -> Self {
        self.layer_id = Some(layer_id.into());
        self
    }
}

/// A discovered software package.
///
/// Identity-bearing fields (name, version, type, locations) are only settable
/// through the constructor and `with_*` methods, which keep the synthetic
/// [`ArtifactId`] in sync.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    id: ArtifactId,
    name: String,
    version: String,
    package_type: PackageType,
    locations: Vec<Location>,
    language: Language,
    licenses: BTreeSet<String>,
    purl: Option<String>,
    metadata: PackageMetadata,
}

impl Package {
    /// Create a new package. The language defaults to the ecosystem's language.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>, package_type: PackageType) -> Self {
        let mut package = Self {
            id: ArtifactId::derive("", "", PackageType::Unknown, &[], 0),
            name: name.into(),
            version: version.into(),
            package_type,
            locations: Vec::new(),
            language: package_type.default_language(),
            licenses: BTreeSet::new(),
            purl: None,
            metadata: PackageMetadata::new(),
        };
        package.rederive_id(0);
        package
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self.rederive_id(0);
        self
    }

    #[must_use]
    pub fn with_locations(mut self, locations: impl IntoIterator<Item = Location>) -> Self {
        self.locations.extend(locations);
        self.rederive_id(0);
        self
    }

    #[must_use]
    pub const fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    #[must_use]
    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        let license = license.into();
        if !license.trim().is_empty() {
            self.licenses.insert(license);
        }
        self
    }

    #[must_use]
    pub fn with_purl(mut self, purl: impl Into<String>) -> Self {
        self.purl = Some(purl.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Recompute the synthetic ID; `salt` disambiguates hash collisions.
    pub(crate) fn rederive_id(&mut self, salt: u32) {
        self.id = ArtifactId::derive(
            &self.name,
            &self.version,
            self.package_type,
            &self.locations,
            salt,
        );
    }

    /// Whether two packages share all identity-bearing fields.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.package_type == other.package_type
            && self.locations == other.locations
    }

    #[must_use]
    pub const fn id(&self) -> &ArtifactId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version string; empty when unknown.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub const fn package_type(&self) -> PackageType {
        self.package_type
    }

    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub const fn licenses(&self) -> &BTreeSet<String> {
        &self.licenses
    }

    /// The declared PURL, if any.
    #[must_use]
    pub fn purl(&self) -> Option<&str> {
        self.purl.as_deref()
    }

    /// The declared PURL, or one derived from name, version and type.
    #[must_use]
    pub fn purl_or_derived(&self) -> Option<String> {
        self.purl
            .clone()
            .or_else(|| super::purl::derive_purl(self.package_type, &self.name, &self.version))
    }

    #[must_use]
    pub const fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    /// Metadata entries whose keys start with `prefix`, with the prefix removed.
    pub fn metadata_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a serde_json::Value)> + 'a {
        self.metadata
            .iter()
            .filter_map(move |(k, v)| k.strip_prefix(prefix).map(|rest| (rest, v)))
    }
}
