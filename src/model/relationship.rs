//! Typed relationships between artifacts and the document root.

use super::identifiers::ArtifactId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// String form of the document root endpoint.
pub const ROOT_REFERENCE: &str = "document-root";

/// One end of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    /// The document root (the scanned source as a whole)
    Root,
    /// An artifact in the same document
    Artifact(ArtifactId),
}

impl Endpoint {
    /// The artifact ID, if this endpoint is not the root.
    #[must_use]
    pub const fn artifact(&self) -> Option<&ArtifactId> {
        match self {
            Self::Root => None,
            Self::Artifact(id) => Some(id),
        }
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }
}

impl From<ArtifactId> for Endpoint {
    fn from(id: ArtifactId) -> Self {
        Self::Artifact(id)
    }
}

impl From<&ArtifactId> for Endpoint {
    fn from(id: &ArtifactId) -> Self {
        Self::Artifact(id.clone())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str(ROOT_REFERENCE),
            Self::Artifact(id) => write!(f, "{id}"),
        }
    }
}

impl Serialize for Endpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        if value == ROOT_REFERENCE {
            Ok(Self::Root)
        } else {
            Ok(Self::Artifact(ArtifactId::from_raw(value)))
        }
    }
}

/// Kind of relationship. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    /// `from` requires `to` at runtime or build time
    DependsOn,
    /// `from` physically contains `to`
    Contains,
    /// `from` is described by `to` (typically the document root)
    DescribedBy,
}

impl RelationshipKind {
    pub const ALL: [Self; 3] = [Self::DependsOn, Self::Contains, Self::DescribedBy];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DependsOn => "depends-on",
            Self::Contains => "contains",
            Self::DescribedBy => "described-by",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "depends-on" | "dependency-of" => Ok(Self::DependsOn),
            "contains" => Ok(Self::Contains),
            "described-by" => Ok(Self::DescribedBy),
            other => Err(format!("unknown relationship kind '{other}'")),
        }
    }
}

/// A directed, typed edge. Deduplicated by the full triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relationship {
    pub from: Endpoint,
    pub to: Endpoint,
    pub kind: RelationshipKind,
}

impl Relationship {
    #[must_use]
    pub fn new(from: impl Into<Endpoint>, to: impl Into<Endpoint>, kind: RelationshipKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} -> {})", self.kind, self.from, self.to)
    }
}
