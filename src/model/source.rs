//! Source / provenance metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of thing was scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Image,
    Directory,
    File,
    #[default]
    Unknown,
}

impl SourceKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Directory => "directory",
            Self::File => "file",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" | "container" => Ok(Self::Image),
            "directory" | "dir" => Ok(Self::Directory),
            "file" => Ok(Self::File),
            "unknown" | "" => Ok(Self::Unknown),
            other => Err(format!("unknown source kind '{other}'")),
        }
    }
}

/// Breadth of a container image considered during scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// Only the final squashed filesystem
    Squashed,
    /// Every layer of the image
    AllLayers,
}

impl Scope {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Squashed => "squashed",
            Self::AllLayers => "all-layers",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "squashed" => Ok(Self::Squashed),
            "all-layers" | "alllayers" | "all_layers" => Ok(Self::AllLayers),
            other => Err(format!("unknown scope '{other}'")),
        }
    }
}

/// Description of what was scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Source {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// Image reference or filesystem path
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Image manifest digest, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl Source {
    #[must_use]
    pub fn new(kind: SourceKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            scope: None,
            digest: None,
        }
    }

    #[must_use]
    pub fn image(reference: impl Into<String>, scope: Scope) -> Self {
        Self::new(SourceKind::Image, reference).with_scope(scope)
    }

    #[must_use]
    pub fn directory(path: impl Into<String>) -> Self {
        Self::new(SourceKind::Directory, path)
    }

    #[must_use]
    pub const fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    #[must_use]
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }
}

/// Generating tool identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: String,
    pub version: String,
}

impl Descriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse an SPDX-style `name-version` tool string (e.g. `syft-0.90.0`).
    #[must_use]
    pub fn from_tool_string(tool: &str) -> Self {
        let tool = tool.trim();
        match tool.rsplit_once('-') {
            Some((name, version))
                if !name.is_empty() && version.starts_with(|c: char| c.is_ascii_digit()) =>
            {
                Self::new(name, version)
            }
            _ => Self::new(tool, ""),
        }
    }

    /// SPDX-style `name-version` tool string.
    #[must_use]
    pub fn tool_string(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{}-{}", self.name, self.version)
        }
    }
}

impl Default for Descriptor {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}
