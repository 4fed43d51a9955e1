//! Configuration types for sbom-convert.

use crate::formats::{FormatOptions, FormatRegistry, RegistryError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// File values are loaded first; CLI arguments are merged over them with
/// [`AppConfig::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Output configuration (destinations, pretty-printing)
    pub output: OutputConfig,
    /// Format version and namespace settings
    pub formats: FormatsConfig,
    /// Input limits
    pub input: InputConfig,
    /// Behavior flags
    pub behavior: BehaviorConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Encoder settings for the built-in formats.
    #[must_use]
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            cyclonedx_version: self.formats.cyclonedx_version.clone(),
            spdx_version: self.formats.spdx_version.clone(),
            spdx_namespace_base: self.formats.spdx_namespace_base.clone(),
            pretty: self.output.pretty,
        }
    }

    /// Build a registry of the built-in formats configured by this config.
    pub fn registry(&self) -> Result<FormatRegistry, RegistryError> {
        FormatRegistry::builtin(&self.format_options())
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Add a default output destination.
    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.config.output.destinations.push(destination.into());
        self
    }

    /// Pretty-print JSON output.
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.config.output.pretty = pretty;
        self
    }

    /// Version `cyclonedx-*` names resolve to.
    pub fn cyclonedx_version(mut self, version: impl Into<String>) -> Self {
        self.config.formats.cyclonedx_version = version.into();
        self
    }

    /// Version `spdx-*` names resolve to.
    pub fn spdx_version(mut self, version: impl Into<String>) -> Self {
        self.config.formats.spdx_version = version.into();
        self
    }

    /// Base URI of generated SPDX document namespaces.
    pub fn spdx_namespace_base(mut self, base: impl Into<String>) -> Self {
        self.config.formats.spdx_namespace_base = base.into();
        self
    }

    /// Largest input accepted, in bytes.
    pub const fn max_input_bytes(mut self, max_bytes: u64) -> Self {
        self.config.input.max_bytes = max_bytes;
        self
    }

    /// Enable quiet mode.
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.config.behavior.quiet = quiet;
        self
    }

    /// Build the `AppConfig`.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Section types
// ============================================================================

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Destinations used when none are given on the command line
    /// (`<format>[@<version>][=<path>]`)
    pub destinations: Vec<String>,
    /// Pretty-print JSON output
    pub pretty: bool,
}

/// Format version and namespace settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FormatsConfig {
    /// CycloneDX version `cyclonedx-json` / `cyclonedx-xml` resolve to
    pub cyclonedx_version: String,
    /// SPDX version `spdx-json` / `spdx-tag-value` resolve to
    pub spdx_version: String,
    /// Base URI of generated SPDX document namespaces (http or https)
    pub spdx_namespace_base: String,
}

/// Input limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct InputConfig {
    /// Largest input accepted, in bytes
    #[schemars(range(min = 1))]
    pub max_bytes: u64,
}

/// Behavior flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Suppress informational output
    pub quiet: bool,
}
