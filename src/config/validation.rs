//! Configuration validation for sbom-convert.
//!
//! Provides validation traits and implementations for all configuration types.

use super::types::{AppConfig, BehaviorConfig, FormatsConfig, InputConfig, OutputConfig};
use crate::formats::{cyclonedx::CYCLONEDX_VERSIONS, registry, spdx::SPDX_VERSIONS};
use crate::pipeline::DestinationSpec;
use thiserror::Error;

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.output.validate());
        errors.extend(self.formats.validate());
        errors.extend(self.input.validate());
        errors.extend(self.behavior.validate());
        errors
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut stdout_count = 0;

        for destination in &self.destinations {
            match destination.parse::<DestinationSpec>() {
                Ok(spec) => {
                    if let Err(e) = registry().by_name(spec.format()) {
                        errors.push(ConfigError::new("output.destinations", e.to_string()));
                    }
                    if spec.path().is_none() {
                        stdout_count += 1;
                    }
                }
                Err(e) => errors.push(ConfigError::new("output.destinations", e.to_string())),
            }
        }

        if stdout_count > 1 {
            errors.push(ConfigError::new(
                "output.destinations",
                format!("At most one destination may write to stdout, got {stdout_count}"),
            ));
        }

        errors
    }
}

impl Validatable for FormatsConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if !CYCLONEDX_VERSIONS.contains(&self.cyclonedx_version.as_str()) {
            errors.push(ConfigError::new(
                "formats.cyclonedx_version",
                format!(
                    "Unsupported version '{}'. Valid options: {}",
                    self.cyclonedx_version,
                    CYCLONEDX_VERSIONS.join(", ")
                ),
            ));
        }

        if !SPDX_VERSIONS.contains(&self.spdx_version.as_str()) {
            errors.push(ConfigError::new(
                "formats.spdx_version",
                format!(
                    "Unsupported version '{}'. Valid options: {}",
                    self.spdx_version,
                    SPDX_VERSIONS.join(", ")
                ),
            ));
        }

        if !is_http_url(&self.spdx_namespace_base) {
            errors.push(ConfigError::new(
                "formats.spdx_namespace_base",
                format!(
                    "Namespace base must be an http(s) URL, got '{}'",
                    self.spdx_namespace_base
                ),
            ));
        }

        errors
    }
}

impl Validatable for InputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        if self.max_bytes == 0 {
            vec![ConfigError::new(
                "input.max_bytes",
                "Input limit must be at least 1 byte",
            )]
        } else {
            Vec::new()
        }
    }
}

impl Validatable for BehaviorConfig {
    fn validate(&self) -> Vec<ConfigError> {
        Vec::new()
    }
}

fn is_http_url(value: &str) -> bool {
    let Some(rest) = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
    else {
        return false;
    };
    let host = rest.split('/').next().unwrap_or_default();
    !host.is_empty() && !value.chars().any(char::is_whitespace)
}
