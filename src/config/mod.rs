//! Configuration module for sbom-convert.
//!
//! This module provides:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Quick Start
//!
//! ```rust
//! use sbom_convert::config::{AppConfig, Validatable};
//!
//! let config = AppConfig::builder()
//!     .cyclonedx_version("1.4")
//!     .destination("spdx-json=sbom.spdx.json")
//!     .build();
//! assert!(config.is_valid());
//! ```
//!
//! # Configuration File
//!
//! Place a `.sbom-convert.yaml` file in your project root or
//! `~/.config/sbom-convert/`:
//!
//! ```yaml
//! output:
//!   pretty: false
//! formats:
//!   cyclonedx_version: "1.6"
//!   spdx_namespace_base: https://sbom.example.com/spdx
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::DEFAULT_MAX_INPUT_BYTES;
pub use types::{
    AppConfig, AppConfigBuilder, BehaviorConfig, FormatsConfig, InputConfig, OutputConfig,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, load_config_file, load_or_default,
    CliOverrides, ConfigFileError,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// This schema documents all configuration options that can be set in
/// `.sbom-convert.yaml` config files. It can be used by editors for
/// validation and autocompletion.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
