//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::types::AppConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
const CONFIG_FILE_NAMES: &[&str] = &[
    ".sbom-convert.yaml",
    ".sbom-convert.yml",
    "sbom-convert.yaml",
    "sbom-convert.yml",
];

/// Directory under the user config directory that holds the global config.
const CONFIG_DIR_NAME: &str = "sbom-convert";

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/sbom-convert/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path
        && path.exists()
    {
        return Some(path.to_path_buf());
    }

    if let Ok(cwd) = std::env::current_dir()
        && let Some(path) = find_config_in_dir(&cwd)
    {
        return Some(path);
    }

    if let Some(git_root) = find_git_root()
        && let Some(path) = find_config_in_dir(&git_root)
    {
        return Some(path);
    }

    if let Some(config_dir) = dirs::config_dir()
        && let Some(path) = find_config_in_dir(&config_dir.join(CONFIG_DIR_NAME))
    {
        return Some(path);
    }

    dirs::home_dir().and_then(|home| find_config_in_dir(&home))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => {
                tracing::debug!("Loaded config from {}", path.display());
                (config, Some(path))
            }
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

/// Values given on the command line; `None` leaves the file value in place.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub destinations: Vec<String>,
    pub pretty: Option<bool>,
    pub cyclonedx_version: Option<String>,
    pub spdx_version: Option<String>,
    pub spdx_namespace_base: Option<String>,
    pub max_bytes: Option<u64>,
    pub quiet: bool,
}

impl AppConfig {
    /// Merge command-line values into this config, with `overrides` taking
    /// precedence.
    pub fn merge(&mut self, overrides: &CliOverrides) {
        if !overrides.destinations.is_empty() {
            self.output.destinations.clone_from(&overrides.destinations);
        }
        if let Some(pretty) = overrides.pretty {
            self.output.pretty = pretty;
        }
        if let Some(version) = &overrides.cyclonedx_version {
            self.formats.cyclonedx_version.clone_from(version);
        }
        if let Some(version) = &overrides.spdx_version {
            self.formats.spdx_version.clone_from(version);
        }
        if let Some(base) = &overrides.spdx_namespace_base {
            self.formats.spdx_namespace_base.clone_from(base);
        }
        if let Some(max_bytes) = overrides.max_bytes {
            self.input.max_bytes = max_bytes;
        }
        if overrides.quiet {
            self.behavior.quiet = true;
        }
    }

    /// Load from file and merge with CLI overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        overrides: &CliOverrides,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge(overrides);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    let example = AppConfig::default();
    format!(
        r"# sbom-convert configuration
# Place this file at .sbom-convert.yaml in your project root or ~/.config/sbom-convert/
# CLI arguments always override file settings.
#
# output.destinations entries use the form <format>[@<version>][=<path>],
# for example spdx-json=sbom.spdx.json or cyclonedx-xml@1.4=bom.xml.

{}",
        serde_yaml::to_string(&example).unwrap_or_default()
    )
}

// ============================================================================
// Tests
// ============================================================================
