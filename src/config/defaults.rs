//! Default values for sbom-convert configuration.

use super::types::{FormatsConfig, InputConfig, OutputConfig};
use crate::formats::{cyclonedx, spdx, DEFAULT_SPDX_NAMESPACE_BASE};

/// Default input limit (512 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 512 * 1024 * 1024;

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            destinations: Vec::new(),
            pretty: true,
        }
    }
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            cyclonedx_version: cyclonedx::DEFAULT_VERSION.to_string(),
            spdx_version: spdx::DEFAULT_VERSION.to_string(),
            spdx_namespace_base: DEFAULT_SPDX_NAMESPACE_BASE.to_string(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::AppConfig;
    use crate::formats::FormatOptions;

    #[test]
    fn test_default_format_options_match_codec_defaults() {
        assert_eq!(AppConfig::default().format_options(), FormatOptions::default());
    }

    #[test]
    fn test_default_config_builds_registry() {
        let registry = AppConfig::default().registry().expect("registry");
        assert!(!registry.all().is_empty());
    }
}
