//! License value classification.
//!
//! Package licenses are kept as the raw strings a cataloger or decoder
//! reported. Encoders need to know what kind of value each one is, since both
//! `CycloneDX` and SPDX encode identifiers, expressions and free text
//! differently.

use serde::{Deserialize, Serialize};

/// What a license string turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LicenseClass {
    /// A single known SPDX license identifier (e.g. `MIT`)
    Identifier,
    /// A compound SPDX expression (e.g. `MIT OR Apache-2.0`)
    Expression,
    /// Anything else: license names, URLs, prose
    FreeText,
}

/// Classify a license string using the SPDX license list.
#[must_use]
pub fn classify_license(value: &str) -> LicenseClass {
    let value = value.trim();
    if value.is_empty() {
        return LicenseClass::FreeText;
    }
    if spdx::license_id(value).is_some() {
        return LicenseClass::Identifier;
    }
    if is_spdx_expression(value) {
        LicenseClass::Expression
    } else {
        LicenseClass::FreeText
    }
}

/// Whether `value` parses as a strict SPDX license expression.
///
/// `NOASSERTION` and `NONE` are SPDX keywords, not expressions.
#[must_use]
pub fn is_spdx_expression(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value == "NOASSERTION" || value == "NONE" {
        return false;
    }
    spdx::Expression::parse(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(classify_license("MIT"), LicenseClass::Identifier);
        assert_eq!(classify_license("Apache-2.0"), LicenseClass::Identifier);
    }

    #[test]
    fn test_expression() {
        assert_eq!(
            classify_license("MIT OR Apache-2.0"),
            LicenseClass::Expression
        );
        assert_eq!(
            classify_license("(MIT AND BSD-3-Clause)"),
            LicenseClass::Expression
        );
    }

    #[test]
    fn test_free_text() {
        assert_eq!(
            classify_license("Some Custom License v2"),
            LicenseClass::FreeText
        );
        assert_eq!(classify_license(""), LicenseClass::FreeText);
        assert_eq!(
            classify_license("https://example.com/LICENSE"),
            LicenseClass::FreeText
        );
    }

    #[test]
    fn test_keywords_are_not_expressions() {
        assert!(!is_spdx_expression("NOASSERTION"));
        assert!(!is_spdx_expression("NONE"));
        assert!(is_spdx_expression("GPL-3.0-only WITH Classpath-exception-2.0"));
    }
}
