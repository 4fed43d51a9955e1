//! Package URL helpers.

use super::package::PackageType;
use packageurl::PackageUrl;
use std::str::FromStr;

/// Build a PURL from package identity. Returns `None` for nameless packages.
///
/// Scoped npm names (`@scope/name`) and Go module paths are split into
/// namespace and name, as the PURL spec requires.
#[must_use]
pub fn derive_purl(package_type: PackageType, name: &str, version: &str) -> Option<String> {
    if name.trim().is_empty() {
        return None;
    }

    let (namespace, short_name) = match package_type {
        PackageType::Npm | PackageType::GoModule => match name.rsplit_once('/') {
            Some((ns, n)) if !ns.is_empty() && !n.is_empty() => (Some(ns), n),
            _ => (None, name),
        },
        PackageType::JavaArchive => match name.split_once(':') {
            Some((group, artifact)) if !group.is_empty() && !artifact.is_empty() => {
                (Some(group), artifact)
            }
            _ => (None, name),
        },
        _ => (None, name),
    };

    let mut purl = PackageUrl::new(package_type.purl_type(), short_name).ok()?;
    if let Some(ns) = namespace {
        purl.with_namespace(ns);
    }
    if !version.is_empty() {
        purl.with_version(version);
    }
    Some(purl.to_string())
}

/// Extract the package type from a PURL string.
#[must_use]
pub fn package_type_from_purl(purl: &str) -> Option<PackageType> {
    let parsed = PackageUrl::from_str(purl).ok()?;
    Some(PackageType::from_purl_type(parsed.ty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_simple_purl() {
        assert_eq!(
            derive_purl(PackageType::Npm, "left-pad", "1.0.0").as_deref(),
            Some("pkg:npm/left-pad@1.0.0")
        );
        assert_eq!(
            derive_purl(PackageType::Python, "requests", "2.0.0").as_deref(),
            Some("pkg:pypi/requests@2.0.0")
        );
    }

    #[test]
    fn test_derive_without_version() {
        assert_eq!(
            derive_purl(PackageType::RustCrate, "serde", "").as_deref(),
            Some("pkg:cargo/serde")
        );
    }

    #[test]
    fn test_derive_scoped_npm() {
        let purl = derive_purl(PackageType::Npm, "@angular/core", "17.0.0").expect("purl");
        assert!(purl.starts_with("pkg:npm/"));
        assert!(purl.ends_with("/core@17.0.0"));
    }

    #[test]
    fn test_derive_empty_name() {
        assert!(derive_purl(PackageType::Npm, "", "1.0").is_none());
    }

    #[test]
    fn test_package_type_from_purl() {
        assert_eq!(
            package_type_from_purl("pkg:pypi/requests@2.0.0"),
            Some(PackageType::Python)
        );
        assert_eq!(
            package_type_from_purl("pkg:maven/org.apache/commons@1.0"),
            Some(PackageType::JavaArchive)
        );
        assert_eq!(package_type_from_purl("not a purl"), None);
    }
}
