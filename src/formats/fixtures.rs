//! Shared documents for codec unit tests.

use crate::model::{
    Endpoint, Language, Location, Package, PackageType, Relationship, RelationshipKind, Sbom,
    Scope, Source,
};
use chrono::{TimeZone, Utc};

/// A small image document exercising every relationship kind and license class.
pub(crate) fn sample_sbom() -> Sbom {
    let source = Source::image("docker.io/library/app:1.0", Scope::AllLayers)
        .with_digest("sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08");
    let mut builder = Sbom::builder(source)
        .created(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid date"));

    let mut add = |package: Package| builder.add_package(package).expect("named package");
    let left_pad = add(
        Package::new("left-pad", "1.0.0", PackageType::Npm)
            .with_location(
                Location::new("/app/node_modules/left-pad/package.json").with_layer("sha256:aaa"),
            )
            .with_license("MIT")
            .with_metadata("author", serde_json::json!("azer")),
    );
    let requests = add(
        Package::new("requests", "2.31.0", PackageType::Python)
            .with_location(Location::new("/usr/lib/python3/site-packages/requests"))
            .with_license("Apache-2.0")
            .with_metadata("files", serde_json::json!(["a.py", "b.py"])),
    );
    let tool = add(
        Package::new("vendor-tool", "", PackageType::Binary)
            .with_language(Language::Unknown)
            .with_license("Custom Vendor License"),
    );
    let dual = add(
        Package::new("serde", "1.0.200", PackageType::RustCrate).with_license("MIT OR Apache-2.0"),
    );

    let edges = [
        (Endpoint::Root, Endpoint::from(&left_pad), RelationshipKind::Contains),
        (Endpoint::Root, Endpoint::from(&requests), RelationshipKind::Contains),
        (Endpoint::Root, Endpoint::from(&tool), RelationshipKind::Contains),
        (Endpoint::Root, Endpoint::from(&dual), RelationshipKind::Contains),
        (Endpoint::from(&left_pad), Endpoint::from(&requests), RelationshipKind::DependsOn),
        (Endpoint::from(&tool), Endpoint::from(&dual), RelationshipKind::Contains),
        (Endpoint::from(&dual), Endpoint::Root, RelationshipKind::DescribedBy),
    ];
    for (from, to, kind) in edges {
        builder
            .add_relationship(Relationship::new(from, to, kind))
            .expect("fixture relationships are valid");
    }

    builder.build()
}

/// Identity-bearing view of a document, for round-trip assertions.
pub(crate) fn identity_view(sbom: &Sbom) -> (Vec<String>, Vec<String>) {
    let mut packages: Vec<String> = sbom
        .packages()
        .map(|p| {
            let locations: Vec<String> = p
                .locations()
                .iter()
                .map(|l| format!("{}@{}", l.path, l.layer_id.as_deref().unwrap_or("")))
                .collect();
            format!(
                "{}|{}|{}|{}",
                p.name(),
                p.version(),
                p.package_type(),
                locations.join(",")
            )
        })
        .collect();
    packages.sort();

    let mut relationships: Vec<String> = sbom.relationships().map(ToString::to_string).collect();
    relationships.sort();

    (packages, relationships)
}
