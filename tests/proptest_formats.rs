//! Property-based tests for format identification and decoding.
//!
//! Ensures identification and decoding never panic on arbitrary input,
//! including random strings, JSON-like, XML-like and tag-value-like fragments,
//! and that generated documents, with names and locations full of markup and
//! line breaks, survive a trip through each decodable format.

use proptest::prelude::*;
use sbom_convert::formats::{self, FormatId};
use sbom_convert::model::{
    Endpoint, Location, Package, PackageType, Relationship, RelationshipKind, Sbom, Source,
};

fn identify_and_decode(input: &[u8]) {
    let _ = formats::identify(input);
    let _ = formats::decode(input);
}

proptest! {
    // Random input is expected to produce Err in almost all cases, so these
    // only assert no-panic.
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn random_text_doesnt_panic(s in "\\PC{0,2000}") {
        identify_and_decode(s.as_bytes());
    }

    #[test]
    fn random_bytes_dont_panic(bytes in prop::collection::vec(any::<u8>(), 0..2000)) {
        identify_and_decode(&bytes);
    }

    #[test]
    fn json_like_input_doesnt_panic(
        s in prop::string::string_regex(r#"\{[^\}]{0,500}\}"#).unwrap()
    ) {
        identify_and_decode(s.as_bytes());
    }

    #[test]
    fn xml_like_input_doesnt_panic(
        s in prop::string::string_regex(r#"<[a-z]{1,20}( xmlns="[^"]{0,60}")?>[^<]{0,200}</[a-z]{1,20}>"#).unwrap()
    ) {
        identify_and_decode(s.as_bytes());
    }

    #[test]
    fn cyclonedx_xml_root_doesnt_panic(version in "1\\.[0-9]", body in "\\PC{0,200}") {
        let input = format!(
            r#"<?xml version="1.0"?><bom xmlns="http://cyclonedx.org/schema/bom/{version}">{body}</bom>"#
        );
        identify_and_decode(input.as_bytes());
    }

    #[test]
    fn tag_value_like_input_doesnt_panic(
        lines in prop::collection::vec(("[A-Za-z]{1,20}", "\\PC{0,80}"), 0..20)
    ) {
        let mut input = String::from("SPDXVersion: SPDX-2.3\n");
        for (tag, value) in lines {
            input.push_str(&format!("{tag}: {value}\n"));
        }
        identify_and_decode(input.as_bytes());
    }

    #[test]
    fn empty_and_whitespace_is_never_identified(s in "[ \\t\\r\\n]{0,100}") {
        prop_assert!(formats::identify(s.as_bytes()).is_none());
        prop_assert!(formats::decode(s.as_bytes()).is_err());
    }

    #[test]
    fn cyclonedx_partial_json_doesnt_panic(version in "1\\.[0-9]", extra in "\\PC{0,200}") {
        let input = format!(r#"{{"bomFormat": "CycloneDX", "specVersion": "{version}", {extra}}}"#);
        identify_and_decode(input.as_bytes());
    }

    #[test]
    fn spdx_partial_json_doesnt_panic(version in "SPDX-[0-9]\\.[0-9]", extra in "\\PC{0,200}") {
        let input = format!(r#"{{"spdxVersion": "{version}", "SPDXID": "SPDXRef-DOCUMENT", {extra}}}"#);
        identify_and_decode(input.as_bytes());
    }
}

// ============================================================================
// Round trips
// ============================================================================

fn arb_package_type() -> impl Strategy<Value = PackageType> {
    prop::sample::select(PackageType::ALL.to_vec())
}

/// Free text mixing arbitrary printable runs with tag-value markup and
/// line breaks.
fn arb_text() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        4 => "\\PC{1,6}",
        1 => Just("<text>".to_string()),
        1 => Just("</text>".to_string()),
        1 => Just("\n".to_string()),
        1 => Just(" ".to_string()),
    ];
    prop::collection::vec(piece, 1..6).prop_map(|pieces| pieces.concat())
}

fn arb_target() -> impl Strategy<Value = String> {
    "/[a-z0-9._-]{1,12}(/[a-z0-9._-]{1,12}){0,2}"
}

/// Documents with arbitrary package names and locations. `trim` drops edge
/// whitespace, which XML readers do not preserve.
fn arb_sbom(trim: bool) -> impl Strategy<Value = Sbom> {
    let package = (
        arb_text(),
        "[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}",
        arb_package_type(),
        arb_text(),
    );
    (
        prop::collection::vec(package, 0..12),
        arb_target(),
        any::<bool>(),
    )
        .prop_map(move |(packages, target, chain)| {
            let clean = |text: String| if trim { text.trim().to_string() } else { text };
            let mut builder = Sbom::builder(Source::directory(target));
            let mut ids = Vec::new();
            for (name, version, package_type, path) in packages {
                let name = clean(name);
                if name.trim().is_empty() {
                    continue;
                }
                let package = Package::new(name, version, package_type)
                    .with_location(Location::new(clean(path)));
                let id = builder.add_package(package).expect("non-blank name");
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            for id in &ids {
                builder
                    .add_relationship(Relationship::new(Endpoint::Root, id, RelationshipKind::Contains))
                    .expect("root edge");
            }
            if chain {
                for pair in ids.windows(2) {
                    builder
                        .add_relationship(Relationship::new(
                            &pair[0],
                            &pair[1],
                            RelationshipKind::DependsOn,
                        ))
                        .expect("chain edge");
                }
            }
            builder.build()
        })
}

fn name_versions(sbom: &Sbom) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = sbom
        .packages()
        .map(|p| (p.name().to_string(), p.version().to_string()))
        .collect();
    entries.sort();
    entries
}

fn ids(sbom: &Sbom) -> Vec<String> {
    let mut ids: Vec<String> = sbom.packages().map(|p| p.id().to_string()).collect();
    ids.sort();
    ids
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decodable_formats_preserve_packages(sbom in arb_sbom(true)) {
        for format in formats::registry().decoders() {
            let encoded = formats::encode_to_vec(format.as_ref(), &sbom);
            if format.id() == FormatId::SpdxTagValue
                && sbom.packages().any(|p| p.name().contains("</text>"))
            {
                prop_assert!(encoded.is_err(), "tag-value cannot carry '</text>' in a name");
                continue;
            }
            let bytes = encoded.expect("encode");
            let found = formats::identify(&bytes).expect("own output is identified");
            prop_assert_eq!(found.id, format.id());

            let decoded = formats::decode(&bytes).expect("own output decodes");
            prop_assert_eq!(name_versions(&decoded), name_versions(&sbom), "{}", format.id());
            prop_assert_eq!(
                decoded.relationship_count(),
                sbom.relationship_count(),
                "{}",
                format.id()
            );
            prop_assert_eq!(&decoded.source().target, &sbom.source().target, "{}", format.id());
        }
    }

    #[test]
    fn json_formats_preserve_identity(sbom in arb_sbom(false)) {
        for id in [FormatId::SbomJson, FormatId::CycloneDxJson, FormatId::SpdxJson] {
            let format = formats::registry().by_id(id).expect("registered");
            let bytes = formats::encode_to_vec(format.as_ref(), &sbom).expect("encode");
            let decoded = formats::decode(&bytes).expect("decode");

            prop_assert_eq!(ids(&decoded), ids(&sbom), "{}", id);
            prop_assert_eq!(decoded.relationship_count(), sbom.relationship_count(), "{}", id);
            prop_assert_eq!(decoded.source(), sbom.source(), "{}", id);
            prop_assert_eq!(decoded.id(), sbom.id(), "{}", id);
        }
    }

    // Locations travel in escaped annotation JSON, so only names can block
    // tag-value encoding.
    #[test]
    fn tag_value_preserves_identity_without_terminators(sbom in arb_sbom(false)) {
        let format = formats::registry().by_id(FormatId::SpdxTagValue).expect("registered");
        let encoded = formats::encode_to_vec(format.as_ref(), &sbom);
        if sbom.packages().any(|p| p.name().contains("</text>")) {
            prop_assert!(encoded.is_err());
        } else {
            let bytes = encoded.expect("encode");
            let decoded = formats::decode(&bytes).expect("decode");
            prop_assert_eq!(ids(&decoded), ids(&sbom));
            prop_assert_eq!(decoded.relationship_count(), sbom.relationship_count());
            prop_assert_eq!(decoded.source(), sbom.source());
        }
    }
}
