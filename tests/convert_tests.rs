//! End-to-end conversion tests
//!
//! Every decodable format is converted to every format through
//! `pipeline::convert`, and each written file is identified again.

use sbom_convert::{
    config::AppConfig,
    formats::{self, FormatId},
    model::{Endpoint, Location, Package, PackageType, Relationship, RelationshipKind, Sbom, Source},
    pipeline::{self, exit_code_for, exit_codes, InputSource},
};
use std::path::PathBuf;
use tempfile::TempDir;

fn sample() -> Sbom {
    let mut builder = Sbom::builder(Source::directory("/srv/app"));
    let left_pad = builder
        .add_package(
            Package::new("left-pad", "1.0.0", PackageType::Npm)
                .with_location(Location::new("/srv/app/node_modules/left-pad/package.json"))
                .with_license("MIT"),
        )
        .expect("named package");
    let requests = builder
        .add_package(
            Package::new("requests", "2.31.0", PackageType::Python)
                .with_location(Location::new("/srv/app/requirements.txt"))
                .with_license("Apache-2.0"),
        )
        .expect("named package");
    for (from, to, kind) in [
        (Endpoint::Root, Endpoint::from(&left_pad), RelationshipKind::Contains),
        (Endpoint::Root, Endpoint::from(&requests), RelationshipKind::Contains),
        (Endpoint::from(&left_pad), Endpoint::from(&requests), RelationshipKind::DependsOn),
    ] {
        builder
            .add_relationship(Relationship::new(from, to, kind))
            .expect("valid relationship");
    }
    builder.build()
}

fn write_input(dir: &TempDir, id: FormatId) -> PathBuf {
    let format = formats::registry().by_id(id).expect("registered");
    let bytes = formats::encode_to_vec(format.as_ref(), &sample()).expect("encode");
    let path = dir.path().join(format!("input.{}", id.as_str()));
    std::fs::write(&path, bytes).expect("write input");
    path
}

fn quiet_config() -> AppConfig {
    AppConfig::builder().quiet(true).build()
}

#[test]
fn test_convert_every_format_to_every_format() {
    let config = quiet_config();

    let decodable = FormatId::ALL.into_iter().filter(|id| {
        formats::registry()
            .by_id(*id)
            .is_some_and(|f| f.can_decode())
    });
    for input_id in decodable {
        let dir = TempDir::new().expect("temp dir");
        let input = write_input(&dir, input_id);

        let outputs: Vec<(FormatId, PathBuf)> = FormatId::ALL
            .into_iter()
            .map(|id| (id, dir.path().join(format!("out.{}", id.as_str()))))
            .collect();
        let destinations: Vec<String> = outputs
            .iter()
            .map(|(id, path)| format!("{id}={}", path.display()))
            .collect();

        let mut stdout = Vec::new();
        let summary = pipeline::convert(
            &InputSource::File(input),
            &destinations,
            &config,
            &mut stdout,
        )
        .unwrap_or_else(|e| panic!("converting from {input_id}: {e}"));

        assert_eq!(summary.input_format.id, input_id);
        assert_eq!(summary.package_count, 2, "from {input_id}");
        assert_eq!(summary.destinations.len(), FormatId::ALL.len());
        assert!(stdout.is_empty(), "nothing goes to stdout");

        for (id, path) in &outputs {
            let bytes = std::fs::read(path).expect("output written");
            let found = formats::identify(&bytes);
            if *id == FormatId::Table {
                assert!(found.is_none(), "table output from {input_id} was identified");
            } else {
                let found = found.unwrap_or_else(|| panic!("{id} output from {input_id}"));
                assert_eq!(found.id, *id, "from {input_id}");
                let decoded = formats::decode(&bytes).expect("decode output");
                assert_eq!(decoded.package_count(), 2, "{input_id} -> {id}");
            }
        }
    }
}

#[test]
fn test_convert_to_stdout_and_file() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, FormatId::CycloneDxJson);
    let spdx_path = dir.path().join("sbom.spdx.json");

    let mut stdout = Vec::new();
    pipeline::convert(
        &InputSource::File(input),
        &["table".to_string(), format!("spdx-json={}", spdx_path.display())],
        &quiet_config(),
        &mut stdout,
    )
    .expect("convert");

    let table = String::from_utf8(stdout).expect("utf-8");
    assert!(table.starts_with("NAME"));
    assert!(table.contains("left-pad"));
    assert!(table.contains("requests"));

    let written = std::fs::read(&spdx_path).expect("spdx written");
    assert_eq!(
        formats::identify(&written).map(|f| f.id),
        Some(FormatId::SpdxJson)
    );
}

#[test]
fn test_pinned_version_is_written() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, FormatId::SbomJson);
    let out = dir.path().join("bom.xml");

    pipeline::convert(
        &InputSource::File(input),
        &[format!("cyclonedx-xml@1.4={}", out.display())],
        &quiet_config(),
        &mut Vec::new(),
    )
    .expect("convert");

    let found = formats::identify(&std::fs::read(&out).expect("read")).expect("identified");
    assert_eq!(found.id, FormatId::CycloneDxXml);
    assert_eq!(found.version, "1.4");
}

#[test]
fn test_configured_default_version_applies() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, FormatId::SbomJson);
    let out = dir.path().join("bom.json");

    let config = AppConfig::builder()
        .quiet(true)
        .cyclonedx_version("1.6")
        .build();
    pipeline::convert(
        &InputSource::File(input),
        &[format!("cyclonedx-json={}", out.display())],
        &config,
        &mut Vec::new(),
    )
    .expect("convert");

    let found = formats::identify(&std::fs::read(&out).expect("read")).expect("identified");
    assert_eq!(found.version, "1.6");
}

#[test]
fn test_unknown_destination_format_writes_nothing() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_input(&dir, FormatId::SbomJson);
    let out = dir.path().join("out.json");

    let err = pipeline::convert(
        &InputSource::File(input),
        &[
            format!("spdx-json={}", out.display()),
            "not-a-format=x.json".to_string(),
        ],
        &quiet_config(),
        &mut Vec::new(),
    )
    .expect_err("unknown format");

    assert_eq!(exit_code_for(&err), exit_codes::INVALID_INPUT);
    assert!(!out.exists(), "no destination is written before resolution succeeds");
}

#[test]
fn test_unidentifiable_input_exit_code() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("notes.txt");
    std::fs::write(&input, "just some notes\n").expect("write");

    let err = pipeline::convert(
        &InputSource::File(input),
        &["table".to_string()],
        &quiet_config(),
        &mut Vec::new(),
    )
    .expect_err("unidentifiable");
    assert_eq!(exit_code_for(&err), exit_codes::UNKNOWN_FORMAT);
}

#[test]
fn test_malformed_input_exit_code() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("bom.json");
    std::fs::write(
        &input,
        r#"{"bomFormat": "CycloneDX", "specVersion": "1.5", "components": [{"type": 7}]}"#,
    )
    .expect("write");

    let err = pipeline::convert(
        &InputSource::File(input),
        &["table".to_string()],
        &quiet_config(),
        &mut Vec::new(),
    )
    .expect_err("malformed");
    assert_eq!(exit_code_for(&err), exit_codes::INVALID_INPUT);
}

#[test]
fn test_missing_input_exit_code() {
    let dir = TempDir::new().expect("temp dir");
    let err = pipeline::convert(
        &InputSource::File(dir.path().join("missing.json")),
        &["table".to_string()],
        &quiet_config(),
        &mut Vec::new(),
    )
    .expect_err("missing");
    assert_eq!(exit_code_for(&err), exit_codes::ERROR);
}
