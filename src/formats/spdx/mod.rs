//! SPDX 2.x codecs (JSON and tag-value).

pub mod convert;
mod document;
mod tagvalue;

use super::detection::{first_tag, json_str, probe_json};
use super::traits::{ContentHead, Format, FormatError, FormatId};
use super::FormatOptions;
use crate::model::Sbom;
use std::io::{Read, Write};

/// Supported SPDX versions, newest first.
pub const SPDX_VERSIONS: [&str; 2] = ["2.3", "2.2"];

/// Version the `spdx-*` names resolve to unless configured otherwise.
pub const DEFAULT_VERSION: &str = "2.3";

const VERSION_PREFIX: &str = "SPDX-";

/// SPDX JSON codec for one spec version.
#[derive(Debug, Clone)]
pub struct SpdxJsonFormat {
    version: String,
    namespace_base: String,
    pretty: bool,
}

impl SpdxJsonFormat {
    #[must_use]
    pub fn new(version: &str, options: &FormatOptions) -> Self {
        Self {
            version: version.to_string(),
            namespace_base: options.spdx_namespace_base.clone(),
            pretty: options.pretty,
        }
    }
}

impl Format for SpdxJsonFormat {
    fn id(&self) -> FormatId {
        FormatId::SpdxJson
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn sniff(&self, head: &ContentHead<'_>) -> Option<String> {
        let keys = probe_json(head, &["spdxVersion"])?;
        let version = json_str(&keys, "spdxVersion")?.trim();
        Some(version.strip_prefix(VERSION_PREFIX)?.to_string())
    }

    fn encode(&self, writer: &mut dyn Write, sbom: &Sbom) -> Result<(), FormatError> {
        let document =
            convert::to_document(sbom, self.id(), &self.version, &self.namespace_base)?;
        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &document)
        } else {
            serde_json::to_writer(&mut *writer, &document)
        };
        result.map_err(|e| FormatError::from_json_encode(self.id(), e))?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn can_decode(&self) -> bool {
        true
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<Sbom, FormatError> {
        let document: document::SpdxDocument = serde_json::from_reader(reader)
            .map_err(|e| FormatError::from_json_decode(self.id(), e))?;
        convert::from_document(document, self.id())
    }
}

/// SPDX tag-value codec for one spec version.
#[derive(Debug, Clone)]
pub struct SpdxTagValueFormat {
    version: String,
    namespace_base: String,
}

impl SpdxTagValueFormat {
    #[must_use]
    pub fn new(version: &str, options: &FormatOptions) -> Self {
        Self {
            version: version.to_string(),
            namespace_base: options.spdx_namespace_base.clone(),
        }
    }
}

impl Format for SpdxTagValueFormat {
    fn id(&self) -> FormatId {
        FormatId::SpdxTagValue
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn sniff(&self, head: &ContentHead<'_>) -> Option<String> {
        let (tag, value) = first_tag(head)?;
        if tag != "SPDXVersion" {
            return None;
        }
        Some(value.strip_prefix(VERSION_PREFIX)?.to_string())
    }

    fn encode(&self, writer: &mut dyn Write, sbom: &Sbom) -> Result<(), FormatError> {
        let document =
            convert::to_document(sbom, self.id(), &self.version, &self.namespace_base)?;
        tagvalue::write(writer, &document)?;
        Ok(())
    }

    fn can_decode(&self) -> bool {
        true
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<Sbom, FormatError> {
        let mut input = Vec::new();
        reader.read_to_end(&mut input)?;
        let input = input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&input);
        let text = std::str::from_utf8(input)
            .map_err(|e| FormatError::malformed(self.id(), e.to_string()))?;
        convert::from_document(tagvalue::parse(text)?, self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::fixtures::{identity_view, sample_sbom};
    use crate::formats::{encode_to_vec, registry, Identification};
    use crate::model::{Location, Package, PackageType, Source};

    #[test]
    fn test_json_roundtrip_and_identify() {
        let sbom = sample_sbom();
        for version in SPDX_VERSIONS {
            let format = SpdxJsonFormat::new(version, &FormatOptions::default());
            let bytes = encode_to_vec(&format, &sbom).expect("encode");
            assert_eq!(
                registry().identify(&bytes),
                Some(Identification::new(FormatId::SpdxJson, version))
            );
            let decoded = format.decode(&mut bytes.as_slice()).expect("decode");
            assert_eq!(identity_view(&decoded), identity_view(&sbom));
            assert_eq!(decoded.source(), sbom.source());
        }
    }

    #[test]
    fn test_tag_value_roundtrip_and_identify() {
        let sbom = sample_sbom();
        for version in SPDX_VERSIONS {
            let format = SpdxTagValueFormat::new(version, &FormatOptions::default());
            let bytes = encode_to_vec(&format, &sbom).expect("encode");
            assert_eq!(
                registry().identify(&bytes),
                Some(Identification::new(FormatId::SpdxTagValue, version))
            );
            let decoded = format.decode(&mut bytes.as_slice()).expect("decode");
            assert_eq!(identity_view(&decoded), identity_view(&sbom));
            assert_eq!(decoded.source(), sbom.source());
            assert_eq!(decoded.id(), sbom.id());
        }
    }

    fn single_package(package: Package) -> Sbom {
        let mut builder = Sbom::builder(Source::directory("/src"));
        builder.add_package(package).expect("named package");
        builder.build()
    }

    #[test]
    fn test_tag_value_keeps_awkward_values() {
        let format = SpdxTagValueFormat::new("2.3", &FormatOptions::default());
        for name in ["<text>x", "a\nb", " pad", "pad ", "<text>", "r\r\n"] {
            let sbom = single_package(
                Package::new(name, "1.0", PackageType::Npm)
                    .with_location(Location::new("/a</text>b"))
                    .with_location(Location::new("/c\n<text>d")),
            );
            let bytes = encode_to_vec(&format, &sbom).expect("encode");
            let decoded = format.decode(&mut bytes.as_slice()).expect("decode");

            assert_eq!(decoded.package_count(), 1, "{name:?}");
            let original = sbom.packages().next().expect("package");
            let back = decoded.package(original.id()).expect("same artifact id");
            assert_eq!(back.name(), name);
            assert_eq!(back.locations(), original.locations());
        }
    }

    #[test]
    fn test_tag_value_rejects_text_terminator() {
        let format = SpdxTagValueFormat::new("2.3", &FormatOptions::default());
        let sbom = single_package(Package::new("x</text>y", "1.0", PackageType::Npm));
        let mut out = Vec::new();
        let err = format.encode(&mut out, &sbom).expect_err("no tag-value form");
        assert!(matches!(err, FormatError::Encode { .. }), "{err}");
        assert!(out.is_empty());
    }

    #[test]
    fn test_json_keeps_padded_names() {
        let format = SpdxJsonFormat::new("2.3", &FormatOptions::default());
        let sbom = single_package(Package::new(" pad ", "1.0", PackageType::Npm));
        let bytes = encode_to_vec(&format, &sbom).expect("encode");
        let decoded = format.decode(&mut bytes.as_slice()).expect("decode");
        let original = sbom.packages().next().expect("package");
        let back = decoded.package(original.id()).expect("same artifact id");
        assert_eq!(back.name(), " pad ");
    }

    #[test]
    fn test_unreadable_tool_annotation_is_malformed() {
        let format = SpdxTagValueFormat::new("2.3", &FormatOptions::default());
        let sbom = single_package(Package::new("lib", "1.0", PackageType::Npm));
        let bytes = encode_to_vec(&format, &sbom).expect("encode");
        let text = String::from_utf8(bytes).expect("utf-8");
        let broken = text.replacen("sbom-convert:package={", "sbom-convert:package={oops", 1);
        assert_ne!(broken, text);

        let err = format
            .decode(&mut broken.as_bytes())
            .expect_err("unreadable annotation");
        assert!(matches!(err, FormatError::Malformed { .. }), "{err}");
    }

    #[test]
    fn test_custom_namespace_base() {
        let options = FormatOptions {
            spdx_namespace_base: "https://sbom.example.com/docs/".to_string(),
            ..FormatOptions::default()
        };
        let format = SpdxJsonFormat::new("2.3", &options);
        let bytes = encode_to_vec(&format, &sample_sbom()).expect("encode");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        let namespace = value["documentNamespace"].as_str().expect("namespace");
        assert!(namespace.starts_with("https://sbom.example.com/docs/image/"));
    }

    #[test]
    fn test_sniff_requires_spdx_prefix() {
        let json = SpdxJsonFormat::new("2.3", &FormatOptions::default());
        assert_eq!(
            json.sniff(&ContentHead::new(br#"{"spdxVersion": "SPDX-2.2"}"#)).as_deref(),
            Some("2.2")
        );
        assert_eq!(json.sniff(&ContentHead::new(br#"{"spdxVersion": "2.2"}"#)), None);

        let tv = SpdxTagValueFormat::new("2.3", &FormatOptions::default());
        assert_eq!(
            tv.sniff(&ContentHead::new(b"# generated\nSPDXVersion: SPDX-2.3\n")).as_deref(),
            Some("2.3")
        );
        assert_eq!(tv.sniff(&ContentHead::new(b"DataLicense: CC0-1.0\n")), None);
    }

    #[test]
    fn test_tag_value_rejects_invalid_utf8() {
        let format = SpdxTagValueFormat::new("2.3", &FormatOptions::default());
        let err = format
            .decode(&mut b"SPDXVersion: SPDX-2.3\n\xff\xfe\n".as_slice())
            .expect_err("invalid utf-8");
        assert!(matches!(err, FormatError::Malformed { .. }));
    }
}
