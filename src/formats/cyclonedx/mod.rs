//! `CycloneDX` codecs (JSON and XML, spec 1.4 through 1.6).
//!
//! Both flavors share one object model ([`bom`]) and one conversion layer
//! ([`convert`]); the XML flavor adds a mirror model for the element layout.

mod bom;
pub mod convert;
mod xml;

use super::detection::{json_str, probe_json, probe_xml_root};
use super::traits::{ContentHead, Format, FormatError, FormatId};
use super::FormatOptions;
use crate::model::Sbom;
use std::io::{Read, Write};

pub use xml::CYCLONEDX_NAMESPACE;

/// Supported spec versions, newest first.
pub const CYCLONEDX_VERSIONS: [&str; 3] = ["1.6", "1.5", "1.4"];

/// Version the `cyclonedx-*` names resolve to unless configured otherwise.
pub const DEFAULT_VERSION: &str = "1.5";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CycloneDxFlavor {
    Json,
    Xml,
}

/// Minor number of a `1.x` spec version.
pub(crate) fn spec_minor(version: &str) -> Option<u32> {
    version.strip_prefix("1.")?.parse().ok()
}

// ============================================================================
// JSON
// ============================================================================

/// `CycloneDX` JSON codec for one spec version.
#[derive(Debug, Clone)]
pub struct CycloneDxJsonFormat {
    version: String,
    pretty: bool,
}

impl CycloneDxJsonFormat {
    #[must_use]
    pub fn new(version: &str, options: &FormatOptions) -> Self {
        Self {
            version: version.to_string(),
            pretty: options.pretty,
        }
    }
}

impl Format for CycloneDxJsonFormat {
    fn id(&self) -> FormatId {
        FormatId::CycloneDxJson
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn sniff(&self, head: &ContentHead<'_>) -> Option<String> {
        let keys = probe_json(head, &["bomFormat", "specVersion"])?;
        if json_str(&keys, "bomFormat")? != bom::BOM_FORMAT {
            return None;
        }
        Some(json_str(&keys, "specVersion").unwrap_or_default().to_string())
    }

    fn encode(&self, writer: &mut dyn Write, sbom: &Sbom) -> Result<(), FormatError> {
        let document = convert::to_bom(sbom, CycloneDxFlavor::Json, &self.version);
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
        let document: bom::Bom = serde_json::from_reader(reader)
            .map_err(|e| FormatError::from_json_decode(self.id(), e))?;
        convert::from_bom(document, self.id())
    }
}

// ============================================================================
// XML
// ============================================================================

/// `CycloneDX` XML codec for one spec version.
#[derive(Debug, Clone)]
pub struct CycloneDxXmlFormat {
    version: String,
    pretty: bool,
}

impl CycloneDxXmlFormat {
    #[must_use]
    pub fn new(version: &str, options: &FormatOptions) -> Self {
        Self {
            version: version.to_string(),
            pretty: options.pretty,
        }
    }
}

impl Format for CycloneDxXmlFormat {
    fn id(&self) -> FormatId {
        FormatId::CycloneDxXml
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn sniff(&self, head: &ContentHead<'_>) -> Option<String> {
        let root = probe_xml_root(head)?;
        if root.local_name != "bom" {
            return None;
        }
        root.namespaces
            .iter()
            .find_map(|ns| ns.strip_prefix(CYCLONEDX_NAMESPACE))
            .map(str::to_string)
    }

    fn encode(&self, writer: &mut dyn Write, sbom: &Sbom) -> Result<(), FormatError> {
        let document = xml::XmlBom::from_bom(convert::to_bom(
            sbom,
            CycloneDxFlavor::Xml,
            &self.version,
        ));

        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::with_root(&mut body, Some("bom"))
            .map_err(|e| FormatError::encode(self.id(), e.to_string()))?;
        if self.pretty {
            serializer.indent(' ', 2);
        }
        serde::Serialize::serialize(&document, serializer)
            .map_err(|e| FormatError::encode(self.id(), e.to_string()))?;

        writer.write_all(XML_DECLARATION.as_bytes())?;
        writer.write_all(body.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn can_decode(&self) -> bool {
        true
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<Sbom, FormatError> {
        let mut input = Vec::new();
        reader.read_to_end(&mut input)?;
        let head = ContentHead::new(&input);

        let version = self
            .sniff(&head)
            .ok_or_else(|| FormatError::malformed(self.id(), "missing CycloneDX bom root"))?;

        let text = std::str::from_utf8(head_stripped(&input))
            .map_err(|e| FormatError::malformed(self.id(), e.to_string()))?;
        let document: xml::XmlBom = quick_xml::de::from_str(text)
            .map_err(|e| FormatError::malformed(self.id(), e.to_string()))?;

        let version = document
            .namespace_version()
            .map_or(version, str::to_string);
        convert::from_bom(document.into_bom(version), self.id())
    }
}

/// Input without a leading UTF-8 BOM.
fn head_stripped(input: &[u8]) -> &[u8] {
    input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::fixtures::{identity_view, sample_sbom};
    use crate::formats::{encode_to_vec, registry, Identification};
    use crate::model::{Package, PackageType, Source};

    fn options() -> FormatOptions {
        FormatOptions::default()
    }

    #[test]
    fn test_spec_minor() {
        assert_eq!(spec_minor("1.5"), Some(5));
        assert_eq!(spec_minor("1.16"), Some(16));
        assert_eq!(spec_minor("2.0"), None);
        assert_eq!(spec_minor("1."), None);
    }

    #[test]
    fn test_json_roundtrip() {
        let sbom = sample_sbom();
        let format = CycloneDxJsonFormat::new("1.5", &options());
        let bytes = encode_to_vec(&format, &sbom).expect("encode");

        assert_eq!(
            registry().identify(&bytes),
            Some(Identification::new(FormatId::CycloneDxJson, "1.5"))
        );
        let decoded = format.decode(&mut bytes.as_slice()).expect("decode");
        assert_eq!(identity_view(&decoded), identity_view(&sbom));
    }

    #[test]
    fn test_xml_roundtrip() {
        let sbom = sample_sbom();
        for version in CYCLONEDX_VERSIONS {
            let format = CycloneDxXmlFormat::new(version, &options());
            let bytes = encode_to_vec(&format, &sbom).expect("encode");
            let text = String::from_utf8(bytes.clone()).expect("utf-8");
            assert!(text.starts_with("<?xml"));
            assert!(text.contains(&format!("{CYCLONEDX_NAMESPACE}{version}")));

            assert_eq!(
                registry().identify(&bytes),
                Some(Identification::new(FormatId::CycloneDxXml, version))
            );
            let decoded = format.decode(&mut bytes.as_slice()).expect("decode");
            assert_eq!(identity_view(&decoded), identity_view(&sbom));
            assert_eq!(decoded.source(), sbom.source());
            assert_eq!(decoded.created(), sbom.created());
        }
    }

    #[test]
    fn test_xml_metadata_keeps_value_types() {
        let mut builder = Sbom::builder(Source::directory("/src"));
        builder
            .add_package(
                Package::new("meta", "1", PackageType::Npm)
                    .with_metadata("bracketed", serde_json::json!("[1]"))
                    .with_metadata("count", serde_json::json!(1)),
            )
            .expect("named package");
        let sbom = builder.build();

        let format = CycloneDxXmlFormat::new("1.5", &options());
        let bytes = encode_to_vec(&format, &sbom).expect("encode");
        let decoded = format.decode(&mut bytes.as_slice()).expect("decode");
        let metadata = decoded.packages().next().expect("one package").metadata();
        assert_eq!(metadata["bracketed"], serde_json::json!("[1]"));
        assert_eq!(metadata["count"], serde_json::json!(1));
    }

    #[test]
    fn test_json_sniff_requires_bom_format() {
        let format = CycloneDxJsonFormat::new("1.5", &options());
        let head = ContentHead::new(br#"{"bomFormat": "CycloneDX", "specVersion": "1.4"}"#);
        assert_eq!(format.sniff(&head).as_deref(), Some("1.4"));

        let head = ContentHead::new(br#"{"bomFormat": "Other", "specVersion": "1.4"}"#);
        assert_eq!(format.sniff(&head), None);
        let head = ContentHead::new(br#"{"spdxVersion": "SPDX-2.3"}"#);
        assert_eq!(format.sniff(&head), None);
    }

    #[test]
    fn test_xml_sniff_requires_namespace() {
        let format = CycloneDxXmlFormat::new("1.5", &options());
        let head = ContentHead::new(
            br#"<?xml version="1.0"?><bom xmlns="http://cyclonedx.org/schema/bom/1.6" version="1"/>"#,
        );
        assert_eq!(format.sniff(&head).as_deref(), Some("1.6"));

        let head = ContentHead::new(br#"<bom xmlns="http://example.com/bom"/>"#);
        assert_eq!(format.sniff(&head), None);
        let head = ContentHead::new(br#"<project xmlns="http://cyclonedx.org/schema/bom/1.6"/>"#);
        assert_eq!(format.sniff(&head), None);
    }

    #[test]
    fn test_xml_decode_rejects_wrong_root() {
        let format = CycloneDxXmlFormat::new("1.5", &options());
        let err = format
            .decode(&mut b"<project/>".as_slice())
            .expect_err("wrong root");
        assert!(matches!(err, FormatError::Malformed { .. }));
    }

    #[test]
    fn test_compact_json() {
        let compact = FormatOptions {
            pretty: false,
            ..FormatOptions::default()
        };
        let format = CycloneDxJsonFormat::new("1.5", &compact);
        let bytes = encode_to_vec(&format, &sample_sbom()).expect("encode");
        let text = String::from_utf8(bytes).expect("utf-8");
        assert_eq!(text.lines().count(), 1);
    }
}
