//! Structural format identification.
//!
//! Identification never looks at file names or extensions. Each format's
//! sniffer inspects the head of the content through one of the probes below:
//! a top-level JSON key probe, an XML root element probe, or the first
//! meaningful line of a tag-value document. The registry tries formats in
//! registration order and the first positive sniff wins.

use super::registry::FormatRegistry;
use super::traits::{ContentHead, Format, FormatId, Identification};
use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// Identification
// ============================================================================

/// Identify `input` against every registered format.
///
/// Each family is sniffed once, through its first-registered entry. On a
/// positive sniff the entry whose version equals the detected version is
/// preferred; otherwise the family's first entry is returned together with
/// the detected version.
pub(crate) fn identify_entry(
    registry: &FormatRegistry,
    input: &[u8],
) -> Option<(Arc<dyn Format>, Identification)> {
    let head = ContentHead::new(input);
    if head.bytes().iter().all(u8::is_ascii_whitespace) {
        debug!("Empty input, nothing to identify");
        return None;
    }

    let mut tried: HashSet<FormatId> = HashSet::new();
    for format in registry.all() {
        let id = format.id();
        if !tried.insert(id) {
            continue;
        }
        let Some(version) = format.sniff(&head) else {
            continue;
        };

        debug!("Identified content as {id} (schema version '{version}')");
        let entry = registry
            .get(id, &version)
            .unwrap_or_else(|| Arc::clone(format));
        return Some((entry, Identification::new(id, version)));
    }

    debug!("No registered format matched the content");
    None
}

// ============================================================================
// JSON key probe
// ============================================================================

/// Top-level values read by [`probe_json`], keyed by the requested key.
pub(crate) type JsonKeys = BTreeMap<&'static str, Value>;

struct KeyProbe<'a> {
    wanted: &'a [&'static str],
    found: &'a mut JsonKeys,
}

impl<'de> DeserializeSeed<'de> for KeyProbe<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for KeyProbe<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            match self.wanted.iter().find(|w| **w == key) {
                Some(wanted) => {
                    let value = map.next_value::<Value>()?;
                    self.found.entry(wanted).or_insert(value);
                }
                None => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(())
    }
}

/// Read the requested top-level keys of a JSON object.
///
/// Returns `None` when the content is not a single JSON object. When the
/// window cut the document short, whatever keys were seen before the cut are
/// returned.
pub(crate) fn probe_json(head: &ContentHead<'_>, wanted: &[&'static str]) -> Option<JsonKeys> {
    let first = head
        .bytes()
        .iter()
        .find(|b| !b.is_ascii_whitespace())?;
    if *first != b'{' {
        return None;
    }

    let mut found = JsonKeys::new();
    let mut de = serde_json::Deserializer::from_slice(head.bytes());
    let result = KeyProbe {
        wanted,
        found: &mut found,
    }
    .deserialize(&mut de)
    .and_then(|()| de.end());

    match result {
        Ok(()) => Some(found),
        Err(e) if head.is_truncated() && e.is_eof() => Some(found),
        Err(e) => {
            debug!("JSON probe rejected content: {e}");
            None
        }
    }
}

/// String value of a probed key.
pub(crate) fn json_str<'a>(keys: &'a JsonKeys, key: &str) -> Option<&'a str> {
    keys.get(key).and_then(Value::as_str)
}

// ============================================================================
// XML root probe
// ============================================================================

/// The document element of an XML input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlRoot {
    pub local_name: String,
    /// Values of every `xmlns` / `xmlns:*` attribute on the root
    pub namespaces: Vec<String>,
}

/// Read the root element of an XML document.
///
/// When the whole input fits in the window the rest of the document is
/// scanned as well, and unbalanced or otherwise broken XML yields `None`.
pub(crate) fn probe_xml_root(head: &ContentHead<'_>) -> Option<XmlRoot> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let text = head.text()?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let (root, mut depth) = loop {
        match reader.read_event() {
            Ok(Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_)) => {}
            Ok(Event::Text(t)) if t.iter().all(u8::is_ascii_whitespace) => {}
            Ok(Event::Start(e)) => break (read_root(&e)?, 1_usize),
            Ok(Event::Empty(e)) => break (read_root(&e)?, 0_usize),
            Ok(_) => return None,
            Err(e) => {
                debug!("XML probe rejected content: {e}");
                return None;
            }
        }
    };

    if head.is_truncated() {
        return Some(root);
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => depth = depth.checked_sub(1)?,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("XML probe found malformed content: {e}");
                return None;
            }
        }
    }

    (depth == 0).then_some(root)
}

fn read_root(element: &quick_xml::events::BytesStart<'_>) -> Option<XmlRoot> {
    let local_name = std::str::from_utf8(element.local_name().as_ref())
        .ok()?
        .to_string();

    let mut namespaces = Vec::new();
    for attr in element.attributes() {
        let attr = attr.ok()?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            namespaces.push(attr.unescape_value().ok()?.into_owned());
        }
    }

    Some(XmlRoot {
        local_name,
        namespaces,
    })
}

// ============================================================================
// Tag-value probe
// ============================================================================

/// The first `Tag: value` line, skipping blank lines and `#` comments.
pub(crate) fn first_tag<'a>(head: &ContentHead<'a>) -> Option<(&'a str, &'a str)> {
    let text = head.text()?;
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))?;
    let (tag, value) = line.split_once(':')?;
    Some((tag.trim(), value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::traits::SNIFF_WINDOW;

    #[test]
    fn test_probe_json_reads_only_wanted_keys() {
        let input = br#"{"a": 1, "bomFormat": "CycloneDX", "nested": {"bomFormat": "x"}, "specVersion": "1.5"}"#;
        let keys = probe_json(&ContentHead::new(input), &["bomFormat", "specVersion"])
            .expect("object should probe");
        assert_eq!(json_str(&keys, "bomFormat"), Some("CycloneDX"));
        assert_eq!(json_str(&keys, "specVersion"), Some("1.5"));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_probe_json_rejects_non_objects() {
        assert!(probe_json(&ContentHead::new(b"[1, 2]"), &["a"]).is_none());
        assert!(probe_json(&ContentHead::new(b"\"text\""), &["a"]).is_none());
        assert!(probe_json(&ContentHead::new(b"not json"), &["a"]).is_none());
    }

    #[test]
    fn test_probe_json_rejects_truncated_within_window() {
        let input = br#"{"spdxVersion": "SPDX-2.3", "packages": ["#;
        assert!(probe_json(&ContentHead::new(input), &["spdxVersion"]).is_none());
    }

    #[test]
    fn test_probe_json_tolerates_window_cut() {
        let mut input = br#"{"spdxVersion": "SPDX-2.3", "padding": ""#.to_vec();
        input.resize(SNIFF_WINDOW + 100, b'x');
        let keys = probe_json(&ContentHead::new(&input), &["spdxVersion"])
            .expect("cut after discriminator is tolerated");
        assert_eq!(json_str(&keys, "spdxVersion"), Some("SPDX-2.3"));
    }

    #[test]
    fn test_probe_json_trailing_garbage() {
        assert!(probe_json(&ContentHead::new(br#"{"a": 1} {"b": 2}"#), &["a"]).is_none());
    }

    #[test]
    fn test_probe_xml_root() {
        let input = br#"<?xml version="1.0" encoding="UTF-8"?>
<!-- comment -->
<bom xmlns="http://cyclonedx.org/schema/bom/1.5" version="1"><components/></bom>"#;
        let root = probe_xml_root(&ContentHead::new(input)).expect("root");
        assert_eq!(root.local_name, "bom");
        assert_eq!(root.namespaces, vec!["http://cyclonedx.org/schema/bom/1.5"]);
    }

    #[test]
    fn test_probe_xml_prefixed_root() {
        let input = br#"<cdx:bom xmlns:cdx="http://cyclonedx.org/schema/bom/1.4"></cdx:bom>"#;
        let root = probe_xml_root(&ContentHead::new(input)).expect("root");
        assert_eq!(root.local_name, "bom");
    }

    #[test]
    fn test_probe_xml_rejects_unbalanced() {
        let input = br#"<bom xmlns="http://cyclonedx.org/schema/bom/1.5"><components>"#;
        assert!(probe_xml_root(&ContentHead::new(input)).is_none());
    }

    #[test]
    fn test_probe_xml_rejects_text_before_root() {
        assert!(probe_xml_root(&ContentHead::new(b"hello <bom/>")).is_none());
    }

    #[test]
    fn test_first_tag_skips_comments() {
        let input = b"\n# generated\n\nSPDXVersion: SPDX-2.3\nDataLicense: CC0-1.0\n";
        assert_eq!(
            first_tag(&ContentHead::new(input)),
            Some(("SPDXVersion", "SPDX-2.3"))
        );
        assert_eq!(first_tag(&ContentHead::new(b"NAME  VERSION  TYPE")), None);
    }
}
