//! `CycloneDX` XML mirror structures.
//!
//! XML wraps collections in container elements and puts identifiers in
//! attributes, so it gets its own serde model. Both directions go through the
//! JSON object model in [`bom`](super::bom): simple text fields and hashes map
//! onto component `extra` entries, anything else JSON-only is dropped.

use super::bom::{Bom, Component, Dependency, License, LicenseChoice, Metadata, Property, Tool, Tools};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Namespace prefix of the `CycloneDX` XML schema; the spec version follows it.
pub const CYCLONEDX_NAMESPACE: &str = "http://cyclonedx.org/schema/bom/";

/// Simple text elements carried through `Component::extra`, in schema order.
const TEXT_FIELDS: [&str; 7] = [
    "author",
    "publisher",
    "group",
    "description",
    "scope",
    "copyright",
    "cpe",
];

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "bom")]
pub(crate) struct XmlBom {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    xmlns: Option<String>,
    #[serde(rename = "@serialNumber", default, skip_serializing_if = "Option::is_none")]
    serial_number: Option<String>,
    #[serde(rename = "@version", default = "default_bom_version")]
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<XmlMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    components: Option<XmlComponents>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dependencies: Option<XmlDependencies>,
}

const fn default_bom_version() -> u32 {
    1
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tools: Option<XmlTools>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    component: Option<XmlComponent>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlTools {
    #[serde(rename = "tool", default, skip_serializing_if = "Vec::is_empty")]
    tool: Vec<XmlTool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    components: Option<XmlComponents>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlTool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlComponents {
    #[serde(rename = "component", default)]
    component: Vec<XmlComponent>,
}

/// Component element; field order follows the XSD sequence.
#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlComponent {
    #[serde(rename = "@type", default = "default_component_type")]
    component_type: String,
    #[serde(rename = "@bom-ref", default, skip_serializing_if = "Option::is_none")]
    bom_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hashes: Option<XmlHashes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    licenses: Option<XmlLicenses>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cpe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<XmlProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    components: Option<XmlComponents>,
}

fn default_component_type() -> String {
    super::bom::DEFAULT_COMPONENT_TYPE.to_string()
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlHashes {
    #[serde(rename = "hash", default)]
    hash: Vec<XmlHash>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlHash {
    #[serde(rename = "@alg")]
    alg: String,
    #[serde(rename = "$text", default)]
    content: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlLicenses {
    #[serde(rename = "$value", default)]
    choices: Vec<XmlLicenseChoice>,
}

#[derive(Debug, Serialize, Deserialize)]
enum XmlLicenseChoice {
    #[serde(rename = "license")]
    License(XmlLicense),
    #[serde(rename = "expression")]
    Expression(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlLicense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlProperties {
    #[serde(rename = "property", default)]
    property: Vec<XmlProperty>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlProperty {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlDependencies {
    #[serde(rename = "dependency", default)]
    dependency: Vec<XmlDependency>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlDependency {
    #[serde(rename = "@ref")]
    reference: String,
    #[serde(rename = "dependency", default, skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<XmlDependencyRef>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlDependencyRef {
    #[serde(rename = "@ref")]
    reference: String,
}

// ============================================================================
// JSON model -> XML
// ============================================================================

impl XmlBom {
    pub fn from_bom(bom: Bom) -> Self {
        let metadata = bom.metadata.map(|m| XmlMetadata {
            timestamp: m.timestamp,
            tools: m.tools.map(xml_tools),
            component: m.component.map(xml_component),
        });

        Self {
            xmlns: Some(format!("{CYCLONEDX_NAMESPACE}{}", bom.spec_version)),
            serial_number: bom.serial_number,
            version: bom.version,
            metadata,
            components: non_empty_components(bom.components),
            dependencies: (!bom.dependencies.is_empty()).then(|| XmlDependencies {
                dependency: bom
                    .dependencies
                    .into_iter()
                    .map(|d| XmlDependency {
                        reference: d.reference,
                        depends_on: d
                            .depends_on
                            .into_iter()
                            .map(|reference| XmlDependencyRef { reference })
                            .collect(),
                    })
                    .collect(),
            }),
        }
    }

    /// Convert into the JSON object model, using `spec_version` read from the
    /// document namespace.
    pub fn into_bom(self, spec_version: String) -> Bom {
        let metadata = self.metadata.map(|m| Metadata {
            timestamp: m.timestamp,
            tools: m.tools.map(json_tools),
            component: m.component.map(json_component),
        });

        Bom {
            schema: None,
            bom_format: super::bom::BOM_FORMAT.to_string(),
            spec_version,
            serial_number: self.serial_number,
            version: self.version,
            metadata,
            components: self
                .components
                .map(|c| c.component.into_iter().map(json_component).collect())
                .unwrap_or_default(),
            dependencies: self
                .dependencies
                .map(|d| {
                    d.dependency
                        .into_iter()
                        .map(|d| Dependency {
                            reference: d.reference,
                            depends_on: d.depends_on.into_iter().map(|r| r.reference).collect(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Spec version declared by the `xmlns` attribute, when it was captured.
    pub fn namespace_version(&self) -> Option<&str> {
        self.xmlns.as_deref()?.strip_prefix(CYCLONEDX_NAMESPACE)
    }
}

fn non_empty_components(components: Vec<Component>) -> Option<XmlComponents> {
    (!components.is_empty()).then(|| XmlComponents {
        component: components.into_iter().map(xml_component).collect(),
    })
}

fn xml_tools(tools: Tools) -> XmlTools {
    match tools {
        Tools::Legacy(tools) => XmlTools {
            tool: tools
                .into_iter()
                .map(|t| XmlTool {
                    vendor: t.vendor,
                    name: t.name,
                    version: t.version,
                })
                .collect(),
            components: None,
        },
        Tools::Components { components, .. } => XmlTools {
            tool: Vec::new(),
            components: non_empty_components(components),
        },
    }
}

fn xml_component(mut component: Component) -> XmlComponent {
    let mut take_text = |field: &str| match component.extra.remove(field) {
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            debug!("Dropping non-text CycloneDX field '{field}' from XML output");
            None
        }
        None => None,
    };
    let [author, publisher, group, description, scope, copyright, cpe] =
        TEXT_FIELDS.map(&mut take_text);

    let hashes = component.extra.remove("hashes").and_then(|value| {
        let hashes: Vec<XmlHash> = value
            .as_array()?
            .iter()
            .filter_map(|h| {
                Some(XmlHash {
                    alg: h.get("alg")?.as_str()?.to_string(),
                    content: h.get("content")?.as_str()?.to_string(),
                })
            })
            .collect();
        (!hashes.is_empty()).then_some(XmlHashes { hash: hashes })
    });

    for field in component.extra.keys() {
        debug!("CycloneDX field '{field}' has no XML mapping; dropped");
    }

    let licenses = (!component.licenses.is_empty()).then(|| XmlLicenses {
        choices: component
            .licenses
            .into_iter()
            .filter_map(|choice| match (choice.expression, choice.license) {
                (Some(expression), _) => Some(XmlLicenseChoice::Expression(expression)),
                (None, Some(license)) => Some(XmlLicenseChoice::License(XmlLicense {
                    id: license.id,
                    name: license.name,
                    url: license.url,
                })),
                (None, None) => None,
            })
            .collect(),
    });

    let properties = (!component.properties.is_empty()).then(|| XmlProperties {
        property: component
            .properties
            .into_iter()
            .map(|p| XmlProperty {
                name: p.name,
                value: p.value,
            })
            .collect(),
    });

    XmlComponent {
        component_type: component.component_type,
        bom_ref: component.bom_ref,
        author,
        publisher,
        group,
        name: component.name,
        version: component.version,
        description,
        scope,
        hashes,
        licenses,
        copyright,
        cpe,
        purl: component.purl,
        properties,
        components: non_empty_components(component.components),
    }
}

// ============================================================================
// XML -> JSON model
// ============================================================================

fn json_tools(tools: XmlTools) -> Tools {
    match tools.components {
        Some(components) if tools.tool.is_empty() => Tools::Components {
            components: components.component.into_iter().map(json_component).collect(),
            services: Vec::new(),
        },
        _ => Tools::Legacy(
            tools
                .tool
                .into_iter()
                .map(|t| Tool {
                    vendor: t.vendor,
                    name: t.name,
                    version: t.version,
                })
                .collect(),
        ),
    }
}

fn json_component(component: XmlComponent) -> Component {
    let mut json = Component::new(&component.component_type, component.name);
    json.bom_ref = component.bom_ref;
    json.version = component.version;
    json.purl = component.purl;

    let texts = [
        ("author", component.author),
        ("publisher", component.publisher),
        ("group", component.group),
        ("description", component.description),
        ("scope", component.scope),
        ("copyright", component.copyright),
        ("cpe", component.cpe),
    ];
    for (field, value) in texts {
        if let Some(value) = value {
            json.extra.insert(field.to_string(), Value::String(value));
        }
    }
    if let Some(hashes) = component.hashes
        && !hashes.hash.is_empty()
    {
        let hashes = hashes
            .hash
            .into_iter()
            .map(|h| serde_json::json!({ "alg": h.alg, "content": h.content.trim() }))
            .collect();
        json.extra.insert("hashes".to_string(), Value::Array(hashes));
    }

    json.licenses = component
        .licenses
        .map(|l| {
            l.choices
                .into_iter()
                .map(|choice| match choice {
                    XmlLicenseChoice::License(license) => LicenseChoice {
                        license: Some(License {
                            id: license.id,
                            name: license.name,
                            url: license.url,
                        }),
                        expression: None,
                    },
                    XmlLicenseChoice::Expression(expression) => LicenseChoice {
                        license: None,
                        expression: Some(expression),
                    },
                })
                .collect()
        })
        .unwrap_or_default();

    json.properties = component
        .properties
        .map(|p| {
            p.property
                .into_iter()
                .map(|p| Property {
                    name: p.name,
                    value: p.value,
                })
                .collect()
        })
        .unwrap_or_default();

    json.components = component
        .components
        .map(|c| c.component.into_iter().map(json_component).collect())
        .unwrap_or_default();

    json
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_text_fields_roundtrip() {
        let mut component = Component::new("library", "lib");
        component
            .extra
            .insert("group".to_string(), Value::String("org.example".to_string()));
        component.extra.insert(
            "hashes".to_string(),
            serde_json::json!([{"alg": "SHA-256", "content": "abc"}]),
        );
        component
            .extra
            .insert("supplier".to_string(), serde_json::json!({"name": "x"}));

        let back = json_component(xml_component(component));
        assert_eq!(back.extra["group"], "org.example");
        assert_eq!(back.extra["hashes"][0]["alg"], "SHA-256");
        assert!(!back.extra.contains_key("supplier"));
    }

    #[test]
    fn test_deserialize_foreign_document() {
        let input = r#"<?xml version="1.0" encoding="UTF-8"?>
<bom xmlns="http://cyclonedx.org/schema/bom/1.4" serialNumber="urn:uuid:3e671687-395b-41f5-a30f-a58921a69b79" version="1">
  <metadata>
    <timestamp>2023-01-01T00:00:00Z</timestamp>
    <tools><tool><vendor>acme</vendor><name>scanner</name><version>2.0</version></tool></tools>
  </metadata>
  <components>
    <component type="library" bom-ref="a">
      <group>org.acme</group>
      <name>widget</name>
      <version>1.2.3</version>
      <hashes><hash alg="SHA-1">da39a3ee5e6b4b0d3255bfef95601890afd80709</hash></hashes>
      <licenses><license><id>MIT</id></license><expression>MIT OR Apache-2.0</expression></licenses>
      <purl>pkg:maven/org.acme/widget@1.2.3</purl>
      <properties><property name="acme:tier">gold</property></properties>
    </component>
  </components>
  <dependencies><dependency ref="a"/></dependencies>
</bom>"#;
        let xml: XmlBom = quick_xml::de::from_str(input).expect("parse xml");
        let bom = xml.into_bom("1.4".to_string());
        assert_eq!(bom.components.len(), 1);
        let component = &bom.components[0];
        assert_eq!(component.name, "widget");
        assert_eq!(component.extra["group"], "org.acme");
        assert_eq!(component.licenses.len(), 2);
        assert_eq!(component.properties[0].value, "gold");
        assert_eq!(bom.dependencies.len(), 1);
        assert!(matches!(
            bom.metadata.and_then(|m| m.tools),
            Some(Tools::Legacy(tools)) if tools.len() == 1
        ));
    }
}
