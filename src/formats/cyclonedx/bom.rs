//! `CycloneDX` JSON object model.
//!
//! Only the fields the converter reads or writes are typed. Everything else a
//! component carries is captured in `extra` so it survives a decode/encode
//! cycle through the same schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub(crate) const BOM_FORMAT: &str = "CycloneDX";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Bom {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub bom_format: String,
    pub spec_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default = "default_bom_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
}

const fn default_bom_version() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Tools>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
}

/// `metadata.tools`: an array up to 1.4, an object from 1.5 on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Tools {
    Legacy(Vec<Tool>),
    Components {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        components: Vec<Component>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        services: Vec<Service>,
    },
}

impl Tools {
    /// `(name, version)` of every listed tool.
    pub fn entries(&self) -> Vec<(String, String)> {
        match self {
            Self::Legacy(tools) => tools
                .iter()
                .filter_map(|t| {
                    t.name
                        .clone()
                        .map(|name| (name, t.version.clone().unwrap_or_default()))
                })
                .collect(),
            Self::Components {
                components,
                services,
            } => components
                .iter()
                .map(|c| (c.name.clone(), c.version.clone().unwrap_or_default()))
                .chain(services.iter().filter_map(|s| {
                    s.name
                        .clone()
                        .map(|name| (name, s.version.clone().unwrap_or_default()))
                }))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Tool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Component {
    #[serde(rename = "bom-ref", default, skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    #[serde(rename = "type", default = "default_component_type")]
    pub component_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<LicenseChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    /// Fields this model does not type (group, description, hashes, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

pub(crate) const DEFAULT_COMPONENT_TYPE: &str = "library";

fn default_component_type() -> String {
    DEFAULT_COMPONENT_TYPE.to_string()
}

impl Component {
    pub fn new(component_type: &str, name: impl Into<String>) -> Self {
        Self {
            bom_ref: None,
            component_type: component_type.to_string(),
            name: name.into(),
            version: None,
            licenses: Vec::new(),
            purl: None,
            properties: Vec::new(),
            components: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.push(Property {
            name: name.into(),
            value: value.into(),
        });
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct LicenseChoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct License {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl LicenseChoice {
    /// The license value as a single string, preferring id over name.
    pub fn value(&self) -> Option<String> {
        if let Some(expression) = &self.expression {
            return Some(expression.clone());
        }
        let license = self.license.as_ref()?;
        license
            .id
            .clone()
            .or_else(|| license.name.clone())
            .or_else(|| license.url.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Property {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Dependency {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tools_accepts_array_and_object() {
        let legacy: Tools =
            serde_json::from_str(r#"[{"vendor": "anchore", "name": "syft", "version": "0.90.0"}]"#)
                .expect("array form");
        assert_eq!(legacy.entries(), vec![("syft".to_string(), "0.90.0".to_string())]);

        let modern: Tools = serde_json::from_str(
            r#"{"components": [{"type": "application", "name": "syft", "version": "1.0.0"}],
                "services": [{"name": "scanner"}]}"#,
        )
        .expect("object form");
        assert_eq!(
            modern.entries(),
            vec![
                ("syft".to_string(), "1.0.0".to_string()),
                ("scanner".to_string(), String::new())
            ]
        );
    }

    #[test]
    fn test_component_captures_unknown_fields() {
        let component: Component = serde_json::from_str(
            r#"{"type": "library", "name": "x", "group": "org.example",
                "hashes": [{"alg": "SHA-256", "content": "abc"}]}"#,
        )
        .expect("component");
        assert_eq!(component.extra.len(), 2);
        assert_eq!(component.extra["group"], "org.example");

        let back = serde_json::to_value(&component).expect("serialize");
        assert_eq!(back["group"], "org.example");
        assert_eq!(back["hashes"][0]["alg"], "SHA-256");
    }

    #[test]
    fn test_component_type_defaults_to_library() {
        let component: Component = serde_json::from_str(r#"{"name": "x"}"#).expect("component");
        assert_eq!(component.component_type, "library");
    }

    #[test]
    fn test_license_choice_value() {
        let by_id = LicenseChoice {
            license: Some(License {
                id: Some("MIT".into()),
                ..License::default()
            }),
            expression: None,
        };
        assert_eq!(by_id.value().as_deref(), Some("MIT"));
        let expr = LicenseChoice {
            license: None,
            expression: Some("MIT OR Apache-2.0".into()),
        };
        assert_eq!(expr.value().as_deref(), Some("MIT OR Apache-2.0"));
        assert_eq!(LicenseChoice::default().value(), None);
    }
}
