//! Conversion between the document model and the `CycloneDX` object model.
//!
//! Model fields `CycloneDX` has no place for are written as
//! `sbom-convert:*` component properties and read back from them:
//!
//! | Property | Carries |
//! |----------|---------|
//! | `sbom-convert:package:type` | package type |
//! | `sbom-convert:package:language` | language |
//! | `sbom-convert:location:<i>:path` / `:layerID` | locations, in order |
//! | `sbom-convert:metadata:<key>` | string metadata |
//! | `sbom-convert:metadata-json:<key>` | any other metadata, as JSON text |
//! | `sbom-convert:relationship:<kind>` | non-dependency edges, on the `from` node |
//! | `sbom-convert:source:kind` / `:scope` | source, on the root component |

use super::bom::{
    Bom, Component, Dependency, License, LicenseChoice, Metadata, Property, Tool, Tools,
    BOM_FORMAT, DEFAULT_COMPONENT_TYPE,
};
use super::{spec_minor, CycloneDxFlavor, CYCLONEDX_VERSIONS};
use crate::formats::traits::{FormatError, FormatId};
use crate::formats::PROPERTY_PREFIX;
use crate::model::{
    classify_license, derive_purl, package_type_from_purl, Descriptor, DocumentId, Endpoint,
    Language, LicenseClass, Location, Package, PackageType, Relationship, RelationshipKind, Sbom,
    SbomBuilder, Source, SourceKind,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Metadata key prefix for foreign `CycloneDX` component fields.
pub const METADATA_PREFIX: &str = "cyclonedx:";

/// Metadata key holding foreign component properties, as a JSON array.
pub(crate) const FOREIGN_PROPERTIES_KEY: &str = "cyclonedx:properties";

/// Metadata key holding a component type other than `library`.
pub(crate) const COMPONENT_TYPE_KEY: &str = "cyclonedx:type";

/// Component fields that are typed and never copied from metadata.
const TYPED_FIELDS: &[&str] = &[
    "bom-ref",
    "type",
    "name",
    "version",
    "licenses",
    "purl",
    "properties",
    "components",
];

/// Maximum nesting depth of `components` accepted on decode.
const MAX_COMPONENT_DEPTH: usize = 64;

const PACKAGE_TYPE_PROPERTY: &str = "package:type";
const PACKAGE_LANGUAGE_PROPERTY: &str = "package:language";
const LOCATION_PROPERTY: &str = "location:";
const METADATA_PROPERTY: &str = "metadata:";
const METADATA_JSON_PROPERTY: &str = "metadata-json:";
const RELATIONSHIP_PROPERTY: &str = "relationship:";
const SOURCE_KIND_PROPERTY: &str = "source:kind";
const SOURCE_SCOPE_PROPERTY: &str = "source:scope";

fn tool_property(suffix: &str) -> String {
    format!("{PROPERTY_PREFIX}{suffix}")
}

fn endpoint_ref(endpoint: &Endpoint, root: &str) -> String {
    match endpoint {
        Endpoint::Root => root.to_string(),
        Endpoint::Artifact(id) => id.to_string(),
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Build the `CycloneDX` object model for `sbom`.
pub(crate) fn to_bom(sbom: &Sbom, flavor: CycloneDxFlavor, spec_version: &str) -> Bom {
    let root = format!("root-{}", sbom.id());

    let mut outgoing: HashMap<&Endpoint, Vec<&Relationship>> = HashMap::new();
    for rel in sbom.relationships() {
        outgoing.entry(&rel.from).or_default().push(rel);
    }
    for edges in outgoing.values_mut() {
        edges.sort();
    }

    let relationship_properties = |endpoint: &Endpoint, component: &mut Component| {
        let edges = outgoing.get(endpoint).map(Vec::as_slice).unwrap_or_default();
        for rel in edges.iter().filter(|r| r.kind != RelationshipKind::DependsOn) {
            component.property(
                tool_property(&format!("{RELATIONSHIP_PROPERTY}{}", rel.kind)),
                endpoint_ref(&rel.to, &root),
            );
        }
    };

    let mut root_component = root_component(sbom.source(), &root);
    relationship_properties(&Endpoint::Root, &mut root_component);

    let packages = sbom.sorted_packages();
    let components = packages
        .iter()
        .map(|package| {
            let mut component = package_component(package);
            relationship_properties(&Endpoint::from(package.id()), &mut component);
            component
        })
        .collect();

    let mut dependencies = Vec::new();
    let nodes = std::iter::once(Endpoint::Root).chain(packages.iter().map(|p| Endpoint::from(p.id())));
    for node in nodes {
        let mut depends_on: Vec<String> = outgoing
            .get(&node)
            .into_iter()
            .flatten()
            .filter(|rel| rel.kind == RelationshipKind::DependsOn)
            .map(|rel| endpoint_ref(&rel.to, &root))
            .collect();
        if depends_on.is_empty() {
            continue;
        }
        depends_on.sort();
        depends_on.dedup();
        dependencies.push(Dependency {
            reference: endpoint_ref(&node, &root),
            depends_on,
        });
    }

    Bom {
        schema: match flavor {
            CycloneDxFlavor::Json => Some(format!(
                "http://cyclonedx.org/schema/bom-{spec_version}.schema.json"
            )),
            CycloneDxFlavor::Xml => None,
        },
        bom_format: BOM_FORMAT.to_string(),
        spec_version: spec_version.to_string(),
        serial_number: Some(format!("urn:uuid:{}", sbom.id())),
        version: 1,
        metadata: Some(Metadata {
            timestamp: Some(sbom.created().to_rfc3339_opts(SecondsFormat::Secs, true)),
            tools: Some(tools(sbom.descriptor(), spec_version)),
            component: Some(root_component),
        }),
        components,
        dependencies,
    }
}

fn tools(descriptor: &Descriptor, spec_version: &str) -> Tools {
    let version = (!descriptor.version.is_empty()).then(|| descriptor.version.clone());
    if spec_minor(spec_version).is_some_and(|minor| minor >= 5) {
        let mut component = Component::new("application", descriptor.name.clone());
        component.version = version;
        Tools::Components {
            components: vec![component],
            services: Vec::new(),
        }
    } else {
        Tools::Legacy(vec![Tool {
            vendor: None,
            name: Some(descriptor.name.clone()),
            version,
        }])
    }
}

fn root_component(source: &Source, root: &str) -> Component {
    let component_type = match source.kind {
        SourceKind::Image => "container",
        SourceKind::Directory | SourceKind::File | SourceKind::Unknown => "file",
    };
    let mut component = Component::new(component_type, source.target.clone());
    component.bom_ref = Some(root.to_string());
    component.version = source.digest.clone();
    component.property(tool_property(SOURCE_KIND_PROPERTY), source.kind.as_str());
    if let Some(scope) = source.scope {
        component.property(tool_property(SOURCE_SCOPE_PROPERTY), scope.as_str());
    }
    component
}

fn package_component(package: &Package) -> Component {
    let component_type = package
        .metadata()
        .get(COMPONENT_TYPE_KEY)
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_COMPONENT_TYPE);

    let mut component = Component::new(component_type, package.name());
    component.bom_ref = Some(package.id().to_string());
    component.version = (!package.version().is_empty()).then(|| package.version().to_string());
    component.licenses = package.licenses().iter().map(|l| license_choice(l)).collect();
    component.purl = package.purl_or_derived();

    component.property(
        tool_property(PACKAGE_TYPE_PROPERTY),
        package.package_type().as_str(),
    );
    component.property(
        tool_property(PACKAGE_LANGUAGE_PROPERTY),
        package.language().as_str(),
    );
    for (i, location) in package.locations().iter().enumerate() {
        component.property(
            tool_property(&format!("{LOCATION_PROPERTY}{i}:path")),
            location.path.clone(),
        );
        if let Some(layer) = &location.layer_id {
            component.property(
                tool_property(&format!("{LOCATION_PROPERTY}{i}:layerID")),
                layer.clone(),
            );
        }
    }
    for (key, value) in package.metadata() {
        if key.starts_with(METADATA_PREFIX) {
            continue;
        }
        let (property, text) = match value {
            Value::String(s) => (METADATA_PROPERTY, s.clone()),
            other => (METADATA_JSON_PROPERTY, other.to_string()),
        };
        component.property(tool_property(&format!("{property}{key}")), text);
    }

    if let Some(Value::Array(foreign)) = package.metadata().get(FOREIGN_PROPERTIES_KEY) {
        for property in foreign {
            if let (Some(name), Some(value)) = (
                property.get("name").and_then(Value::as_str),
                property.get("value").and_then(Value::as_str),
            ) {
                component.property(name, value);
            }
        }
    }

    for (field, value) in package.metadata_with_prefix(METADATA_PREFIX) {
        if TYPED_FIELDS.contains(&field) {
            continue;
        }
        component.extra.insert(field.to_string(), value.clone());
    }

    component
}

fn license_choice(value: &str) -> LicenseChoice {
    match classify_license(value) {
        LicenseClass::Identifier => LicenseChoice {
            license: Some(License {
                id: Some(value.to_string()),
                ..License::default()
            }),
            expression: None,
        },
        LicenseClass::Expression => LicenseChoice {
            license: None,
            expression: Some(value.to_string()),
        },
        LicenseClass::FreeText => LicenseChoice {
            license: Some(License {
                name: Some(value.to_string()),
                ..License::default()
            }),
            expression: None,
        },
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Build a document from a decoded `CycloneDX` BOM.
pub(crate) fn from_bom(bom: Bom, format: FormatId) -> Result<Sbom, FormatError> {
    if bom.bom_format != BOM_FORMAT {
        return Err(FormatError::malformed(
            format,
            format!("bomFormat is '{}', expected '{BOM_FORMAT}'", bom.bom_format),
        ));
    }
    if spec_minor(&bom.spec_version).is_none() {
        return Err(FormatError::UnsupportedVersion {
            format,
            version: bom.spec_version,
            supported: CYCLONEDX_VERSIONS.join(", "),
        });
    }

    let metadata = bom.metadata.unwrap_or_default();
    let created = parse_timestamp(metadata.timestamp.as_deref());
    let id = document_id(
        bom.serial_number.as_deref(),
        &format!(
            "cyclonedx:{}:{}",
            metadata.component.as_ref().map_or("", |c| c.name.as_str()),
            metadata.timestamp.as_deref().unwrap_or_default()
        ),
    );
    let descriptor = metadata
        .tools
        .as_ref()
        .and_then(|tools| tools.entries().into_iter().next())
        .map(|(name, version)| Descriptor::new(name, version))
        .unwrap_or_default();
    let source = metadata
        .component
        .as_ref()
        .map(source_from_root)
        .unwrap_or_default();

    let mut decoder = Decoder {
        format,
        builder: Sbom::builder(source)
            .id(id)
            .created(created)
            .descriptor(descriptor),
        refs: HashMap::new(),
        edges: Vec::new(),
        pending: Vec::new(),
    };

    if let Some(root) = metadata.component {
        if let Some(bom_ref) = &root.bom_ref {
            decoder.refs.insert(bom_ref.clone(), Endpoint::Root);
        }
        for property in &root.properties {
            if let Some((kind, target)) = relationship_property(property) {
                decoder.pending.push((Endpoint::Root, target, kind));
            }
        }
        for child in root.components {
            decoder.add_component(child, Some(Endpoint::Root), 1)?;
        }
    }

    for component in bom.components {
        decoder.add_component(component, None, 1)?;
    }

    for dependency in bom.dependencies {
        let Some(from) = decoder.refs.get(&dependency.reference).cloned() else {
            debug!(
                "Skipping dependencies of unknown bom-ref '{}'",
                dependency.reference
            );
            continue;
        };
        for target in dependency.depends_on {
            match decoder.refs.get(&target) {
                Some(to) => decoder.edges.push(Relationship::new(
                    from.clone(),
                    to.clone(),
                    RelationshipKind::DependsOn,
                )),
                None => debug!("Skipping dependency on unknown bom-ref '{target}'"),
            }
        }
    }

    decoder.finish()
}

struct Decoder {
    format: FormatId,
    builder: SbomBuilder,
    refs: HashMap<String, Endpoint>,
    edges: Vec<Relationship>,
    pending: Vec<(Endpoint, String, RelationshipKind)>,
}

impl Decoder {
    fn add_component(
        &mut self,
        mut component: Component,
        parent: Option<Endpoint>,
        depth: usize,
    ) -> Result<(), FormatError> {
        if depth > MAX_COMPONENT_DEPTH {
            return Err(FormatError::malformed(
                self.format,
                format!("components nested deeper than {MAX_COMPONENT_DEPTH} levels"),
            ));
        }

        if component.name.trim().is_empty() {
            return Err(FormatError::malformed(
                self.format,
                format!(
                    "component '{}' has no name",
                    component.bom_ref.as_deref().unwrap_or_default()
                ),
            ));
        }

        let children = std::mem::take(&mut component.components);
        let bom_ref = component.bom_ref.take();
        let (package, relationships) = package_from_component(component, self.format)?;
        let endpoint = Endpoint::from(self.builder.add_package(package)?);

        if let Some(bom_ref) = bom_ref {
            if self.refs.contains_key(&bom_ref) {
                debug!("Duplicate bom-ref '{bom_ref}', keeping the first");
            } else {
                self.refs.insert(bom_ref, endpoint.clone());
            }
        }
        for (kind, target) in relationships {
            self.pending.push((endpoint.clone(), target, kind));
        }
        if let Some(parent) = parent {
            self.edges.push(Relationship::new(
                parent,
                endpoint.clone(),
                RelationshipKind::Contains,
            ));
        }

        for child in children {
            self.add_component(child, Some(endpoint.clone()), depth + 1)?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Sbom, FormatError> {
        for (from, target, kind) in std::mem::take(&mut self.pending) {
            match self.refs.get(&target) {
                Some(to) => self.edges.push(Relationship::new(from, to.clone(), kind)),
                None => debug!("Skipping {kind} relationship to unknown bom-ref '{target}'"),
            }
        }
        for edge in self.edges {
            self.builder.add_relationship(edge)?;
        }
        Ok(self.builder.build())
    }
}

fn relationship_property(property: &Property) -> Option<(RelationshipKind, String)> {
    let kind = property
        .name
        .strip_prefix(PROPERTY_PREFIX)?
        .strip_prefix(RELATIONSHIP_PROPERTY)?
        .parse()
        .ok()?;
    Some((kind, property.value.clone()))
}

type DecodedComponent = (Package, Vec<(RelationshipKind, String)>);

fn package_from_component(
    component: Component,
    format: FormatId,
) -> Result<DecodedComponent, FormatError> {
    let mut package_type = None;
    let mut language = None;
    let mut locations: BTreeMap<usize, Location> = BTreeMap::new();
    let mut metadata: Vec<(String, Value)> = Vec::new();
    let mut relationships = Vec::new();
    let mut foreign: Vec<Property> = Vec::new();

    for property in component.properties {
        if let Some(rel) = relationship_property(&property) {
            relationships.push(rel);
            continue;
        }
        let Property { name, value } = property;
        let Some(rest) = name.strip_prefix(PROPERTY_PREFIX) else {
            foreign.push(Property { name, value });
            continue;
        };

        if rest == PACKAGE_TYPE_PROPERTY {
            package_type = value.parse::<PackageType>().ok();
        } else if rest == PACKAGE_LANGUAGE_PROPERTY {
            language = value.parse::<Language>().ok();
        } else if let Some(location) = rest.strip_prefix(LOCATION_PROPERTY)
            && let Some((index, field)) = location.split_once(':')
            && let Ok(index) = index.parse::<usize>()
        {
            let entry = locations
                .entry(index)
                .or_insert_with(|| Location::new(String::new()));
            match field {
                "path" => entry.path = value,
                "layerID" => entry.layer_id = Some(value),
                other => debug!("Ignoring unknown location field '{other}'"),
            }
        } else if let Some(key) = rest.strip_prefix(METADATA_JSON_PROPERTY) {
            let parsed = serde_json::from_str(&value).map_err(|e| {
                FormatError::malformed(format, format!("property '{name}' is not JSON: {e}"))
            })?;
            metadata.push((key.to_string(), parsed));
        } else if let Some(key) = rest.strip_prefix(METADATA_PROPERTY) {
            metadata.push((key.to_string(), Value::String(value)));
        } else {
            foreign.push(Property { name, value });
        }
    }

    let version = component.version.unwrap_or_default();
    let package_type = package_type
        .or_else(|| component.purl.as_deref().and_then(package_type_from_purl))
        .unwrap_or(PackageType::Unknown);
    let language = language.unwrap_or_else(|| package_type.default_language());

    let derived_purl = derive_purl(package_type, &component.name, &version);
    let mut package = Package::new(component.name, version, package_type)
        .with_locations(locations.into_values())
        .with_language(language);

    for choice in &component.licenses {
        if let Some(license) = choice.value() {
            package = package.with_license(license);
        }
    }
    if let Some(purl) = component.purl
        && Some(&purl) != derived_purl.as_ref()
    {
        package = package.with_purl(purl);
    }
    for (key, value) in metadata {
        package = package.with_metadata(key, value);
    }
    if !foreign.is_empty() {
        let properties = foreign
            .into_iter()
            .map(|p| serde_json::json!({ "name": p.name, "value": p.value }))
            .collect();
        package = package.with_metadata(FOREIGN_PROPERTIES_KEY, Value::Array(properties));
    }
    if component.component_type != DEFAULT_COMPONENT_TYPE {
        package = package.with_metadata(
            COMPONENT_TYPE_KEY,
            Value::String(component.component_type),
        );
    }
    for (field, value) in component.extra {
        package = package.with_metadata(format!("{METADATA_PREFIX}{field}"), value);
    }

    Ok((package, relationships))
}

fn source_from_root(root: &Component) -> Source {
    let mut kind = match root.component_type.as_str() {
        "container" => SourceKind::Image,
        "file" => SourceKind::File,
        _ => SourceKind::Unknown,
    };
    let mut scope = None;
    for property in &root.properties {
        match property.name.strip_prefix(PROPERTY_PREFIX) {
            Some(SOURCE_KIND_PROPERTY) => {
                if let Ok(parsed) = property.value.parse() {
                    kind = parsed;
                }
            }
            Some(SOURCE_SCOPE_PROPERTY) => scope = property.value.parse().ok(),
            _ => {}
        }
    }

    Source {
        kind,
        target: root.name.clone(),
        scope,
        digest: root.version.clone(),
    }
}

fn parse_timestamp(timestamp: Option<&str>) -> DateTime<Utc> {
    let Some(timestamp) = timestamp else {
        return DateTime::<Utc>::default();
    };
    DateTime::parse_from_rfc3339(timestamp).map_or_else(
        |e| {
            debug!("Unparseable metadata.timestamp '{timestamp}': {e}");
            DateTime::<Utc>::default()
        },
        |parsed| parsed.with_timezone(&Utc),
    )
}

fn document_id(serial_number: Option<&str>, fallback: &str) -> DocumentId {
    match serial_number {
        Some(serial) => serial
            .strip_prefix("urn:uuid:")
            .and_then(|uuid| uuid.parse().ok())
            .unwrap_or_else(|| DocumentId::derive(serial)),
        None => DocumentId::derive(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::fixtures::{identity_view, sample_sbom};

    fn roundtrip(sbom: &Sbom) -> Sbom {
        let bom = to_bom(sbom, CycloneDxFlavor::Json, "1.5");
        let json = serde_json::to_string(&bom).expect("serialize");
        let bom: Bom = serde_json::from_str(&json).expect("deserialize");
        from_bom(bom, FormatId::CycloneDxJson).expect("decode")
    }

    #[test]
    fn test_schema_mandated_fields() {
        let sbom = sample_sbom();
        let bom = to_bom(&sbom, CycloneDxFlavor::Json, "1.5");
        assert_eq!(
            bom.serial_number,
            Some(format!("urn:uuid:{}", sbom.id()))
        );
        let metadata = bom.metadata.expect("metadata");
        assert_eq!(metadata.timestamp.as_deref(), Some("2024-05-01T12:00:00Z"));
        let root = metadata.component.expect("root component");
        assert_eq!(root.component_type, "container");
        assert_eq!(root.name, "docker.io/library/app:1.0");
        assert!(matches!(metadata.tools, Some(Tools::Components { .. })));
    }

    #[test]
    fn test_tools_shape_follows_spec_version() {
        let sbom = sample_sbom();
        let legacy = to_bom(&sbom, CycloneDxFlavor::Json, "1.4");
        assert!(matches!(
            legacy.metadata.and_then(|m| m.tools),
            Some(Tools::Legacy(_))
        ));
    }

    #[test]
    fn test_bom_refs_are_artifact_ids() {
        let sbom = sample_sbom();
        let bom = to_bom(&sbom, CycloneDxFlavor::Json, "1.6");
        for component in &bom.components {
            let id = component.bom_ref.as_deref().expect("bom-ref");
            assert!(sbom.packages().any(|p| p.id().as_str() == id));
        }
        assert_eq!(bom.dependencies.len(), 1);
        assert_eq!(bom.dependencies[0].depends_on.len(), 1);
    }

    #[test]
    fn test_license_classes() {
        let sbom = sample_sbom();
        let bom = to_bom(&sbom, CycloneDxFlavor::Json, "1.5");
        let find = |name: &str| {
            bom.components
                .iter()
                .find(|c| c.name == name)
                .expect("component present")
                .licenses
                .clone()
        };
        let mit = find("left-pad");
        assert_eq!(mit[0].license.as_ref().and_then(|l| l.id.as_deref()), Some("MIT"));
        let dual = find("serde");
        assert_eq!(dual[0].expression.as_deref(), Some("MIT OR Apache-2.0"));
        let custom = find("vendor-tool");
        assert_eq!(
            custom[0].license.as_ref().and_then(|l| l.name.as_deref()),
            Some("Custom Vendor License")
        );
    }

    #[test]
    fn test_roundtrip() {
        let sbom = sample_sbom();
        let decoded = roundtrip(&sbom);
        assert_eq!(identity_view(&decoded), identity_view(&sbom));
        assert_eq!(decoded.source(), sbom.source());
        assert_eq!(decoded.id(), sbom.id());
        assert_eq!(decoded.created(), sbom.created());
        assert_eq!(decoded.descriptor(), sbom.descriptor());
        for package in sbom.packages() {
            let other = decoded.package(package.id()).expect("same artifact id");
            assert_eq!(other.licenses(), package.licenses());
            assert_eq!(other.metadata(), package.metadata());
            assert_eq!(other.language(), package.language());
        }
    }

    #[test]
    fn test_foreign_fields_survive_reencode() {
        let input = r#"{
            "bomFormat": "CycloneDX",
            "specVersion": "1.5",
            "components": [{
                "type": "framework",
                "bom-ref": "pkg:maven/org.example/lib@1.0",
                "group": "org.example",
                "name": "lib",
                "version": "1.0",
                "purl": "pkg:maven/org.example/lib@1.0",
                "hashes": [{"alg": "SHA-256", "content": "abc"}],
                "properties": [{"name": "vendor:flag", "value": "on"}]
            }]
        }"#;
        let bom: Bom = serde_json::from_str(input).expect("parse");
        let sbom = from_bom(bom, FormatId::CycloneDxJson).expect("decode");
        let package = sbom.packages().next().expect("one package");
        assert_eq!(package.package_type(), PackageType::JavaArchive);
        assert_eq!(package.metadata()["cyclonedx:group"], "org.example");
        assert_eq!(package.metadata()[COMPONENT_TYPE_KEY], "framework");

        let again = to_bom(&sbom, CycloneDxFlavor::Json, "1.5");
        let component = &again.components[0];
        assert_eq!(component.component_type, "framework");
        assert_eq!(component.extra["group"], "org.example");
        assert_eq!(component.extra["hashes"][0]["content"], "abc");
        assert!(component
            .properties
            .iter()
            .any(|p| p.name == "vendor:flag" && p.value == "on"));
        assert_eq!(component.purl.as_deref(), Some("pkg:maven/org.example/lib@1.0"));
    }

    #[test]
    fn test_nested_components_become_contains_edges() {
        let input = r#"{
            "bomFormat": "CycloneDX",
            "specVersion": "1.4",
            "metadata": {"component": {"type": "application", "bom-ref": "app", "name": "app"}},
            "components": [{
                "bom-ref": "outer", "name": "outer", "version": "1",
                "components": [{"bom-ref": "inner", "name": "inner", "version": "2"}]
            }],
            "dependencies": [
                {"ref": "app", "dependsOn": ["outer"]},
                {"ref": "outer", "dependsOn": ["ghost"]}
            ]
        }"#;
        let bom: Bom = serde_json::from_str(input).expect("parse");
        let sbom = from_bom(bom, FormatId::CycloneDxJson).expect("decode");
        assert_eq!(sbom.package_count(), 2);
        let kinds: Vec<RelationshipKind> = sbom.relationships().map(|r| r.kind).collect();
        assert!(kinds.contains(&RelationshipKind::Contains));
        assert!(sbom
            .relationships()
            .any(|r| r.from == Endpoint::Root && r.kind == RelationshipKind::DependsOn));
        assert_eq!(sbom.relationship_count(), 2);
    }

    fn metadata_sbom() -> Sbom {
        let mut builder = Sbom::builder(Source::directory("/src"));
        builder
            .add_package(
                Package::new("meta", "1", PackageType::Npm)
                    .with_metadata("bracketed", serde_json::json!("[1]"))
                    .with_metadata("braced", serde_json::json!("{\"a\": 1}"))
                    .with_metadata("digits", serde_json::json!("1"))
                    .with_metadata("count", serde_json::json!(1))
                    .with_metadata("list", serde_json::json!([1, "two"])),
            )
            .expect("named package");
        builder.build()
    }

    #[test]
    fn test_metadata_keeps_value_types() {
        let sbom = metadata_sbom();
        let bom = to_bom(&sbom, CycloneDxFlavor::Json, "1.5");
        let properties = &bom.components[0].properties;
        assert!(properties
            .iter()
            .any(|p| p.name == "sbom-convert:metadata:bracketed" && p.value == "[1]"));
        assert!(properties
            .iter()
            .any(|p| p.name == "sbom-convert:metadata-json:count" && p.value == "1"));

        let decoded = roundtrip(&sbom);
        let metadata = decoded.packages().next().expect("one package").metadata();
        assert_eq!(metadata["bracketed"], Value::String("[1]".to_string()));
        assert_eq!(metadata["braced"], Value::String("{\"a\": 1}".to_string()));
        assert_eq!(metadata["digits"], Value::String("1".to_string()));
        assert_eq!(metadata["count"], serde_json::json!(1));
        assert_eq!(metadata["list"], serde_json::json!([1, "two"]));
    }

    #[test]
    fn test_invalid_json_metadata_property_is_malformed() {
        let mut component = Component::new("library", "lib");
        component.property("sbom-convert:metadata-json:count", "{not json");
        let bom = Bom {
            schema: None,
            bom_format: BOM_FORMAT.to_string(),
            spec_version: "1.5".to_string(),
            serial_number: None,
            version: 1,
            metadata: None,
            components: vec![component],
            dependencies: Vec::new(),
        };
        assert!(matches!(
            from_bom(bom, FormatId::CycloneDxJson),
            Err(FormatError::Malformed { .. })
        ));
    }

    #[test]
    fn test_blank_component_name_is_malformed() {
        for name in ["", "   "] {
            let input = format!(
                r#"{{"bomFormat": "CycloneDX", "specVersion": "1.5",
                    "components": [{{"type": "library", "name": "{name}", "version": "1"}}]}}"#
            );
            let bom: Bom = serde_json::from_str(&input).expect("parse");
            let err = from_bom(bom, FormatId::CycloneDxJson).expect_err("blank name");
            assert!(matches!(err, FormatError::Malformed { .. }), "{name:?}: {err}");
        }
    }

    #[test]
    fn test_excessive_nesting_is_malformed() {
        let mut component = Component::new("library", "leaf");
        for i in 0..=MAX_COMPONENT_DEPTH {
            let mut parent = Component::new("library", format!("level-{i}"));
            parent.components.push(component);
            component = parent;
        }
        let bom = Bom {
            schema: None,
            bom_format: BOM_FORMAT.to_string(),
            spec_version: "1.5".to_string(),
            serial_number: None,
            version: 1,
            metadata: None,
            components: vec![component],
            dependencies: Vec::new(),
        };
        assert!(matches!(
            from_bom(bom, FormatId::CycloneDxJson),
            Err(FormatError::Malformed { .. })
        ));
    }

    #[test]
    fn test_wrong_bom_format_is_malformed() {
        let bom: Bom = serde_json::from_str(r#"{"bomFormat": "Other", "specVersion": "1.5"}"#)
            .expect("parse");
        assert!(matches!(
            from_bom(bom, FormatId::CycloneDxJson),
            Err(FormatError::Malformed { .. })
        ));
    }

    #[test]
    fn test_unsupported_spec_version() {
        let bom: Bom =
            serde_json::from_str(r#"{"bomFormat": "CycloneDX", "specVersion": "2.0"}"#)
                .expect("parse");
        assert!(matches!(
            from_bom(bom, FormatId::CycloneDxJson),
            Err(FormatError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_document_id_fallbacks() {
        let id = DocumentId::random();
        assert_eq!(document_id(Some(&format!("urn:uuid:{id}")), "x"), id);
        assert_eq!(
            document_id(Some("not-a-urn"), "x"),
            DocumentId::derive("not-a-urn")
        );
        assert_eq!(document_id(None, "x"), DocumentId::derive("x"));
    }
}
