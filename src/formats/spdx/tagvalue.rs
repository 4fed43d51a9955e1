//! SPDX tag-value reader and writer.
//!
//! The reader is line-based. A `PackageName`, `LicenseID`, `Annotator` or
//! `FileName` tag opens a new section; every following tag applies to that
//! section until the next one opens. `Relationship` lines may appear anywhere.
//!
//! One space after the colon separates tag and value; anything past it
//! belongs to the value. Values with line breaks, edge whitespace or a
//! leading `<text>` are written as `<text>` blocks. A value containing
//! `</text>` has no tag-value form and fails to encode.

use super::document::{
    ExternalRef, ExtractedLicense, SpdxAnnotation, SpdxDocument, SpdxPackage, SpdxRelationship,
    CHECKSUMS_FIELD, DOCUMENT_SPDX_ID, FILES_ANALYZED_FIELD, PACKAGE_TEXT_FIELDS,
};
use crate::formats::traits::{FormatError, FormatId};
use serde_json::Value;
use std::io::Write;
use tracing::debug;

const ID: FormatId = FormatId::SpdxTagValue;

const TEXT_OPEN: &str = "<text>";
const TEXT_CLOSE: &str = "</text>";

// ============================================================================
// Writer
// ============================================================================

fn needs_text(value: &str) -> bool {
    value.contains(['\n', '\r'])
        || value.trim() != value
        || value.starts_with(TEXT_OPEN)
}

fn write_tag(writer: &mut dyn Write, tag: &str, value: &str) -> Result<(), FormatError> {
    if needs_text(value) {
        write_text(writer, tag, value)
    } else {
        Ok(writeln!(writer, "{tag}: {value}")?)
    }
}

fn write_text(writer: &mut dyn Write, tag: &str, value: &str) -> Result<(), FormatError> {
    if value.contains(TEXT_CLOSE) {
        return Err(FormatError::encode(
            ID,
            format!("{tag} value contains '{TEXT_CLOSE}'"),
        ));
    }
    Ok(writeln!(writer, "{tag}: {TEXT_OPEN}{value}{TEXT_CLOSE}")?)
}

/// Write a single-line value that has no `<text>` form, such as the
/// whitespace-separated parts of `ExternalRef`.
fn write_line(writer: &mut dyn Write, tag: &str, value: &str) -> Result<(), FormatError> {
    if value.contains(['\n', '\r']) {
        return Err(FormatError::encode(ID, format!("{tag} value spans lines")));
    }
    Ok(writeln!(writer, "{tag}: {value}")?)
}

fn write_section_header(writer: &mut dyn Write, title: &str) -> Result<(), FormatError> {
    let title: String = title
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    writeln!(writer)?;
    writeln!(writer, "##### {title}")?;
    Ok(writeln!(writer)?)
}

/// Render `document` as tag-value. Nothing reaches `writer` unless the whole
/// document encodes.
pub(crate) fn write(writer: &mut dyn Write, document: &SpdxDocument) -> Result<(), FormatError> {
    let mut buffer = Vec::new();
    write_document(&mut buffer, document)?;
    writer.write_all(&buffer)?;
    Ok(())
}

fn write_document(writer: &mut dyn Write, document: &SpdxDocument) -> Result<(), FormatError> {
    write_tag(writer, "SPDXVersion", &document.spdx_version)?;
    write_tag(writer, "DataLicense", &document.data_license)?;
    write_tag(writer, "SPDXID", &document.spdx_id)?;
    write_tag(writer, "DocumentName", &document.name)?;
    write_tag(writer, "DocumentNamespace", &document.document_namespace)?;
    if let Some(version) = &document.creation_info.license_list_version {
        write_tag(writer, "LicenseListVersion", version)?;
    }
    for creator in &document.creation_info.creators {
        write_tag(writer, "Creator", creator)?;
    }
    write_tag(writer, "Created", &document.creation_info.created)?;

    for package in &document.packages {
        write_section_header(writer, &format!("Package: {}", package.name))?;
        write_package(writer, package)?;
    }

    if !document.relationships.is_empty() || !document.document_describes.is_empty() {
        write_section_header(writer, "Relationships")?;
        for described in &document.document_describes {
            write_line(
                writer,
                "Relationship",
                &format!("{} DESCRIBES {described}", document.spdx_id),
            )?;
        }
        for rel in &document.relationships {
            write_line(
                writer,
                "Relationship",
                &format!(
                    "{} {} {}",
                    rel.spdx_element_id, rel.relationship_type, rel.related_spdx_element
                ),
            )?;
        }
    }

    for license in &document.has_extracted_licensing_infos {
        write_section_header(writer, &format!("License: {}", license.license_id))?;
        write_tag(writer, "LicenseID", &license.license_id)?;
        write_text(writer, "ExtractedText", &license.extracted_text)?;
        if let Some(name) = &license.name {
            write_tag(writer, "LicenseName", name)?;
        }
    }

    let annotations = document
        .annotations
        .iter()
        .map(|a| (document.spdx_id.as_str(), a))
        .chain(
            document
                .packages
                .iter()
                .flat_map(|p| p.annotations.iter().map(move |a| (p.spdx_id.as_str(), a))),
        );
    let mut first = true;
    for (reference, annotation) in annotations {
        if first {
            write_section_header(writer, "Annotations")?;
            first = false;
        } else {
            writeln!(writer)?;
        }
        write_tag(writer, "Annotator", &annotation.annotator)?;
        write_tag(writer, "AnnotationDate", &annotation.annotation_date)?;
        write_tag(writer, "AnnotationType", &annotation.annotation_type)?;
        write_tag(writer, "SPDXREF", reference)?;
        write_text(writer, "AnnotationComment", &annotation.comment)?;
    }
    Ok(())
}

fn write_package(writer: &mut dyn Write, package: &SpdxPackage) -> Result<(), FormatError> {
    write_tag(writer, "PackageName", &package.name)?;
    write_tag(writer, "SPDXID", &package.spdx_id)?;
    if let Some(version) = &package.version_info {
        write_tag(writer, "PackageVersion", version)?;
    }

    for (field, tag) in PACKAGE_TEXT_FIELDS {
        match package.extra.get(field) {
            Some(Value::String(value)) => write_tag(writer, tag, value)?,
            Some(_) => debug!("SPDX field '{field}' is not text; dropped from tag-value output"),
            None => {}
        }
    }
    if let Some(Value::Bool(analyzed)) = package.extra.get(FILES_ANALYZED_FIELD) {
        write_tag(writer, "FilesAnalyzed", if *analyzed { "true" } else { "false" })?;
    }
    if let Some(Value::Array(checksums)) = package.extra.get(CHECKSUMS_FIELD) {
        for checksum in checksums {
            if let (Some(algorithm), Some(value)) = (
                checksum.get("algorithm").and_then(Value::as_str),
                checksum.get("checksumValue").and_then(Value::as_str),
            ) {
                write_line(writer, "PackageChecksum", &format!("{algorithm}: {value}"))?;
            }
        }
    }
    for field in package.extra.keys() {
        let known = field == FILES_ANALYZED_FIELD
            || field == CHECKSUMS_FIELD
            || PACKAGE_TEXT_FIELDS.iter().any(|(f, _)| f == field);
        if !known {
            debug!("SPDX field '{field}' has no tag-value form; dropped");
        }
    }

    if let Some(license) = &package.license_concluded {
        write_tag(writer, "PackageLicenseConcluded", license)?;
    }
    if let Some(license) = &package.license_declared {
        write_tag(writer, "PackageLicenseDeclared", license)?;
    }
    for reference in &package.external_refs {
        write_line(
            writer,
            "ExternalRef",
            &format!(
                "{} {} {}",
                reference.reference_category, reference.reference_type, reference.reference_locator
            ),
        )?;
    }
    Ok(())
}

// ============================================================================
// Reader
// ============================================================================

fn malformed(line: usize, reason: impl std::fmt::Display) -> FormatError {
    FormatError::malformed(ID, format!("line {line}: {reason}"))
}

#[derive(Debug)]
enum Section {
    Document,
    Package(SpdxPackage),
    License(ExtractedLicense),
    Annotation {
        reference: Option<String>,
        annotation: SpdxAnnotation,
    },
    /// Files, snippets and other sections without a model counterpart
    Ignored,
}

#[derive(Debug)]
struct Parser {
    document: SpdxDocument,
    section: Section,
    annotations: Vec<(Option<String>, SpdxAnnotation)>,
}

pub(crate) fn parse(input: &str) -> Result<SpdxDocument, FormatError> {
    let mut parser = Parser {
        document: SpdxDocument::default(),
        section: Section::Document,
        annotations: Vec::new(),
    };

    let mut lines = input.split('\n').enumerate().map(|(index, line)| (index + 1, line));
    while let Some((number, raw)) = lines.next() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((tag, value)) = raw.split_once(':') else {
            return Err(malformed(number, "expected 'Tag: value'"));
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        let value = match value.trim_start().strip_prefix(TEXT_OPEN) {
            Some(rest) => read_text(rest, &mut lines, number)?,
            None => value.trim_end().to_string(),
        };
        parser.apply(tag.trim(), value, number)?;
    }

    Ok(parser.finish())
}

/// Collect a `<text>` value that may span several lines.
fn read_text<'a>(
    first: &str,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
    start: usize,
) -> Result<String, FormatError> {
    if let Some(end) = first.find(TEXT_CLOSE) {
        return Ok(first[..end].to_string());
    }
    let mut text = first.to_string();
    for (_, line) in lines.by_ref() {
        text.push('\n');
        if let Some(end) = line.find(TEXT_CLOSE) {
            text.push_str(&line[..end]);
            return Ok(text);
        }
        text.push_str(line);
    }
    Err(malformed(start, "unterminated <text> block"))
}

fn parse_relationship(value: &str) -> Option<SpdxRelationship> {
    let mut parts = value.split_whitespace();
    Some(SpdxRelationship {
        spdx_element_id: parts.next()?.to_string(),
        relationship_type: parts.next()?.to_string(),
        related_spdx_element: parts.next()?.to_string(),
    })
}

fn parse_external_ref(value: &str) -> Option<ExternalRef> {
    let mut parts = value.split_whitespace();
    let category = parts.next()?;
    let reference_type = parts.next()?;
    let locator = parts.collect::<Vec<_>>().join(" ");
    if locator.is_empty() {
        return None;
    }
    Some(ExternalRef {
        reference_category: category.to_string(),
        reference_type: reference_type.to_string(),
        reference_locator: locator,
    })
}

impl Parser {
    fn apply(&mut self, tag: &str, value: String, line: usize) -> Result<(), FormatError> {
        match tag {
            "PackageName" => {
                self.open(Section::Package(SpdxPackage {
                    name: value,
                    ..SpdxPackage::default()
                }));
            }
            "LicenseID" => {
                self.open(Section::License(ExtractedLicense {
                    license_id: value,
                    ..ExtractedLicense::default()
                }));
            }
            "Annotator" => {
                self.open(Section::Annotation {
                    reference: None,
                    annotation: SpdxAnnotation {
                        annotator: value,
                        ..SpdxAnnotation::default()
                    },
                });
            }
            "FileName" | "SnippetSPDXID" => self.open(Section::Ignored),
            "Relationship" => {
                let rel = parse_relationship(&value)
                    .ok_or_else(|| malformed(line, format!("invalid relationship '{value}'")))?;
                self.document.relationships.push(rel);
            }
            _ => self.apply_to_section(tag, value, line)?,
        }
        Ok(())
    }

    fn apply_to_section(&mut self, tag: &str, value: String, line: usize) -> Result<(), FormatError> {
        match &mut self.section {
            Section::Document => {
                let info = &mut self.document.creation_info;
                match tag {
                    "SPDXVersion" => self.document.spdx_version = value,
                    "DataLicense" => self.document.data_license = value,
                    "SPDXID" => self.document.spdx_id = value,
                    "DocumentName" => self.document.name = value,
                    "DocumentNamespace" => self.document.document_namespace = value,
                    "Creator" => info.creators.push(value),
                    "Created" => info.created = value,
                    "LicenseListVersion" => info.license_list_version = Some(value),
                    _ if tag.starts_with("Package") || tag.starts_with("Annotation") => {
                        return Err(malformed(line, format!("{tag} outside its section")));
                    }
                    _ => debug!("Ignoring document tag {tag}"),
                }
            }
            Section::Package(package) => match tag {
                "SPDXID" => package.spdx_id = value,
                "PackageVersion" => package.version_info = Some(value),
                "PackageLicenseConcluded" => package.license_concluded = Some(value),
                "PackageLicenseDeclared" => package.license_declared = Some(value),
                "ExternalRef" => {
                    let reference = parse_external_ref(&value)
                        .ok_or_else(|| malformed(line, format!("invalid external ref '{value}'")))?;
                    package.external_refs.push(reference);
                }
                "FilesAnalyzed" => {
                    let analyzed = match value.to_lowercase().as_str() {
                        "true" => true,
                        "false" => false,
                        _ => return Err(malformed(line, format!("invalid FilesAnalyzed '{value}'"))),
                    };
                    package
                        .extra
                        .insert(FILES_ANALYZED_FIELD.to_string(), Value::Bool(analyzed));
                }
                "PackageChecksum" => {
                    let (algorithm, checksum) = value
                        .split_once(':')
                        .ok_or_else(|| malformed(line, format!("invalid checksum '{value}'")))?;
                    let entry = serde_json::json!({
                        "algorithm": algorithm.trim(),
                        "checksumValue": checksum.trim(),
                    });
                    match package
                        .extra
                        .entry(CHECKSUMS_FIELD.to_string())
                        .or_insert_with(|| Value::Array(Vec::new()))
                    {
                        Value::Array(entries) => entries.push(entry),
                        other => *other = Value::Array(vec![entry]),
                    }
                }
                _ => match PACKAGE_TEXT_FIELDS.iter().find(|(_, t)| *t == tag) {
                    Some((field, _)) => {
                        package.extra.insert((*field).to_string(), Value::String(value));
                    }
                    None => debug!("Ignoring package tag {tag}"),
                },
            },
            Section::License(license) => match tag {
                "ExtractedText" => license.extracted_text = value,
                "LicenseName" => license.name = Some(value),
                _ => debug!("Ignoring license tag {tag}"),
            },
            Section::Annotation {
                reference,
                annotation,
            } => match tag {
                "AnnotationDate" => annotation.annotation_date = value,
                "AnnotationType" => annotation.annotation_type = value,
                "SPDXREF" => *reference = Some(value),
                "AnnotationComment" => annotation.comment = value,
                _ => debug!("Ignoring annotation tag {tag}"),
            },
            Section::Ignored => {}
        }
        Ok(())
    }

    /// Close the current section and start `next`.
    fn open(&mut self, next: Section) {
        match std::mem::replace(&mut self.section, next) {
            Section::Package(package) => self.document.packages.push(package),
            Section::License(license) => self.document.has_extracted_licensing_infos.push(license),
            Section::Annotation {
                reference,
                annotation,
            } => self.annotations.push((reference, annotation)),
            Section::Document | Section::Ignored => {}
        }
    }

    fn finish(mut self) -> SpdxDocument {
        self.open(Section::Ignored);
        let mut document = self.document;
        let root = if document.spdx_id.is_empty() {
            DOCUMENT_SPDX_ID.to_string()
        } else {
            document.spdx_id.clone()
        };

        for (reference, annotation) in self.annotations {
            let reference = reference.unwrap_or_else(|| root.clone());
            if reference == root {
                document.annotations.push(annotation);
            } else if let Some(package) = document
                .packages
                .iter_mut()
                .find(|p| p.spdx_id == reference)
            {
                package.annotations.push(annotation);
            } else {
                debug!("Dropping annotation for unknown element {reference}");
            }
        }
        document
    }
}
