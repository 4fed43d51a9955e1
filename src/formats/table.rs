//! Human-readable package table (write-only).

use super::traits::{ContentHead, Format, FormatError, FormatId};
use crate::model::Sbom;
use std::collections::BTreeSet;
use std::io::Write;
use unicode_width::UnicodeWidthStr;

const HEADER: [&str; 3] = ["NAME", "VERSION", "TYPE"];
const COLUMN_GAP: usize = 3;
const EMPTY_MESSAGE: &str = "No packages discovered";

/// Column-aligned `NAME VERSION TYPE` listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableFormat;

impl Format for TableFormat {
    fn id(&self) -> FormatId {
        FormatId::Table
    }

    fn version(&self) -> &str {
        ""
    }

    /// Table output is never identified as a document.
    fn sniff(&self, _head: &ContentHead<'_>) -> Option<String> {
        None
    }

    fn encode(&self, writer: &mut dyn Write, sbom: &Sbom) -> Result<(), FormatError> {
        writer.write_all(render(sbom).as_bytes())?;
        Ok(())
    }
}

fn render(sbom: &Sbom) -> String {
    let rows: BTreeSet<[&str; 3]> = sbom
        .packages()
        .map(|p| [p.name(), p.version(), p.package_type().as_str()])
        .collect();
    if rows.is_empty() {
        return format!("{EMPTY_MESSAGE}\n");
    }

    let mut widths = HEADER.map(|title| title.width());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&HEADER).chain(&rows) {
        let mut line = String::new();
        for (index, (cell, width)) in row.iter().zip(widths).enumerate() {
            line.push_str(cell);
            if index + 1 < row.len() {
                let padding = width - cell.width() + COLUMN_GAP;
                line.extend(std::iter::repeat_n(' ', padding));
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
