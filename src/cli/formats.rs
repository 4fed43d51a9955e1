//! Formats command handler.
//!
//! Lists every registered format with its versions, aliases and capabilities.

use crate::config::AppConfig;
use crate::formats::{FormatId, FormatRegistry};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct FormatRow {
    name: FormatId,
    display_name: &'static str,
    versions: Vec<String>,
    default_version: String,
    aliases: Vec<&'static str>,
    decode: bool,
}

/// Run the formats command.
pub fn run_formats(json: bool, config: &AppConfig) -> Result<()> {
    let registry = config
        .registry()
        .context("failed to build the format registry")?;
    let rows = format_rows(&registry);

    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &rows).context("failed to write JSON")?;
        writeln!(stdout)?;
        return Ok(());
    }

    let name_width = rows.iter().map(|r| r.name.as_str().len()).max().unwrap_or(0);
    for row in &rows {
        let versions: Vec<String> = row
            .versions
            .iter()
            .map(|v| {
                if *v == row.default_version {
                    format!("{v}*")
                } else {
                    v.clone()
                }
            })
            .collect();
        let mut line = format!("{:<name_width$}   {}", row.name.as_str(), row.display_name);
        if !versions.is_empty() {
            line.push_str(&format!(" [{}]", versions.join(", ")));
        }
        if !row.decode {
            line.push_str(" (write-only)");
        }
        if !row.aliases.is_empty() {
            line.push_str(&format!("  aliases: {}", row.aliases.join(", ")));
        }
        writeln!(stdout, "{line}")?;
    }
    writeln!(stdout, "\n* default version")?;
    Ok(())
}

fn format_rows(registry: &FormatRegistry) -> Vec<FormatRow> {
    let mut rows: Vec<FormatRow> = Vec::new();
    for format in registry.all() {
        let version = format.version().to_string();
        if let Some(row) = rows.iter_mut().find(|r| r.name == format.id()) {
            row.versions.push(version);
            continue;
        }
        rows.push(FormatRow {
            name: format.id(),
            display_name: format.id().display_name(),
            default_version: registry
                .by_id(format.id())
                .map(|f| f.version().to_string())
                .unwrap_or_default(),
            versions: if version.is_empty() {
                Vec::new()
            } else {
                vec![version]
            },
            aliases: FormatRegistry::aliases_of(format.id()),
            decode: format.can_decode(),
        });
    }
    rows
}
