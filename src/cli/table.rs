//! Table formatting for CLI list commands
//!
//! Renders a controller's headers and rows in any [`OutputFormat`].
//! TSV output is styled for terminals and ends with a summary line;
//! CSV, JSON, YAML and ID output stay machine-readable.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{count_noun, truncate_str};
use crate::cli::OutputFormat;
use crate::controller::CellValue;

/// Widest a TSV column may grow before text is truncated
const MAX_COLUMN_WIDTH: usize = 40;

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => format!("{:<width$}", style(id.to_string()).cyan(), width = width),
            CellValue::Reference(id) => {
                format!("{:<width$}", style(format!("#{}", id)).dim(), width = width)
            }
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width);
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::DateTime(_) => format!("{:<width$}", self.raw(), width = width),
            CellValue::Empty => format!("{:<width$}", style("-").dim(), width = width),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        match self {
            CellValue::Empty => "-".to_string(),
            other => other.raw().replace('|', "\\|"),
        }
    }
}

/// JSON/YAML object key for a column header ("Patient Id" -> "patient_id")
pub fn header_key(header: &str) -> String {
    header
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// One row serialized as an ordered map of header key to cell
struct RowRecord<'a> {
    headers: &'a [&'static str],
    cells: &'a [CellValue],
}

impl Serialize for RowRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.headers.len()))?;
        for (header, cell) in self.headers.iter().zip(self.cells) {
            map.serialize_entry(&header_key(header), cell)?;
        }
        map.end()
    }
}

pub struct TableFormatter<'a> {
    headers: &'a [&'static str],
    entity_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(headers: &'a [&'static str], entity_name: &'static str) -> Self {
        Self {
            headers,
            entity_name,
            show_summary: true,
        }
    }

    /// Show summary line after TSV tables (e.g., "5 patients found.")
    pub fn with_summary(mut self, show_summary: bool) -> Self {
        self.show_summary = show_summary;
        self
    }

    /// Render rows in the specified format
    pub fn render(&self, rows: &[Vec<CellValue>], format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Auto | OutputFormat::Tsv => Ok(self.render_tsv(rows)),
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => Ok(self.render_md(rows)),
            OutputFormat::Id => Ok(self.render_ids(rows)),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&self.records(rows)).into_diagnostic()?;
                Ok(format!("{}\n", json))
            }
            OutputFormat::Yaml => serde_yml::to_string(&self.records(rows)).into_diagnostic(),
        }
    }

    fn records<'r>(&'r self, rows: &'r [Vec<CellValue>]) -> Vec<RowRecord<'r>> {
        rows.iter()
            .map(|cells| RowRecord {
                headers: self.headers,
                cells,
            })
            .collect()
    }

    /// Calculate dynamic column widths based on actual content
    fn calculate_widths(&self, rows: &[Vec<CellValue>]) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(CellValue::display_width)
                    .max()
                    .unwrap_or(0);
                header.len().max(content).min(MAX_COLUMN_WIDTH)
            })
            .collect()
    }

    fn render_tsv(&self, rows: &[Vec<CellValue>]) -> String {
        let widths = self.calculate_widths(rows);
        let mut out = String::new();

        let header: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:<width$}", style(h).bold(), width = *w))
            .collect();
        out.push_str(header.join("  ").trim_end());
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| cell.format_tsv(*w))
                .collect();
            out.push_str(cells.join("  ").trim_end());
            out.push('\n');
        }

        if self.show_summary {
            out.push('\n');
            out.push_str(&format!(
                "{} found.\n",
                style(count_noun(rows.len(), self.entity_name)).cyan()
            ));
        }
        out
    }

    fn render_csv(&self, rows: &[Vec<CellValue>]) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(self.headers).into_diagnostic()?;
        for row in rows {
            writer
                .write_record(row.iter().map(CellValue::raw))
                .into_diagnostic()?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .into_diagnostic()?;
        String::from_utf8(bytes).into_diagnostic()
    }

    fn render_md(&self, rows: &[Vec<CellValue>]) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().copied());
        for row in rows {
            builder.push_record(row.iter().map(CellValue::format_md));
        }
        format!("{}\n", builder.build().with(Style::markdown()))
    }

    fn render_ids(&self, rows: &[Vec<CellValue>]) -> String {
        rows.iter()
            .filter_map(|row| {
                row.iter().find_map(|cell| match cell {
                    CellValue::Id(id) => Some(format!("{}\n", id)),
                    _ => None,
                })
            })
            .collect()
    }
}
