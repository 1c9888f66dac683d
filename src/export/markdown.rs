//! Markdown export implementation.
//!
//! Exports report views in Markdown format for documentation and reporting.

use super::{ExportData, Exporter, FileIndex, Summary};
use crate::report::{ExportEntry, FileDetail};
use crate::stats::{format_number, Column, MedianMode, Statistics};
use std::io::{self, Write};

/// Markdown exporter implementation.
pub struct MarkdownExporter;

/// Pipes would split a table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|")
}

fn write_statistics<W: Write>(statistics: &Statistics, writer: &mut W) -> io::Result<()> {
    writeln!(
        writer,
        "Sample: {} files, {} median",
        statistics.sample_size(),
        match statistics.mode {
            MedianMode::Lexicographic => "lexicographic",
            MedianMode::Numeric => "numeric",
        }
    )?;
    writeln!(writer)?;
    writeln!(
        writer,
        "| Column | Mean | Median | Std. deviation | Largest | Smallest |"
    )?;
    writeln!(writer, "|--------|------|--------|----------------|---------|----------|")?;
    for column in statistics.columns() {
        let extreme = |entry: Option<(&str, f64)>| {
            entry
                .map(|(file, value)| format!("{} ({})", cell(file), format_number(value)))
                .unwrap_or_else(|| "-".to_string())
        };
        writeln!(
            writer,
            "| {} | {:.2} | {} | {:.2} | {} | {} |",
            column.column.label(),
            column.mean,
            column.median.map_or_else(|| "-".to_string(), format_number),
            column.standard_deviation,
            extreme(column.largest()),
            extreme(column.smallest()),
        )?;
    }
    writeln!(writer)
}

fn write_summary<W: Write>(summary: &Summary, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "# Stylesheet Analysis Report")?;
    writeln!(writer)?;
    writeln!(writer, "**Root:** {}", summary.root)?;
    if let Some(report) = summary.report {
        writeln!(writer, "**Report:** {}", report.display())?;
    }
    writeln!(writer)?;

    writeln!(writer, "## Summary")?;
    writeln!(writer)?;
    writeln!(writer, "| Metric | Count |")?;
    writeln!(writer, "|--------|-------|")?;
    writeln!(writer, "| Files | {} |", summary.files)?;
    writeln!(writer, "| Imports | {} |", summary.imports)?;
    writeln!(writer, "| Exported Identifiers | {} |", summary.identifiers)?;
    writeln!(writer, "| Import Cycles | {} |", summary.cycles.len())?;
    writeln!(writer, "| Unresolved Imports | {} |", summary.unresolved.len())?;
    if let Some(unreachable) = summary.unreachable {
        writeln!(writer, "| Unreachable Stylesheets | {} |", unreachable.len())?;
    }
    writeln!(writer)?;

    writeln!(writer, "## Statistics")?;
    writeln!(writer)?;
    write_statistics(summary.statistics, writer)?;

    let unreachable = summary.unreachable.unwrap_or_default();
    if !summary.cycles.is_empty() || !summary.unresolved.is_empty() || !unreachable.is_empty() {
        writeln!(writer, "## Issues")?;
        writeln!(writer)?;
    }

    if !summary.cycles.is_empty() {
        writeln!(writer, "### Import Cycles")?;
        writeln!(writer)?;
        writeln!(writer, "The following import cycles were detected:")?;
        writeln!(writer)?;
        for (i, cycle) in summary.cycles.iter().enumerate() {
            writeln!(writer, "{}. `{}`", i + 1, cycle.cycle_path())?;
        }
        writeln!(writer)?;
        if !summary.cycle_edges.is_empty() {
            writeln!(writer, "Imports skipped while ordering:")?;
            writeln!(writer)?;
            for edge in summary.cycle_edges {
                writeln!(writer, "- `{}`", edge)?;
            }
            writeln!(writer)?;
        }
    }

    if !summary.unresolved.is_empty() {
        writeln!(writer, "### Unresolved Imports")?;
        writeln!(writer)?;
        writeln!(writer, "| Reference | Imported From |")?;
        writeln!(writer, "|-----------|---------------|")?;
        for import in summary.unresolved {
            writeln!(writer, "| {} | {} |", cell(&import.reference), cell(&import.importer))?;
        }
        writeln!(writer)?;
    }

    if !unreachable.is_empty() {
        writeln!(writer, "### Unreachable Stylesheets")?;
        writeln!(writer)?;
        for id in unreachable {
            writeln!(writer, "- {}", id)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn write_files<W: Write>(index: &FileIndex, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "# Files by {}", index.column.label())?;
    writeln!(writer)?;
    writeln!(writer, "| File | {} | Deviation |", index.column.label())?;
    writeln!(writer, "|------|------|-----------|")?;
    for row in &index.rows {
        writeln!(
            writer,
            "| {} | {} | {} |",
            cell(&row.node.id),
            row.node
                .stats
                .as_ref()
                .map_or_else(|| "-".to_string(), |stats| index.column.display_value(stats)),
            row.band.map_or("-", |band| band.label()),
        )?;
    }
    writeln!(writer)
}

fn write_file<W: Write>(detail: &FileDetail, writer: &mut W) -> io::Result<()> {
    let node = detail.node;
    writeln!(writer, "# {}", node.id)?;
    writeln!(writer)?;
    writeln!(writer, "`{}`", node.filepath.display())?;
    writeln!(writer)?;

    if let Some(stats) = &node.stats {
        writeln!(writer, "| Column | Value |")?;
        writeln!(writer, "|--------|-------|")?;
        for column in Column::ALL {
            writeln!(writer, "| {} | {} |", column.label(), column.display_value(stats))?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "## Exports ({})", node.exports.len())?;
    writeln!(writer)?;
    if !node.exports.is_empty() {
        writeln!(writer, "| Identifier | Type | From |")?;
        writeln!(writer, "|------------|------|------|")?;
        for record in &node.exports {
            writeln!(
                writer,
                "| `{}` | {} | {} |",
                record.kind.display_identifier(&record.identifier),
                record.kind,
                record.from.as_deref().map_or_else(|| "-".to_string(), cell),
            )?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "## Imports ({})", node.imports.len())?;
    writeln!(writer)?;
    for import in &node.imports {
        writeln!(writer, "- {}", import)?;
    }
    if !node.imports.is_empty() {
        writeln!(writer)?;
    }

    writeln!(writer, "## Imported By ({})", detail.dependents.len())?;
    writeln!(writer)?;
    for dependent in &detail.dependents {
        writeln!(writer, "- {}", dependent)?;
    }
    if !detail.dependents.is_empty() {
        writeln!(writer)?;
    }
    Ok(())
}

fn write_exports<W: Write>(entries: &[ExportEntry], writer: &mut W) -> io::Result<()> {
    writeln!(writer, "# Exports")?;
    writeln!(writer)?;
    writeln!(writer, "| Identifier | Defined In |")?;
    writeln!(writer, "|------------|------------|")?;
    for entry in entries {
        writeln!(
            writer,
            "| `{}` | {} |",
            entry.kind.display_identifier(entry.identifier),
            cell(&entry.files.join(", ")),
        )?;
    }
    writeln!(writer)
}

impl Exporter for MarkdownExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        match data {
            ExportData::Summary(summary) => write_summary(summary, writer)?,
            ExportData::Files(index) => write_files(index, writer)?,
            ExportData::File(detail) => write_file(detail, writer)?,
            ExportData::Exports(entries) => write_exports(entries, writer)?,
            ExportData::Definers(lookup) => {
                writeln!(writer, "# Where is `{}` defined?", lookup.identifier)?;
                writeln!(writer)?;
                if lookup.definers.is_empty() {
                    writeln!(writer, "No file defines `{}`.", lookup.identifier)?;
                    writeln!(writer)?;
                }
                for (kind, files) in &lookup.definers {
                    writeln!(
                        writer,
                        "- `{}`: {}",
                        kind.display_identifier(lookup.identifier),
                        files.join(", ")
                    )?;
                }
                if !lookup.definers.is_empty() {
                    writeln!(writer)?;
                }
            }
            ExportData::Statistics(statistics) => {
                writeln!(writer, "# Statistics")?;
                writeln!(writer)?;
                write_statistics(statistics, writer)?;
            }
        }

        // Footer
        writeln!(writer, "---")?;
        writeln!(writer, "*Generated by stylegraph*")?;

        Ok(())
    }
}
