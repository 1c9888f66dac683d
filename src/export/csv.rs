//! CSV export implementation.
//!
//! Exports report views in CSV format for spreadsheet use. Views with
//! several parts (the analysis summary) are written as one table of
//! `section,key,value` rows.

use super::{ExportData, Exporter};
use crate::stats::{format_number, Column, Statistics};
use std::io::{self, Write};

/// CSV exporter implementation.
pub struct CsvExporter;

impl CsvExporter {
    /// Escape a field value for CSV format.
    ///
    /// Wraps the value in quotes if it contains commas, quotes, or newlines.
    fn escape_field(value: &str) -> String {
        if value.contains(',') || value.contains('"') || value.contains('\n') {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value.to_string()
        }
    }

    fn optional(value: Option<f64>) -> String {
        value.map(format_number).unwrap_or_default()
    }

    fn statistics<W: Write>(statistics: &Statistics, writer: &mut W) -> io::Result<()> {
        writeln!(
            writer,
            "column,count,mean,median,standard_deviation,largest,smallest"
        )?;
        for column in statistics.columns() {
            writeln!(
                writer,
                "{},{},{},{},{},{},{}",
                column.column.key(),
                column.count(),
                format_number(column.mean),
                Self::optional(column.median),
                format_number(column.standard_deviation),
                Self::escape_field(column.largest().map_or("", |(file, _)| file)),
                Self::escape_field(column.smallest().map_or("", |(file, _)| file)),
            )?;
        }
        Ok(())
    }
}

impl Exporter for CsvExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        match data {
            ExportData::Summary(summary) => {
                writeln!(writer, "section,key,value")?;
                writeln!(writer, "summary,root,{}", Self::escape_field(summary.root))?;
                writeln!(writer, "summary,files,{}", summary.files)?;
                writeln!(writer, "summary,imports,{}", summary.imports)?;
                writeln!(writer, "summary,identifiers,{}", summary.identifiers)?;
                for column in summary.statistics.columns() {
                    writeln!(
                        writer,
                        "mean,{},{}",
                        column.column.key(),
                        format_number(column.mean)
                    )?;
                    writeln!(
                        writer,
                        "median,{},{}",
                        column.column.key(),
                        Self::optional(column.median)
                    )?;
                    writeln!(
                        writer,
                        "standard_deviation,{},{}",
                        column.column.key(),
                        format_number(column.standard_deviation)
                    )?;
                }
                for (i, cycle) in summary.cycles.iter().enumerate() {
                    writeln!(writer, "cycle,{},{}", i + 1, Self::escape_field(&cycle.cycle_path()))?;
                }
                for edge in summary.cycle_edges {
                    writeln!(
                        writer,
                        "cycle_edge,{},{}",
                        Self::escape_field(&edge.from),
                        Self::escape_field(&edge.to)
                    )?;
                }
                for import in summary.unresolved {
                    writeln!(
                        writer,
                        "unresolved,{},{}",
                        Self::escape_field(&import.importer),
                        Self::escape_field(&import.reference)
                    )?;
                }
                for id in summary.unreachable.unwrap_or_default() {
                    writeln!(writer, "unreachable,{},", Self::escape_field(id))?;
                }
            }
            ExportData::Files(index) => {
                write!(writer, "id")?;
                for column in Column::ALL {
                    write!(writer, ",{}", column.key())?;
                }
                writeln!(writer, ",band")?;

                for row in &index.rows {
                    write!(writer, "{}", Self::escape_field(&row.node.id))?;
                    for column in Column::ALL {
                        let value = row.node.stats.as_ref().map(|stats| column.value(stats));
                        write!(writer, ",{}", Self::optional(value))?;
                    }
                    writeln!(writer, ",{}", row.band.map_or("", |band| band.label()))?;
                }
            }
            ExportData::File(detail) => {
                writeln!(writer, "relation,id,type,from")?;
                for record in &detail.node.exports {
                    writeln!(
                        writer,
                        "export,{},{},{}",
                        Self::escape_field(&record.identifier),
                        record.kind,
                        Self::escape_field(record.from.as_deref().unwrap_or_default())
                    )?;
                }
                for import in &detail.node.imports {
                    writeln!(writer, "import,{},,", Self::escape_field(import))?;
                }
                for dependent in &detail.dependents {
                    writeln!(writer, "imported_by,{},,", Self::escape_field(dependent))?;
                }
            }
            ExportData::Exports(entries) => {
                writeln!(writer, "identifier,type,file")?;
                for entry in entries {
                    for file in entry.files {
                        writeln!(
                            writer,
                            "{},{},{}",
                            Self::escape_field(entry.identifier),
                            entry.kind,
                            Self::escape_field(file)
                        )?;
                    }
                }
            }
            ExportData::Definers(lookup) => {
                writeln!(writer, "identifier,type,file")?;
                for (kind, files) in &lookup.definers {
                    for file in files.iter() {
                        writeln!(
                            writer,
                            "{},{},{}",
                            Self::escape_field(lookup.identifier),
                            kind,
                            Self::escape_field(file)
                        )?;
                    }
                }
            }
            ExportData::Statistics(statistics) => Self::statistics(statistics, writer)?,
        }

        Ok(())
    }
}
