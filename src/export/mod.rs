//! Textual renderers for analysis results and report views.
//!
//! Every view can be written as JSON, CSV or Markdown. The renderers only
//! format; all the numbers come from [`crate::pipeline::Analysis`] or
//! [`crate::report::ReportStore`].

pub mod csv;
pub mod json;
pub mod markdown;

use std::io::{self, Write};
use std::path::Path;

use crate::graph::{CycleEdge, CycleInfo, ExportKind, FileNode, UnresolvedImport};
use crate::pipeline::Analysis;
use crate::report::{ExportEntry, FileDetail, ReportStore};
use crate::stats::{Column, DeviationBand, Statistics};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// JSON format - machine-readable, full data
    Json,
    /// CSV format - spreadsheet-friendly
    Csv,
    /// Markdown format - documentation/reporting
    #[default]
    Markdown,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            _ => Err(format!(
                "Unknown export format: '{}'. Valid formats: json, csv, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Outcome of an `analyze` run.
#[derive(Debug, Clone)]
pub struct Summary<'a> {
    pub root: &'a str,
    pub files: usize,
    pub imports: usize,
    /// Distinct exported identifiers
    pub identifiers: usize,
    pub statistics: &'a Statistics,
    pub cycles: &'a [CycleInfo],
    pub cycle_edges: &'a [CycleEdge],
    pub unresolved: &'a [UnresolvedImport],
    pub unreachable: Option<&'a [String]>,
    /// Where the persisted report was written
    pub report: Option<&'a Path>,
}

impl<'a> Summary<'a> {
    pub fn new(analysis: &'a Analysis, report: Option<&'a Path>) -> Self {
        Self {
            root: &analysis.root,
            files: analysis.graph.node_count(),
            imports: analysis.graph.edge_count(),
            identifiers: analysis.registry.identifiers().count(),
            statistics: &analysis.statistics,
            cycles: &analysis.cycles,
            cycle_edges: &analysis.cycle_edges,
            unresolved: &analysis.unresolved,
            unreachable: analysis.unreachable.as_deref(),
            report,
        }
    }
}

/// One row of the file index.
#[derive(Debug, Clone)]
pub struct FileRow<'a> {
    pub node: &'a FileNode,
    /// Deviation of the sort column from its median
    pub band: Option<DeviationBand>,
}

/// All files of a report, sorted by one column.
#[derive(Debug, Clone)]
pub struct FileIndex<'a> {
    pub column: Column,
    pub rows: Vec<FileRow<'a>>,
}

impl<'a> FileIndex<'a> {
    pub fn new(store: &'a ReportStore, column: Column) -> Self {
        let rows = store
            .files_by(column)
            .into_iter()
            .map(|node| FileRow {
                node,
                band: node
                    .stats
                    .as_ref()
                    .and_then(|stats| store.statistics().band(column, stats)),
            })
            .collect();
        Self { column, rows }
    }
}

/// Where one identifier is originally defined.
#[derive(Debug, Clone)]
pub struct DefinerLookup<'a> {
    pub identifier: &'a str,
    pub definers: Vec<(ExportKind, &'a [String])>,
}

/// A renderable view.
#[derive(Debug, Clone)]
pub enum ExportData<'a> {
    Summary(Summary<'a>),
    Files(FileIndex<'a>),
    File(FileDetail<'a>),
    Exports(Vec<ExportEntry<'a>>),
    Definers(DefinerLookup<'a>),
    Statistics(&'a Statistics),
}

/// Trait for exporters.
pub trait Exporter {
    /// Export the data to the given writer.
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()>;
}

/// Export data in the specified format.
pub fn export<W: Write>(
    format: ExportFormat,
    data: &ExportData,
    writer: &mut W,
) -> io::Result<()> {
    match format {
        ExportFormat::Json => json::JsonExporter.export(data, writer),
        ExportFormat::Csv => csv::CsvExporter.export(data, writer),
        ExportFormat::Markdown => markdown::MarkdownExporter.export(data, writer),
    }
}

/// Export data to a string.
pub fn export_to_string(format: ExportFormat, data: &ExportData) -> io::Result<String> {
    let mut buffer = Vec::new();
    export(format, data, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::graph::{ExportKind, ExportRecord, FileNode, StyleGraph};
    use crate::report::ReportStore;
    use crate::stats::{MedianMode, SelectorStats, Specificity, StyleStats, Total};

    fn measured(size: u64, rules: u64, specificity: f64) -> StyleStats {
        StyleStats {
            size,
            gzip_size: size / 2,
            humanized_size: crate::stats::format_size(size),
            humanized_gzip_size: crate::stats::format_size(size / 2),
            rules: Total::new(rules),
            selectors: SelectorStats {
                total: rules,
                specificity: Specificity {
                    average: specificity,
                    max: specificity as u32,
                    ..Specificity::default()
                },
                ..SelectorStats::default()
            },
            declarations: Total::new(rules * 2),
            ..StyleStats::default()
        }
    }

    /// A root, a token partial and two components, one of them a comma-named
    /// outlier.
    pub fn store() -> ReportStore {
        let mut root = FileNode::new("styles.scss", "/src/styles.scss");
        root.add_import("_tokens.scss");
        root.add_import("_card.scss");
        root.add_import("_big,table.scss");
        root.stats = Some(measured(9000, 90, 10.0));

        let mut tokens = FileNode::new("_tokens.scss", "/src/_tokens.scss");
        tokens.exports.push(ExportRecord::original("brand", ExportKind::Variable));
        tokens.stats = Some(StyleStats::default());

        let mut card = FileNode::new("_card.scss", "/src/_card.scss");
        card.add_import("_tokens.scss");
        card.exports.push(ExportRecord::reexport("brand", ExportKind::Variable, "_tokens.scss"));
        card.exports.push(ExportRecord::original("card", ExportKind::Mixin));
        card.stats = Some(measured(100, 2, 10.0));

        let mut table = FileNode::new("_big,table.scss", "/src/_big,table.scss");
        table.stats = Some(measured(300, 6, 30.0));

        let mut graph = StyleGraph::new();
        for node in [root, tokens, card, table] {
            graph.add_file(node);
        }
        graph.link_imports();

        ReportStore::new(graph, Some("styles.scss".to_string()), MedianMode::Numeric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(
            "md".parse::<ExportFormat>().unwrap(),
            ExportFormat::Markdown
        );
        assert!("html".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_format_display() {
        assert_eq!(format!("{}", ExportFormat::Json), "json");
        assert_eq!(format!("{}", ExportFormat::Markdown), "markdown");
        assert_eq!(ExportFormat::default(), ExportFormat::Markdown);
    }

    #[test]
    fn test_file_index_bands() {
        let store = fixtures::store();
        let index = FileIndex::new(&store, Column::Size);

        let ids: Vec<&str> = index.rows.iter().map(|row| row.node.id.as_str()).collect();
        assert_eq!(ids, vec!["styles.scss", "_big,table.scss", "_card.scss", "_tokens.scss"]);

        // sample is {100, 300}: median 300, deviation 100
        assert_eq!(index.rows[0].band, Some(DeviationBand::Above2));
        assert_eq!(index.rows[1].band, Some(DeviationBand::Within1));
        assert_eq!(index.rows[2].band, Some(DeviationBand::Below2));
    }

    #[test]
    fn test_export_to_string_every_format() {
        let store = fixtures::store();
        let data = ExportData::Statistics(store.statistics());
        for format in [ExportFormat::Json, ExportFormat::Csv, ExportFormat::Markdown] {
            let output = export_to_string(format, &data).unwrap();
            assert!(output.ends_with('\n'), "{} output", format);
        }
    }
}
