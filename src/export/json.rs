//! JSON export implementation.
//!
//! Exports report views in JSON format for machine-readable output.

use super::{DefinerLookup, ExportData, Exporter, FileIndex, Summary};
use crate::graph::{CycleEdge, ExportKind, FileNode, UnresolvedImport};
use crate::report::{ExportEntry, FileDetail};
use crate::stats::{DeviationBand, MedianMode, Statistics, StatisticsColumn, StyleStats};
use serde::Serialize;
use std::io::{self, Write};

/// JSON exporter implementation.
pub struct JsonExporter;

/// Serializable statistics column for JSON output.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonColumn<'a> {
    key: &'static str,
    label: &'static str,
    count: usize,
    mean: f64,
    median: Option<f64>,
    standard_deviation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    largest: Option<JsonExtreme<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    smallest: Option<JsonExtreme<'a>>,
}

#[derive(Serialize)]
struct JsonExtreme<'a> {
    file: &'a str,
    value: f64,
}

impl<'a> From<&'a StatisticsColumn> for JsonColumn<'a> {
    fn from(column: &'a StatisticsColumn) -> Self {
        let extreme = |entry: Option<(&'a str, f64)>| {
            entry.map(|(file, value)| JsonExtreme { file, value })
        };
        Self {
            key: column.column.key(),
            label: column.column.label(),
            count: column.count(),
            mean: column.mean,
            median: column.median,
            standard_deviation: column.standard_deviation,
            largest: extreme(column.largest()),
            smallest: extreme(column.smallest()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonStatistics<'a> {
    median_mode: MedianMode,
    sample_size: usize,
    columns: Vec<JsonColumn<'a>>,
}

impl<'a> From<&'a Statistics> for JsonStatistics<'a> {
    fn from(statistics: &'a Statistics) -> Self {
        Self {
            median_mode: statistics.mode,
            sample_size: statistics.sample_size(),
            columns: statistics.columns().map(JsonColumn::from).collect(),
        }
    }
}

/// Serializable cycle info for JSON output.
#[derive(Serialize)]
struct JsonCycle<'a> {
    files: &'a [String],
    path: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary<'a> {
    root: &'a str,
    files: usize,
    imports: usize,
    identifiers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<String>,
    statistics: JsonStatistics<'a>,
    cycles: Vec<JsonCycle<'a>>,
    cycle_edges: &'a [CycleEdge],
    unresolved: &'a [UnresolvedImport],
    #[serde(skip_serializing_if = "Option::is_none")]
    unreachable: Option<&'a [String]>,
}

impl<'a> From<&'a Summary<'a>> for JsonSummary<'a> {
    fn from(summary: &'a Summary<'a>) -> Self {
        Self {
            root: summary.root,
            files: summary.files,
            imports: summary.imports,
            identifiers: summary.identifiers,
            report: summary.report.map(|path| path.display().to_string()),
            statistics: JsonStatistics::from(summary.statistics),
            cycles: summary
                .cycles
                .iter()
                .map(|cycle| JsonCycle {
                    files: &cycle.nodes,
                    path: cycle.cycle_path(),
                })
                .collect(),
            cycle_edges: summary.cycle_edges,
            unresolved: summary.unresolved,
            unreachable: summary.unreachable,
        }
    }
}

#[derive(Serialize)]
struct JsonFileRow<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    band: Option<DeviationBand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<&'a StyleStats>,
}

#[derive(Serialize)]
struct JsonFileIndex<'a> {
    column: &'static str,
    files: Vec<JsonFileRow<'a>>,
}

impl<'a> From<&'a FileIndex<'a>> for JsonFileIndex<'a> {
    fn from(index: &'a FileIndex<'a>) -> Self {
        Self {
            column: index.column.key(),
            files: index
                .rows
                .iter()
                .map(|row| JsonFileRow {
                    id: &row.node.id,
                    value: row.node.stats.as_ref().map(|stats| index.column.value(stats)),
                    band: row.band,
                    stats: row.node.stats.as_ref(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct JsonFileDetail<'a> {
    #[serde(flatten)]
    node: &'a FileNode,
    dependents: &'a [&'a str],
}

#[derive(Serialize)]
struct JsonDefiners<'a> {
    #[serde(rename = "type")]
    kind: ExportKind,
    files: &'a [String],
}

#[derive(Serialize)]
struct JsonExportEntry<'a> {
    identifier: &'a str,
    #[serde(rename = "type")]
    kind: ExportKind,
    files: &'a [String],
}

#[derive(Serialize)]
struct JsonLookup<'a> {
    identifier: &'a str,
    definers: Vec<JsonDefiners<'a>>,
}

fn exports_listing<'a>(entries: &'a [ExportEntry<'a>]) -> Vec<JsonExportEntry<'a>> {
    entries
        .iter()
        .map(|entry| JsonExportEntry {
            identifier: entry.identifier,
            kind: entry.kind,
            files: entry.files,
        })
        .collect()
}

fn lookup<'a>(lookup: &'a DefinerLookup<'a>) -> JsonLookup<'a> {
    JsonLookup {
        identifier: lookup.identifier,
        definers: lookup
            .definers
            .iter()
            .map(|(kind, files)| JsonDefiners { kind: *kind, files })
            .collect(),
    }
}

fn file_detail<'a>(detail: &'a FileDetail<'a>) -> JsonFileDetail<'a> {
    JsonFileDetail {
        node: detail.node,
        dependents: &detail.dependents,
    }
}

impl Exporter for JsonExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        let json = match data {
            ExportData::Summary(summary) => to_pretty(&JsonSummary::from(summary)),
            ExportData::Files(index) => to_pretty(&JsonFileIndex::from(index)),
            ExportData::File(detail) => to_pretty(&file_detail(detail)),
            ExportData::Exports(entries) => to_pretty(&exports_listing(entries)),
            ExportData::Definers(definers) => to_pretty(&lookup(definers)),
            ExportData::Statistics(statistics) => to_pretty(&JsonStatistics::from(*statistics)),
        }?;

        writeln!(writer, "{}", json)
    }
}

fn to_pretty<T: Serialize>(value: &T) -> io::Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures;
    use crate::export::FileIndex;
    use crate::stats::Column;
    use pretty_assertions::assert_eq;

    fn render(data: &ExportData) -> serde_json::Value {
        let mut output = Vec::new();
        JsonExporter.export(data, &mut output).unwrap();
        serde_json::from_slice(&output).unwrap()
    }

    #[test]
    fn test_json_statistics() {
        let store = fixtures::store();
        let parsed = render(&ExportData::Statistics(store.statistics()));

        assert_eq!(parsed["medianMode"], "numeric");
        assert_eq!(parsed["sampleSize"], 2);
        let size = &parsed["columns"][0];
        assert_eq!(size["key"], "size");
        assert_eq!(size["mean"], 200.0);
        assert_eq!(size["median"], 300.0);
        assert_eq!(size["standardDeviation"], 100.0);
        assert_eq!(size["largest"]["file"], "_big,table.scss");
        assert_eq!(size["smallest"]["file"], "_card.scss");
    }

    #[test]
    fn test_json_file_index() {
        let store = fixtures::store();
        let parsed = render(&ExportData::Files(FileIndex::new(&store, Column::Size)));

        assert_eq!(parsed["column"], "size");
        let files = parsed["files"].as_array().unwrap();
        assert_eq!(files.len(), 4);
        assert_eq!(files[0]["id"], "styles.scss");
        assert_eq!(files[0]["band"], "above-2");
        assert_eq!(files[1]["band"], "within-1");
        assert_eq!(files[1]["stats"]["gzipSize"], 150);
    }

    #[test]
    fn test_json_file_detail() {
        let store = fixtures::store();
        let parsed = render(&ExportData::File(store.file("_tokens.scss").unwrap()));

        assert_eq!(parsed["id"], "_tokens.scss");
        assert_eq!(parsed["exports"][0]["type"], "variable");
        assert_eq!(parsed["dependents"], serde_json::json!(["styles.scss", "_card.scss"]));
    }

    #[test]
    fn test_json_exports_and_lookup() {
        let store = fixtures::store();

        let parsed = render(&ExportData::Exports(store.exports()));
        assert_eq!(
            parsed,
            serde_json::json!([
                { "identifier": "brand", "type": "variable", "files": ["_tokens.scss"] },
                { "identifier": "card", "type": "mixin", "files": ["_card.scss"] },
            ])
        );

        let parsed = render(&ExportData::Definers(DefinerLookup {
            identifier: "brand",
            definers: store.definers("brand"),
        }));
        assert_eq!(parsed["definers"][0]["files"], serde_json::json!(["_tokens.scss"]));
    }
}
