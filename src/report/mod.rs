//! Persisted report and the read-side views built on it.
//!
//! The report is a single JSON object keyed by file id, written in graph
//! insertion order with two-space indentation. [`ReportStore`] loads it back
//! and answers the questions a browser of the report asks: which files are
//! largest by some column, what a file exports and imports, and where a
//! symbol is originally defined.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::analysis::ExportRegistry;
use crate::graph::{ExportKind, FileNode, StyleGraph};
use crate::stats::{aggregate, Column, MedianMode, Statistics};

/// Errors that can occur while reading or writing a report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to read report {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write report {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid report {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize report")]
    Serialize(#[from] serde_json::Error),

    #[error("No file with id '{0}' in report")]
    UnknownFile(String),
}

/// Serializes a graph in the persisted report format, newline terminated.
pub fn to_json(graph: &StyleGraph) -> Result<String, ReportError> {
    let mut json = serde_json::to_string_pretty(graph)?;
    json.push('\n');
    Ok(json)
}

/// Writes the persisted report to `path`.
pub fn write_report(path: &Path, graph: &StyleGraph) -> Result<(), ReportError> {
    let json = to_json(graph)?;
    fs::write(path, json).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Report written: {}", path.display());
    Ok(())
}

/// Loads a persisted report.
pub fn load_report(path: &Path) -> Result<StyleGraph, ReportError> {
    let json = fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = serde_json::from_str(&json).map_err(|source| ReportError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Report loaded: {}", path.display());
    Ok(graph)
}

/// A file together with the files importing it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDetail<'a> {
    pub node: &'a FileNode,
    pub dependents: Vec<&'a str>,
}

/// One originally defined symbol and the files defining it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry<'a> {
    pub identifier: &'a str,
    pub kind: ExportKind,
    pub files: &'a [String],
}

/// Read-side views over a loaded report.
///
/// The export registry and statistics are rebuilt from the stored records
/// rather than persisted, so the report format only ever holds files.
#[derive(Debug, Clone)]
pub struct ReportStore {
    graph: StyleGraph,
    registry: ExportRegistry,
    statistics: Statistics,
}

impl ReportStore {
    /// Builds the views over `graph`. `root` is left out of the statistics.
    pub fn new(graph: StyleGraph, root: Option<String>, mode: MedianMode) -> Self {
        let registry = ExportRegistry::from_graph(&graph);
        let statistics = aggregate(&graph, root.as_deref(), mode);
        Self {
            graph,
            registry,
            statistics,
        }
    }

    /// Loads a report from disk and builds the views.
    pub fn load(path: &Path, root: Option<String>, mode: MedianMode) -> Result<Self, ReportError> {
        Ok(Self::new(load_report(path)?, root, mode))
    }

    pub fn graph(&self) -> &StyleGraph {
        &self.graph
    }

    pub fn registry(&self) -> &ExportRegistry {
        &self.registry
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// All files, highest `column` value first.
    ///
    /// Ties keep report order. Files without measurements come last.
    pub fn files_by(&self, column: Column) -> Vec<&FileNode> {
        let mut files: Vec<&FileNode> = self.graph.files().collect();
        files.sort_by(|a, b| {
            let a = a.stats.as_ref().map(|stats| column.value(stats));
            let b = b.stats.as_ref().map(|stats| column.value(stats));
            match (a, b) {
                (Some(a), Some(b)) => b.total_cmp(&a),
                (a, b) => b.is_some().cmp(&a.is_some()),
            }
        });
        files
    }

    /// Looks up a file and the files importing it.
    pub fn file(&self, id: &str) -> Result<FileDetail<'_>, ReportError> {
        let node = self
            .graph
            .get(id)
            .ok_or_else(|| ReportError::UnknownFile(id.to_string()))?;
        Ok(FileDetail {
            node,
            dependents: self.graph.dependents(id),
        })
    }

    /// Original definers of `identifier`, by kind.
    pub fn definers(&self, identifier: &str) -> Vec<(ExportKind, &[String])> {
        self.registry.lookup(identifier)
    }

    /// Every originally defined symbol, by identifier and then kind.
    pub fn exports(&self) -> Vec<ExportEntry<'_>> {
        self.registry
            .entries()
            .filter(|(_, _, definers)| !definers.originals.is_empty())
            .map(|(identifier, kind, definers)| ExportEntry {
                identifier,
                kind,
                files: definers.originals.as_slice(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ExportRecord;
    use crate::stats::{StyleStats, Total};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn measured(rules: u64) -> StyleStats {
        StyleStats {
            size: rules * 100,
            rules: Total::new(rules),
            ..StyleStats::default()
        }
    }

    fn sample_graph() -> StyleGraph {
        let mut root = FileNode::new("styles.scss", "/src/styles.scss");
        root.add_import("_tokens.scss");
        root.add_import("_card.scss");
        root.stats = Some(measured(40));

        let mut tokens = FileNode::new("_tokens.scss", "/src/_tokens.scss");
        tokens.exports.push(ExportRecord::original("brand", ExportKind::Variable));
        tokens.exports.push(ExportRecord::original("rem", ExportKind::Function));
        tokens.stats = Some(measured(0));

        let mut card = FileNode::new("_card.scss", "/src/_card.scss");
        card.add_import("_tokens.scss");
        card.exports.push(ExportRecord::reexport("brand", ExportKind::Variable, "_tokens.scss"));
        card.exports.push(ExportRecord::original("card", ExportKind::Mixin));
        card.stats = Some(measured(3));

        let mut button = FileNode::new("_button.scss", "/src/_button.scss");
        button.exports.push(ExportRecord::original("brand", ExportKind::Mixin));
        button.stats = Some(measured(3));

        let mut graph = StyleGraph::new();
        graph.add_file(root);
        graph.add_file(tokens);
        graph.add_file(card);
        graph.add_file(button);
        graph.link_imports();
        graph
    }

    #[test]
    fn test_write_and_load_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        let graph = sample_graph();

        write_report(&path, &graph).unwrap();
        let loaded = load_report(&path).unwrap();

        assert_eq!(to_json(&loaded).unwrap(), fs::read_to_string(&path).unwrap());
        let ids: Vec<&str> = loaded.ids().collect();
        assert_eq!(ids, vec!["styles.scss", "_tokens.scss", "_card.scss", "_button.scss"]);
    }

    #[test]
    fn test_report_format() {
        let mut graph = StyleGraph::new();
        let mut node = FileNode::new("_a.scss", "/src/_a.scss");
        node.exports.push(ExportRecord::original("x", ExportKind::Variable));
        graph.add_file(node);

        let json = to_json(&graph).unwrap();
        assert_eq!(
            json,
            "{\n  \"_a.scss\": {\n    \"id\": \"_a.scss\",\n    \"filepath\": \"/src/_a.scss\",\n    \"imports\": [],\n    \"exports\": [\n      {\n        \"identifier\": \"x\",\n        \"type\": \"variable\"\n      }\n    ]\n  }\n}\n"
        );
    }

    #[test]
    fn test_load_missing_report() {
        let dir = TempDir::new().unwrap();
        let err = load_report(&dir.path().join("graph.json")).unwrap_err();
        assert!(matches!(err, ReportError::Read { .. }));
    }

    #[test]
    fn test_load_invalid_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(load_report(&path).unwrap_err(), ReportError::Parse { .. }));
    }

    #[test]
    fn test_originals_index() {
        let store = ReportStore::new(sample_graph(), Some("styles.scss".into()), MedianMode::default());

        assert_eq!(
            store.definers("brand"),
            vec![
                (ExportKind::Variable, &["_tokens.scss".to_string()][..]),
                (ExportKind::Mixin, &["_button.scss".to_string()][..]),
            ]
        );

        let listing: Vec<(&str, ExportKind)> = store
            .exports()
            .iter()
            .map(|entry| (entry.identifier, entry.kind))
            .collect();
        assert_eq!(
            listing,
            vec![
                ("brand", ExportKind::Variable),
                ("brand", ExportKind::Mixin),
                ("card", ExportKind::Mixin),
                ("rem", ExportKind::Function),
            ]
        );
    }

    #[test]
    fn test_statistics_exclude_root_and_empty() {
        let store = ReportStore::new(sample_graph(), Some("styles.scss".into()), MedianMode::default());
        let rules = store.statistics().get(Column::Rules).unwrap();
        assert_eq!(rules.files, vec!["_card.scss", "_button.scss"]);
        assert_eq!(rules.mean, 3.0);
    }

    #[test]
    fn test_files_by_column_is_stable() {
        let store = ReportStore::new(sample_graph(), None, MedianMode::default());
        let ids: Vec<&str> = store
            .files_by(Column::Rules)
            .iter()
            .map(|node| node.id.as_str())
            .collect();
        assert_eq!(ids, vec!["styles.scss", "_card.scss", "_button.scss", "_tokens.scss"]);
    }

    #[test]
    fn test_file_detail() {
        let store = ReportStore::new(sample_graph(), None, MedianMode::default());

        let detail = store.file("_tokens.scss").unwrap();
        assert_eq!(detail.node.exports.len(), 2);
        assert_eq!(detail.dependents, vec!["styles.scss", "_card.scss"]);

        assert!(matches!(store.file("nope.scss"), Err(ReportError::UnknownFile(_))));
    }
}
