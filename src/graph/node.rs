//! Data model for stylesheet files and the symbols they export.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::stats::StyleStats;

/// The kind of symbol a stylesheet exports.
///
/// The declaration order is also the order exports are collected in
/// (variables, then functions, then mixins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// A `$variable` declared at module level.
    Variable,
    /// A function declared with `@function`.
    Function,
    /// A mixin declared with `@mixin`.
    Mixin,
}

impl ExportKind {
    /// All kinds, in collection order.
    pub const ALL: [ExportKind; 3] = [ExportKind::Variable, ExportKind::Function, ExportKind::Mixin];

    /// Returns the lowercase label used in the persisted report.
    pub fn label(&self) -> &'static str {
        match self {
            ExportKind::Variable => "variable",
            ExportKind::Function => "function",
            ExportKind::Mixin => "mixin",
        }
    }

    /// Formats an identifier the way it is written in source.
    ///
    /// # Example
    ///
    /// ```
    /// use stylegraph::graph::ExportKind;
    ///
    /// assert_eq!(ExportKind::Variable.display_identifier("spacing-01"), "$spacing-01");
    /// assert_eq!(ExportKind::Mixin.display_identifier("focus-outline"), "@mixin focus-outline");
    /// ```
    pub fn display_identifier(&self, identifier: &str) -> String {
        match self {
            ExportKind::Variable => format!("${}", identifier),
            ExportKind::Function => format!("@function {}", identifier),
            ExportKind::Mixin => format!("@mixin {}", identifier),
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One exported symbol of a file.
///
/// `from` is set when the same identifier and kind was already exported by
/// one of the file's direct imports, which makes this record a re-export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Symbol name without sigil (`color`, not `$color`)
    pub identifier: String,
    /// Kind of symbol
    #[serde(rename = "type")]
    pub kind: ExportKind,
    /// Id of the direct import that supplied this symbol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl ExportRecord {
    /// Creates a record for a symbol this file defines itself.
    pub fn original(identifier: impl Into<String>, kind: ExportKind) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            from: None,
        }
    }

    /// Creates a record for a symbol re-exported from a direct import.
    pub fn reexport(identifier: impl Into<String>, kind: ExportKind, from: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            from: Some(from.into()),
        }
    }

    /// Returns true if this file is the original definer of the symbol.
    pub fn is_original(&self) -> bool {
        self.from.is_none()
    }
}

/// A stylesheet file in the import graph.
///
/// Nodes are created by the graph builder with their imports populated.
/// Exports and statistics are filled in once, later, in topological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    /// Path relative to the base directory, `/`-separated
    pub id: String,
    /// Absolute location on disk
    pub filepath: PathBuf,
    /// Ids of directly imported files, unique, in discovery order
    #[serde(default)]
    pub imports: Vec<String>,
    /// Exported symbols, unique per (identifier, kind)
    #[serde(default)]
    pub exports: Vec<ExportRecord>,
    /// Measurements from the statistics collaborator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StyleStats>,
}

impl FileNode {
    /// Creates a node with no imports, exports or statistics.
    pub fn new(id: impl Into<String>, filepath: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            filepath: filepath.into(),
            imports: Vec::new(),
            exports: Vec::new(),
            stats: None,
        }
    }

    /// Adds an import edge. Returns `false` if it was already present.
    pub fn add_import(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.imports.contains(&id) {
            return false;
        }
        self.imports.push(id);
        true
    }

    /// Returns true if `id` is a direct import of this file.
    pub fn imports_file(&self, id: &str) -> bool {
        self.imports.iter().any(|import| import == id)
    }

    /// Finds the export record for an identifier and kind.
    pub fn export(&self, identifier: &str, kind: ExportKind) -> Option<&ExportRecord> {
        self.exports
            .iter()
            .find(|record| record.identifier == identifier && record.kind == kind)
    }
}

/// An `@import` reference that matched no candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedImport {
    /// The reference string as written in the source
    pub reference: String,
    /// Id of the file containing the import
    pub importer: String,
}

impl fmt::Display for UnresolvedImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' imported from {}", self.reference, self.importer)
    }
}
