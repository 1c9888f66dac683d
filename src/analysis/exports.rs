//! Export resolution with one-hop re-export provenance.
//!
//! Files are visited in dependency order. For every symbol a file declares,
//! the registry is asked which files already export the same identifier and
//! kind; if one of them is a direct import of the current file, the record is
//! a re-export `from` that import. Otherwise the file is an original definer.

use std::collections::BTreeMap;
use std::fs;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use super::introspect::{IntrospectError, ModuleIntrospector, ModuleSymbols};
use crate::graph::{ExportKind, ExportRecord, FileNode, StyleGraph};

/// Files associated with one identifier and kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Definers {
    /// Every file exporting the symbol, original or re-exporting, in visit order
    pub exporters: Vec<String>,
    /// Files whose record has no `from`, in visit order
    pub originals: Vec<String>,
}

/// Registry of exported symbols: identifier, then kind, then files.
///
/// Identifiers iterate in lexical order and kinds in
/// `variable, function, mixin` order. File lists keep the order files were
/// recorded in, which is also the tie-break for provenance lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExportRegistry {
    symbols: BTreeMap<String, BTreeMap<ExportKind, Definers>>,
}

impl ExportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a registry from the export records already stored in a graph.
    ///
    /// Files are recorded in graph insertion order.
    pub fn from_graph(graph: &StyleGraph) -> Self {
        let mut registry = Self::new();
        for node in graph.files() {
            for record in &node.exports {
                registry.record(&node.id, record);
            }
        }
        registry
    }

    /// Registers `file` as an exporter of `record`.
    pub fn record(&mut self, file: &str, record: &ExportRecord) {
        let definers = self
            .symbols
            .entry(record.identifier.clone())
            .or_default()
            .entry(record.kind)
            .or_default();

        if !definers.exporters.iter().any(|id| id == file) {
            definers.exporters.push(file.to_string());
        }
        if record.is_original() && !definers.originals.iter().any(|id| id == file) {
            definers.originals.push(file.to_string());
        }
    }

    fn definers(&self, identifier: &str, kind: ExportKind) -> Option<&Definers> {
        self.symbols.get(identifier)?.get(&kind)
    }

    /// All files exporting `identifier` as `kind`, in recording order.
    pub fn exporters(&self, identifier: &str, kind: ExportKind) -> &[String] {
        self.definers(identifier, kind)
            .map(|definers| definers.exporters.as_slice())
            .unwrap_or_default()
    }

    /// Files that originally define `identifier` as `kind`.
    pub fn original_definers(&self, identifier: &str, kind: ExportKind) -> &[String] {
        self.definers(identifier, kind)
            .map(|definers| definers.originals.as_slice())
            .unwrap_or_default()
    }

    /// Answers "where is X defined": original definers of `identifier`
    /// grouped by kind, skipping kinds nobody originally defines.
    pub fn lookup(&self, identifier: &str) -> Vec<(ExportKind, &[String])> {
        self.symbols
            .get(identifier)
            .into_iter()
            .flat_map(|kinds| kinds.iter())
            .filter(|(_, definers)| !definers.originals.is_empty())
            .map(|(kind, definers)| (*kind, definers.originals.as_slice()))
            .collect()
    }

    /// Iterates over every (identifier, kind, definers) entry in order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, ExportKind, &Definers)> {
        self.symbols.iter().flat_map(|(identifier, kinds)| {
            kinds
                .iter()
                .map(move |(kind, definers)| (identifier.as_str(), *kind, definers))
        })
    }

    /// Iterates over registered identifiers in lexical order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

fn mixin_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"@mixin\s+([a-zA-Z_-][a-zA-Z0-9_-]*)").expect("valid mixin pattern")
    })
}

/// Collects mixin names declared in raw source, in order, without duplicates.
///
/// This is a textual scan rather than an evaluation, so a declaration inside
/// a comment still counts.
///
/// # Example
///
/// ```
/// use stylegraph::analysis::scan_mixins;
///
/// let source = "@mixin focus-outline { outline: 0; }\n@mixin truncate($lines) {}\n";
/// assert_eq!(scan_mixins(source), vec!["focus-outline", "truncate"]);
/// ```
pub fn scan_mixins(source: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for name in mixin_pattern()
        .captures_iter(source)
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str())
    {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Incrementally resolves file exports against a registry.
#[derive(Debug, Default)]
pub struct ExportResolver {
    registry: ExportRegistry,
}

impl ExportResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populates `node.exports` from its declared symbols and mixin scan.
    ///
    /// Symbols are taken in the order variables, functions, mixins. Each
    /// (identifier, kind) is recorded at most once per file.
    pub fn resolve_file(&mut self, node: &mut FileNode, symbols: &ModuleSymbols, source: &str) {
        let declared = symbols
            .variables
            .iter()
            .map(|name| (name.as_str(), ExportKind::Variable))
            .chain(
                symbols
                    .functions
                    .iter()
                    .map(|name| (name.as_str(), ExportKind::Function)),
            )
            .chain(
                scan_mixins(source)
                    .into_iter()
                    .map(|name| (name, ExportKind::Mixin)),
            );

        for (identifier, kind) in declared {
            if node.export(identifier, kind).is_some() {
                continue;
            }

            let from = self
                .registry
                .exporters(identifier, kind)
                .iter()
                .find(|exporter| node.imports_file(exporter))
                .cloned();

            let record = match from {
                Some(from) => ExportRecord::reexport(identifier, kind, from),
                None => ExportRecord::original(identifier, kind),
            };
            self.registry.record(&node.id, &record);
            node.exports.push(record);
        }
    }

    pub fn registry(&self) -> &ExportRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> ExportRegistry {
        self.registry
    }
}

/// Resolves exports for every file in `order`, returning the registry.
///
/// # Errors
///
/// Any introspection or read failure aborts the whole resolution.
pub fn resolve_exports<I>(
    graph: &mut StyleGraph,
    order: &[String],
    introspector: &I,
) -> Result<ExportRegistry, IntrospectError>
where
    I: ModuleIntrospector + ?Sized,
{
    resolve_exports_with(graph, order, introspector, |_, _| Ok(()))
}

/// Like [`resolve_exports`], calling `visit` on each file after its exports
/// are resolved, with the symbols the introspector reported for it.
pub fn resolve_exports_with<I, E, F>(
    graph: &mut StyleGraph,
    order: &[String],
    introspector: &I,
    mut visit: F,
) -> Result<ExportRegistry, E>
where
    I: ModuleIntrospector + ?Sized,
    E: From<IntrospectError>,
    F: FnMut(&mut FileNode, &ModuleSymbols) -> Result<(), E>,
{
    let mut resolver = ExportResolver::new();
    let total = order.len();

    for (done, id) in order.iter().enumerate() {
        let Some(node) = graph.get_mut(id) else {
            continue;
        };

        info!("Collecting exports from: {}", node.filepath.display());
        let symbols = introspector.introspect(&node.filepath)?;
        let source = fs::read_to_string(&node.filepath).map_err(|source| {
            IntrospectError::Read {
                path: node.filepath.clone(),
                source,
            }
        })?;

        resolver.resolve_file(node, &symbols, &source);
        visit(node, &symbols)?;

        debug!("{:.0}% complete", (done + 1) as f64 / total as f64 * 100.0);
    }

    Ok(resolver.into_registry())
}
