//! Breadth-first discovery of the stylesheet import graph.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::node::{FileNode, UnresolvedImport};
use super::resolver::{normalize, relative_id, resolve_import, STYLESHEET_EXTENSION};
use super::style_graph::StyleGraph;

/// Errors that abort graph construction.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Failed to read stylesheet {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to determine the current directory")]
    CurrentDir(#[source] std::io::Error),
}

/// Result of a graph build: the graph plus the imports that were dropped.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub graph: StyleGraph,
    pub unresolved: Vec<UnresolvedImport>,
}

fn import_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)@import '(.+)';\r?$").expect("import pattern is a valid regex")
    })
}

/// Extracts `@import '...';` references from a stylesheet, in source order.
///
/// Only the single-quoted form terminated by `;` at the end of a line is
/// recognised.
///
/// # Example
///
/// ```
/// use stylegraph::graph::builder::scan_imports;
///
/// let source = "@import 'globals/colors';\n.a { color: red; }\n@import 'mixins';\n";
/// assert_eq!(scan_imports(source), vec!["globals/colors", "mixins"]);
/// ```
pub fn scan_imports(source: &str) -> Vec<&str> {
    import_pattern()
        .captures_iter(source)
        .filter_map(|captures| captures.get(1))
        .map(|reference| reference.as_str())
        .collect()
}

/// Builds a [`StyleGraph`] by following imports from a root stylesheet.
pub struct GraphBuilder {
    base_dir: PathBuf,
}

impl GraphBuilder {
    /// Creates a builder whose file ids are relative to `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// The directory file ids are relative to.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Traverses the import graph breadth-first starting at `root`.
    ///
    /// A relative `root` is taken relative to the base directory. Each
    /// reachable file is read exactly once. Imports that resolve to no file
    /// are logged, recorded in [`BuildOutput::unresolved`] and dropped.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Read`] if the root or any discovered file
    /// cannot be read.
    pub fn build(&self, root: impl AsRef<Path>) -> Result<BuildOutput, GraphError> {
        let base_dir = absolute(&self.base_dir)?;
        let root = normalize(&base_dir.join(root.as_ref()));

        let mut output = BuildOutput::default();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::from([root]);

        while let Some(path) = queue.pop_front() {
            if !visited.insert(path.clone()) {
                continue;
            }

            let id = relative_id(&base_dir, &path);
            debug!("Visiting {}", id);

            let source = fs::read_to_string(&path).map_err(|source| GraphError::Read {
                path: path.clone(),
                source,
            })?;

            let mut node = FileNode::new(id, path.clone());
            for reference in scan_imports(&source) {
                match resolve_import(reference, &path) {
                    Some(resolved) => {
                        node.add_import(relative_id(&base_dir, &resolved));
                        queue.push_back(resolved);
                    }
                    None => {
                        warn!(reference, importer = %node.id, "Unresolved import");
                        output.unresolved.push(UnresolvedImport {
                            reference: reference.to_string(),
                            importer: node.id.clone(),
                        });
                    }
                }
            }

            output.graph.add_file(node);
        }

        output.graph.link_imports();
        info!(
            "Import graph built: {} files, {} edges",
            output.graph.node_count(),
            output.graph.edge_count()
        );

        Ok(output)
    }
}

/// Lists stylesheets under `base_dir` that are not part of `graph`.
///
/// Returns ids relative to `base_dir`, sorted. Dependency and VCS
/// directories are skipped.
pub fn unreachable_stylesheets(
    base_dir: &Path,
    graph: &StyleGraph,
) -> Result<Vec<String>, GraphError> {
    let base_dir = absolute(base_dir)?;

    let mut unreachable: Vec<String> = WalkDir::new(&base_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored_dir(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry.path().extension().and_then(|ext| ext.to_str()) == Some(STYLESHEET_EXTENSION)
        })
        .map(|entry| relative_id(&base_dir, entry.path()))
        .filter(|id| !graph.contains(id))
        .collect();
    unreachable.sort();

    info!("{} stylesheets not reachable from the root", unreachable.len());
    for id in &unreachable {
        debug!("Unreachable: {}", id);
    }

    Ok(unreachable)
}

fn absolute(path: &Path) -> Result<PathBuf, GraphError> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir().map_err(GraphError::CurrentDir)?;
    Ok(normalize(&cwd.join(path)))
}

fn is_ignored_dir(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }

    let name = entry.file_name().to_string_lossy();
    matches!(name.as_ref(), "node_modules" | ".git" | "dist" | "build" | ".sass-cache")
}
