//! Graph module for stylesheet import relationships.
//!
//! This module resolves `@import` references to files, discovers the import
//! graph breadth-first from a root stylesheet, and orders it so that every
//! file comes after the files it imports.
//!
//! # Example
//!
//! ```rust
//! use stylegraph::graph::{FileNode, StyleGraph};
//!
//! let mut graph = StyleGraph::new();
//! let mut styles = FileNode::new("styles.scss", "/src/styles.scss");
//! styles.add_import("_tokens.scss");
//! graph.add_file(styles);
//! graph.add_file(FileNode::new("_tokens.scss", "/src/_tokens.scss"));
//! graph.link_imports();
//!
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! ```

pub mod builder;
mod node;
pub mod resolver;
mod style_graph;
mod topo;

pub use builder::{unreachable_stylesheets, BuildOutput, GraphBuilder, GraphError};
pub use node::{ExportKind, ExportRecord, FileNode, UnresolvedImport};
pub use style_graph::{CycleInfo, StyleGraph};
pub use topo::{order, CycleEdge, TopologicalOrder};
