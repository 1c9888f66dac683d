//! Export analysis for stylesheet modules.
//!
//! This module asks a [`ModuleIntrospector`] for the symbols each file
//! declares, scans sources for mixins, and records for every exported symbol
//! whether the file defines it or re-exports it from a direct import.
//!
//! # Features
//!
//! - Built-in [`SourceIntrospector`] for variables, functions and emitted CSS
//! - Textual mixin scan
//! - One-hop `from` provenance for re-exported symbols
//! - [`ExportRegistry`] answering "where is X defined"
//!
//! # Example
//!
//! ```ignore
//! use stylegraph::analysis::{resolve_exports, SourceIntrospector};
//! use stylegraph::graph::{order, GraphBuilder};
//!
//! let mut graph = GraphBuilder::new("src").build("globals/scss/styles.scss")?.graph;
//! let sequence = order(&graph);
//! let registry = resolve_exports(&mut graph, &sequence.order, &SourceIntrospector::new())?;
//!
//! for (kind, files) in registry.lookup("brand") {
//!     println!("{}: {}", kind.display_identifier("brand"), files.join(", "));
//! }
//! ```

pub mod exports;
pub mod introspect;

pub use exports::{
    resolve_exports, resolve_exports_with, scan_mixins, Definers, ExportRegistry, ExportResolver,
};
pub use introspect::{IntrospectError, ModuleIntrospector, ModuleSymbols, SourceIntrospector};
