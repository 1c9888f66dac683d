//! stylegraph - SCSS import graph analyzer
//!
//! This crate maps the `@import` graph of an SCSS code base starting from a
//! root stylesheet, orders it dependencies first, works out which file
//! originally defines each exported variable, function and mixin, and
//! summarizes per-file size and complexity statistics.
//!
//! # Example
//!
//! ```no_run
//! use stylegraph::pipeline::Pipeline;
//!
//! let analysis = Pipeline::new("src", "globals/scss/styles.scss").run()?;
//! println!("{} files", analysis.graph.node_count());
//! # Ok::<(), stylegraph::pipeline::PipelineError>(())
//! ```

pub mod analysis;
pub mod config;
pub mod export;
pub mod graph;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod syntax;

#[cfg(test)]
mod test_utils;
