//! Stylesheet size and complexity statistics.
//!
//! This module provides:
//! - [`CssStats`]: measures emitted CSS (byte and gzip size, rule,
//!   selector, declaration and media query counts, selector specificity)
//! - [`aggregate`]: mean, median and population standard deviation of each
//!   [`Column`] across a graph, skipping the root and structurally empty
//!   files
//!
//! # Example
//!
//! ```rust
//! use stylegraph::stats::{CssStats, StylesheetStats};
//!
//! let stats = CssStats::new().measure("@media print { .a { display: none; } }").unwrap();
//! assert_eq!(stats.media_queries.total, 1);
//! assert_eq!(stats.rules.total, 1);
//! ```

pub mod aggregate;
pub mod css;

pub use aggregate::{
    aggregate, format_number, median, Column, DeviationBand, MedianMode, Statistics,
    StatisticsColumn,
};
pub use css::{
    format_size, specificity, CssStats, SelectorStats, Specificity, StatsError, StyleStats,
    StylesheetStats, Total,
};
