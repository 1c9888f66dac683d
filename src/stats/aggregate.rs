//! Distribution summaries of per-file statistics.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::css::StyleStats;
use crate::graph::StyleGraph;

/// A tracked numeric metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Column {
    Size,
    GzipSize,
    Rules,
    Selectors,
    Declarations,
    MediaQueries,
    AverageSpecificity,
}

impl Column {
    /// All columns, in report order.
    pub const ALL: [Column; 7] = [
        Column::Size,
        Column::GzipSize,
        Column::Rules,
        Column::Selectors,
        Column::Declarations,
        Column::MediaQueries,
        Column::AverageSpecificity,
    ];

    /// Stable key, as used on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            Column::Size => "size",
            Column::GzipSize => "gzipSize",
            Column::Rules => "rules",
            Column::Selectors => "selectors",
            Column::Declarations => "declarations",
            Column::MediaQueries => "mediaQueries",
            Column::AverageSpecificity => "averageSpecificity",
        }
    }

    /// Human-friendly name.
    pub fn label(&self) -> &'static str {
        match self {
            Column::Size => "Size",
            Column::GzipSize => "Size (gzip)",
            Column::Rules => "Rules",
            Column::Selectors => "Selectors",
            Column::Declarations => "Declarations",
            Column::MediaQueries => "Media queries",
            Column::AverageSpecificity => "Average specificity",
        }
    }

    /// Extracts this column's value from a measurement.
    pub fn value(&self, stats: &StyleStats) -> f64 {
        match self {
            Column::Size => stats.size as f64,
            Column::GzipSize => stats.gzip_size as f64,
            Column::Rules => stats.rules.total as f64,
            Column::Selectors => stats.selectors.total as f64,
            Column::Declarations => stats.declarations.total as f64,
            Column::MediaQueries => stats.media_queries.total as f64,
            Column::AverageSpecificity => stats.selectors.specificity.average,
        }
    }

    /// Formats this column's value for display.
    ///
    /// Sizes use the humanized strings when present.
    pub fn display_value(&self, stats: &StyleStats) -> String {
        match self {
            Column::Size if !stats.humanized_size.is_empty() => stats.humanized_size.clone(),
            Column::GzipSize if !stats.humanized_gzip_size.is_empty() => {
                stats.humanized_gzip_size.clone()
            }
            _ => format_number(self.value(stats)),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|column| column.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let keys: Vec<&str> = Column::ALL.iter().map(Column::key).collect();
                format!("Unknown column: {}. Use one of: {}", s, keys.join(", "))
            })
    }
}

/// How the median value is picked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MedianMode {
    /// Sort values by their decimal text, as existing reports do.
    /// For multi-digit values this is not the statistical median.
    #[default]
    Lexicographic,
    /// Sort values numerically.
    Numeric,
}

/// How far a value sits from the column median, in standard deviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviationBand {
    Within1,
    Above1Below2,
    Above2,
    Below1Above2,
    Below2,
}

impl DeviationBand {
    /// Classifies a z-score.
    pub fn classify(z: f64) -> Option<Self> {
        if z.is_nan() {
            None
        } else if z.abs() <= 1.0 {
            Some(DeviationBand::Within1)
        } else if z >= 2.0 {
            Some(DeviationBand::Above2)
        } else if z > 1.0 {
            Some(DeviationBand::Above1Below2)
        } else if z <= -2.0 {
            Some(DeviationBand::Below2)
        } else {
            Some(DeviationBand::Below1Above2)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviationBand::Within1 => "within-1",
            DeviationBand::Above1Below2 => "above-1-below-2",
            DeviationBand::Above2 => "above-2",
            DeviationBand::Below1Above2 => "below-1-above-2",
            DeviationBand::Below2 => "below-2",
        }
    }
}

impl Serialize for DeviationBand {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl fmt::Display for DeviationBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Values and summary of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsColumn {
    pub column: Column,
    /// Contributing file ids, parallel to `values`
    pub files: Vec<String>,
    pub values: Vec<f64>,
    pub mean: f64,
    /// `None` when no file contributed
    pub median: Option<f64>,
    /// Population standard deviation
    pub standard_deviation: f64,
}

impl StatisticsColumn {
    fn new(column: Column, files: Vec<String>, values: Vec<f64>, mode: MedianMode) -> Self {
        let count = values.len();
        let (mean, standard_deviation) = if count == 0 {
            (0.0, 0.0)
        } else {
            let mean = values.iter().sum::<f64>() / count as f64;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
            (mean, variance.sqrt())
        };

        Self {
            column,
            median: median(&values, mode),
            files,
            values,
            mean,
            standard_deviation,
        }
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// The file with the highest value; the first one wins ties.
    pub fn largest(&self) -> Option<(&str, f64)> {
        self.extreme(Ordering::Greater)
    }

    /// The file with the lowest value; the first one wins ties.
    pub fn smallest(&self) -> Option<(&str, f64)> {
        self.extreme(Ordering::Less)
    }

    fn extreme(&self, wanted: Ordering) -> Option<(&str, f64)> {
        self.files
            .iter()
            .zip(self.values.iter().copied())
            .fold(None, |best: Option<(&String, f64)>, (file, value)| match best {
                Some((_, best_value)) if value.total_cmp(&best_value) != wanted => best,
                _ => Some((file, value)),
            })
            .map(|(file, value)| (file.as_str(), value))
    }

    /// `(value - median) / standard_deviation`, when both are defined and
    /// the deviation is non-zero.
    pub fn z_score(&self, value: f64) -> Option<f64> {
        let median = self.median?;
        if self.standard_deviation == 0.0 {
            return None;
        }
        Some((value - median) / self.standard_deviation)
    }

    pub fn band(&self, value: f64) -> Option<DeviationBand> {
        self.z_score(value).and_then(DeviationBand::classify)
    }
}

/// Summaries for every column.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub mode: MedianMode,
    columns: Vec<StatisticsColumn>,
}

impl Statistics {
    pub fn get(&self, column: Column) -> Option<&StatisticsColumn> {
        self.columns.iter().find(|entry| entry.column == column)
    }

    /// Columns in report order.
    pub fn columns(&self) -> impl Iterator<Item = &StatisticsColumn> {
        self.columns.iter()
    }

    /// Number of files that contributed values.
    pub fn sample_size(&self) -> usize {
        self.columns.first().map_or(0, StatisticsColumn::count)
    }

    /// Deviation band of `stats` in `column`.
    pub fn band(&self, column: Column, stats: &StyleStats) -> Option<DeviationBand> {
        self.get(column)?.band(column.value(stats))
    }
}

/// Computes column summaries over every measured file in the graph.
///
/// The root file, files without measurements, and structurally empty files
/// do not contribute.
///
/// # Example
///
/// ```
/// use stylegraph::graph::{FileNode, StyleGraph};
/// use stylegraph::stats::{aggregate, Column, MedianMode, StyleStats, Total};
///
/// let mut graph = StyleGraph::new();
/// for (id, rules) in [("a.scss", 1), ("b.scss", 2), ("c.scss", 3)] {
///     let mut node = FileNode::new(id, id);
///     node.stats = Some(StyleStats { rules: Total::new(rules), ..StyleStats::default() });
///     graph.add_file(node);
/// }
///
/// let statistics = aggregate(&graph, None, MedianMode::Lexicographic);
/// let rules = statistics.get(Column::Rules).unwrap();
/// assert_eq!(rules.mean, 2.0);
/// assert_eq!(rules.median, Some(2.0));
/// assert!((rules.standard_deviation - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
/// ```
pub fn aggregate(graph: &StyleGraph, root: Option<&str>, mode: MedianMode) -> Statistics {
    let measured: Vec<(&str, &StyleStats)> = graph
        .files()
        .filter(|node| Some(node.id.as_str()) != root)
        .filter_map(|node| node.stats.as_ref().map(|stats| (node.id.as_str(), stats)))
        .filter(|(_, stats)| !stats.is_structurally_empty())
        .collect();

    let columns = Column::ALL
        .into_iter()
        .map(|column| {
            let files = measured.iter().map(|(id, _)| id.to_string()).collect();
            let values = measured.iter().map(|(_, stats)| column.value(stats)).collect();
            StatisticsColumn::new(column, files, values, mode)
        })
        .collect();

    Statistics { mode, columns }
}

/// Picks the value at index `floor(n / 2)` of the sorted values.
pub fn median(values: &[f64], mode: MedianMode) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    match mode {
        MedianMode::Numeric => sorted.sort_by(f64::total_cmp),
        MedianMode::Lexicographic => sorted.sort_by_cached_key(|value| format_number(*value)),
    }
    sorted.get(sorted.len() / 2).copied()
}

/// Formats a number the way a JSON report shows it: integers without a
/// fractional part.
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}
