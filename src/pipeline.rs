//! End-to-end analysis run.
//!
//! The stages run strictly in sequence and hand their results to each other
//! explicitly: build the graph, order it, resolve exports and measure each
//! file in that order, then aggregate statistics.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::analysis::{
    resolve_exports_with, ExportRegistry, IntrospectError, ModuleIntrospector, SourceIntrospector,
};
use crate::graph::{
    order, unreachable_stylesheets, CycleEdge, CycleInfo, GraphBuilder, GraphError, StyleGraph,
    UnresolvedImport,
};
use crate::report::{self, ReportError};
use crate::stats::{aggregate, CssStats, MedianMode, Statistics, StatsError, StylesheetStats};

/// Fatal errors of an analysis run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Introspect(#[from] IntrospectError),

    #[error("Failed to measure {id}")]
    Stats {
        id: String,
        #[source]
        source: StatsError,
    },

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Graph with exports and statistics filled in
    pub graph: StyleGraph,
    /// Id of the root file
    pub root: String,
    /// Dependency-first visiting order
    pub order: Vec<String>,
    pub registry: ExportRegistry,
    pub statistics: Statistics,
    pub unresolved: Vec<UnresolvedImport>,
    /// Import edges skipped while ordering
    pub cycle_edges: Vec<CycleEdge>,
    /// Strongly connected groups of files
    pub cycles: Vec<CycleInfo>,
    /// Stylesheets under the base directory never reached, when requested
    pub unreachable: Option<Vec<String>>,
}

impl Analysis {
    /// Writes the persisted report.
    pub fn write_report(&self, path: &Path) -> Result<(), PipelineError> {
        report::write_report(path, &self.graph)?;
        info!("Report written to {}", path.display());
        Ok(())
    }
}

/// Configured analysis run.
///
/// # Example
///
/// ```no_run
/// use stylegraph::pipeline::Pipeline;
///
/// let analysis = Pipeline::new("src", "globals/scss/styles.scss").run()?;
/// analysis.write_report("graph.json".as_ref())?;
/// # Ok::<(), stylegraph::pipeline::PipelineError>(())
/// ```
pub struct Pipeline {
    base_dir: PathBuf,
    root: PathBuf,
    median: MedianMode,
    report_unreachable: bool,
    introspector: Box<dyn ModuleIntrospector>,
    stats: Box<dyn StylesheetStats>,
}

impl Pipeline {
    /// Creates a run over `base_dir`, starting at `root` (relative to
    /// `base_dir`), using the built-in collaborators.
    pub fn new(base_dir: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            root: root.into(),
            median: MedianMode::default(),
            report_unreachable: false,
            introspector: Box::new(SourceIntrospector::new()),
            stats: Box::new(CssStats::new()),
        }
    }

    pub fn median(mut self, mode: MedianMode) -> Self {
        self.median = mode;
        self
    }

    pub fn report_unreachable(mut self, enabled: bool) -> Self {
        self.report_unreachable = enabled;
        self
    }

    /// Replaces the module introspector.
    pub fn introspector(mut self, introspector: impl ModuleIntrospector + 'static) -> Self {
        self.introspector = Box::new(introspector);
        self
    }

    /// Replaces the statistics collaborator.
    pub fn stats(mut self, stats: impl StylesheetStats + 'static) -> Self {
        self.stats = Box::new(stats);
        self
    }

    /// Runs every stage.
    ///
    /// # Errors
    ///
    /// Unreadable files, malformed modules and measurement failures abort
    /// the run. Unresolved imports and cycles do not.
    pub fn run(&self) -> Result<Analysis, PipelineError> {
        info!("Building import graph from {}", self.root.display());
        let build = GraphBuilder::new(&self.base_dir).build(&self.root)?;
        let mut graph = build.graph;
        let root = graph.ids().next().unwrap_or_default().to_string();

        let sequence = order(&graph);
        let cycles = graph.detect_cycles();

        let measurer = self.stats.as_ref();
        let registry = resolve_exports_with(
            &mut graph,
            &sequence.order,
            self.introspector.as_ref(),
            |node, symbols| {
                let stats = measurer
                    .measure(&symbols.output)
                    .map_err(|source| PipelineError::Stats {
                        id: node.id.clone(),
                        source,
                    })?;
                node.stats = Some(stats);
                Ok::<(), PipelineError>(())
            },
        )?;

        let statistics = aggregate(&graph, Some(root.as_str()), self.median);

        let unreachable = if self.report_unreachable {
            Some(unreachable_stylesheets(&self.base_dir, &graph)?)
        } else {
            None
        };

        info!(
            "Analyzed {} files, {} exported identifiers",
            graph.node_count(),
            registry.len()
        );

        Ok(Analysis {
            graph,
            root,
            order: sequence.order,
            registry,
            statistics,
            unresolved: build.unresolved,
            cycle_edges: sequence.cycle_edges,
            cycles,
            unreachable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ModuleSymbols;
    use crate::graph::ExportKind;
    use crate::stats::Column;
    use crate::test_utils::{create_tree, design_system};
    use pretty_assertions::assert_eq;

    const ROOT: &str = "globals/scss/styles.scss";

    #[test]
    fn test_run_design_system() {
        let dir = design_system();
        let analysis = Pipeline::new(dir.path(), ROOT).run().unwrap();

        assert_eq!(analysis.root, ROOT);
        assert_eq!(analysis.graph.node_count(), 4);
        assert_eq!(analysis.order.last().map(String::as_str), Some(ROOT));
        assert!(analysis.unresolved.is_empty());
        assert!(analysis.cycles.is_empty());
        assert!(analysis.unreachable.is_none());

        let tokens = analysis.graph.get("globals/scss/_tokens.scss").unwrap();
        assert!(tokens.stats.as_ref().unwrap().is_structurally_empty());

        let button = analysis.graph.get("components/button/_button.scss").unwrap();
        let stats = button.stats.as_ref().unwrap();
        assert_eq!(stats.rules.total, 3);
        assert_eq!(stats.media_queries.total, 1);
        assert_eq!(stats.selectors.specificity.max, 120);

        let sizes = analysis.statistics.get(Column::Size).unwrap();
        assert_eq!(sizes.files, vec!["components/button/_button.scss"]);

        assert_eq!(
            analysis.registry.original_definers("focus-outline", ExportKind::Mixin),
            ["globals/scss/_helpers.scss"]
        );
    }

    #[test]
    fn test_report_is_byte_identical_across_runs() {
        let dir = design_system();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");

        Pipeline::new(dir.path(), ROOT).run().unwrap().write_report(&first).unwrap();
        Pipeline::new(dir.path(), ROOT).run().unwrap().write_report(&second).unwrap();

        assert_eq!(
            std::fs::read_to_string(first).unwrap(),
            std::fs::read_to_string(second).unwrap()
        );
    }

    #[test]
    fn test_unresolved_and_cycles_are_not_fatal() {
        let dir = create_tree(&[
            ("styles.scss", "@import 'a';\n@import 'missing';\n"),
            ("_a.scss", "@import 'b';\n.a { color: red; }\n"),
            ("_b.scss", "@import 'a';\n.b { color: blue; }\n"),
            ("_orphan.scss", ""),
        ]);

        let analysis = Pipeline::new(dir.path(), "styles.scss")
            .report_unreachable(true)
            .run()
            .unwrap();

        assert_eq!(analysis.unresolved.len(), 1);
        assert_eq!(analysis.cycle_edges.len(), 1);
        assert_eq!(analysis.cycles[0].cycle_path(), "_a.scss -> _b.scss -> _a.scss");
        assert_eq!(analysis.unreachable, Some(vec!["_orphan.scss".to_string()]));
        assert_eq!(analysis.statistics.sample_size(), 2);
    }

    #[test]
    fn test_wrapped_components_are_measured() {
        let dir = create_tree(&[
            ("styles.scss", "@import 'button';\n@import 'card';\n"),
            (
                "_button.scss",
                "@include exports('button') {\n  .bx--btn { color: red; }\n  @media (max-width: 600px) {\n    .bx--btn { display: block; }\n  }\n}\n",
            ),
            ("_card.scss", "@each $k in a, b {\n  .card-#{$k} { color: red; }\n}\n"),
        ]);

        let analysis = Pipeline::new(dir.path(), "styles.scss").run().unwrap();

        let button = analysis.graph.get("_button.scss").unwrap();
        let stats = button.stats.as_ref().unwrap();
        assert_eq!(stats.rules.total, 2);
        assert_eq!(stats.media_queries.total, 1);

        let card = analysis.graph.get("_card.scss").unwrap();
        assert!(!card.stats.as_ref().unwrap().is_structurally_empty());
        assert_eq!(analysis.statistics.sample_size(), 2);
    }

    #[test]
    fn test_malformed_module_aborts() {
        let dir = create_tree(&[("styles.scss", "@import 'a';\n"), ("_a.scss", ".a {\n")]);
        let err = Pipeline::new(dir.path(), "styles.scss").run().unwrap_err();
        assert!(matches!(err, PipelineError::Introspect(IntrospectError::Malformed { .. })));
    }

    #[test]
    fn test_missing_root_aborts() {
        let dir = create_tree(&[]);
        let err = Pipeline::new(dir.path(), "styles.scss").run().unwrap_err();
        assert!(matches!(err, PipelineError::Graph(GraphError::Read { .. })));
    }

    struct FixedIntrospector;

    impl ModuleIntrospector for FixedIntrospector {
        fn introspect(&self, _path: &Path) -> Result<ModuleSymbols, IntrospectError> {
            Ok(ModuleSymbols {
                variables: vec!["shared".to_string()],
                functions: Vec::new(),
                output: ".x { color: red; }".to_string(),
            })
        }
    }

    #[test]
    fn test_custom_introspector() {
        let dir = create_tree(&[("styles.scss", "@import 'a';\n"), ("_a.scss", "")]);
        let analysis = Pipeline::new(dir.path(), "styles.scss")
            .introspector(FixedIntrospector)
            .run()
            .unwrap();

        let root = analysis.graph.get("styles.scss").unwrap();
        assert_eq!(root.exports[0].from.as_deref(), Some("_a.scss"));
        assert_eq!(root.stats.as_ref().unwrap().rules.total, 1);
    }
}
