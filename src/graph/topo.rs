//! Dependency-first ordering of the import graph.
//!
//! Files are ordered so that each one comes after everything it imports.
//! Cycles do not fail the ordering: an import that leads back to a file
//! still being expanded is treated as satisfied, reported, and skipped.

use serde::Serialize;
use std::fmt;
use tracing::warn;

use super::style_graph::StyleGraph;

/// An import edge skipped because it closes a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleEdge {
    /// The importing file
    pub from: String,
    /// The imported file, which was still being expanded
    pub to: String,
}

impl fmt::Display for CycleEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Output of [`order`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologicalOrder {
    /// Every file id exactly once, dependencies first
    pub order: Vec<String>,
    /// Edges ignored to break cycles, in the order they were found
    pub cycle_edges: Vec<CycleEdge>,
}

impl TopologicalOrder {
    /// Returns true if no cycle was encountered.
    pub fn is_acyclic(&self) -> bool {
        self.cycle_edges.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Orders the graph depth-first, post-order.
///
/// Traversal starts from each file in insertion order and follows each
/// file's `imports` list in order, so repeated runs over the same graph
/// produce the same sequence. An explicit stack replaces recursion, so
/// long import chains cannot overflow the call stack.
///
/// # Example
///
/// ```
/// use stylegraph::graph::{order, FileNode, StyleGraph};
///
/// let mut graph = StyleGraph::new();
/// let mut a = FileNode::new("a.scss", "/src/a.scss");
/// a.add_import("b.scss");
/// let mut b = FileNode::new("b.scss", "/src/b.scss");
/// b.add_import("c.scss");
/// graph.add_file(a);
/// graph.add_file(b);
/// graph.add_file(FileNode::new("c.scss", "/src/c.scss"));
///
/// let sequence = order(&graph);
/// assert_eq!(sequence.order, vec!["c.scss", "b.scss", "a.scss"]);
/// assert!(sequence.is_acyclic());
/// ```
pub fn order(graph: &StyleGraph) -> TopologicalOrder {
    let files: Vec<_> = graph.files().collect();
    let mut marks = vec![Mark::Unvisited; files.len()];
    let mut result = TopologicalOrder {
        order: Vec::with_capacity(files.len()),
        cycle_edges: Vec::new(),
    };

    for start in 0..files.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }

        // (position in `files`, next import to examine)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::InProgress;

        while let Some(frame) = stack.last_mut() {
            let (current, next) = *frame;
            let node = files[current];

            let Some(import) = node.imports.get(next) else {
                marks[current] = Mark::Done;
                result.order.push(node.id.clone());
                stack.pop();
                continue;
            };
            frame.1 += 1;

            // Imports of files outside the graph have no ordering constraint.
            let Some(target) = graph.index_of(import).map(|idx| idx.index()) else {
                continue;
            };

            match marks[target] {
                Mark::Unvisited => {
                    marks[target] = Mark::InProgress;
                    stack.push((target, 0));
                }
                Mark::InProgress => {
                    warn!(from = %node.id, to = %import, "Cycle detected, skipping import");
                    result.cycle_edges.push(CycleEdge {
                        from: node.id.clone(),
                        to: import.clone(),
                    });
                }
                Mark::Done => {}
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FileNode;
    use pretty_assertions::assert_eq;

    fn graph_of(files: &[(&str, &[&str])]) -> StyleGraph {
        let mut graph = StyleGraph::new();
        for (id, imports) in files {
            let mut node = FileNode::new(*id, format!("/src/{}", id));
            for import in *imports {
                node.add_import(*import);
            }
            graph.add_file(node);
        }
        graph.link_imports();
        graph
    }

    fn position(order: &[String], id: &str) -> usize {
        order.iter().position(|entry| entry == id).unwrap()
    }

    #[test]
    fn test_chain_orders_dependencies_first() {
        let graph = graph_of(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        let result = order(&graph);
        assert_eq!(result.order, vec!["c", "b", "a"]);
        assert!(result.is_acyclic());
    }

    #[test]
    fn test_two_node_cycle_terminates() {
        let graph = graph_of(&[("a", &["b"]), ("b", &["a"])]);
        let result = order(&graph);
        assert_eq!(result.order, vec!["b", "a"]);
        assert_eq!(
            result.cycle_edges,
            vec![CycleEdge {
                from: "b".to_string(),
                to: "a".to_string(),
            }]
        );
    }

    #[test]
    fn test_self_import() {
        let graph = graph_of(&[("a", &["a"])]);
        let result = order(&graph);
        assert_eq!(result.order, vec!["a"]);
        assert_eq!(result.cycle_edges.len(), 1);
        assert_eq!(result.cycle_edges[0].to_string(), "a -> a");
    }

    #[test]
    fn test_diamond() {
        let graph = graph_of(&[
            ("root", &["left", "right"]),
            ("left", &["base"]),
            ("right", &["base"]),
            ("base", &[]),
        ]);
        let result = order(&graph);
        assert_eq!(result.order, vec!["base", "left", "right", "root"]);
    }

    #[test]
    fn test_every_node_exactly_once() {
        let graph = graph_of(&[
            ("a", &["b", "c"]),
            ("b", &["c", "d"]),
            ("c", &["a"]),
            ("d", &["d"]),
            ("e", &[]),
        ]);
        let result = order(&graph);

        let mut sorted = result.order.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b", "c", "d", "e"]);
        assert!(position(&result.order, "d") < position(&result.order, "b"));
        assert_eq!(result.cycle_edges.len(), 2);
    }

    #[test]
    fn test_unknown_imports_are_ignored() {
        let graph = graph_of(&[("a", &["ghost"])]);
        let result = order(&graph);
        assert_eq!(result.order, vec!["a"]);
        assert!(result.is_acyclic());
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let ids: Vec<String> = (0..20_000).map(|i| format!("f{}", i)).collect();
        let mut graph = StyleGraph::new();
        for (i, id) in ids.iter().enumerate() {
            let mut node = FileNode::new(id.clone(), format!("/src/{}", id));
            if let Some(next) = ids.get(i + 1) {
                node.add_import(next.clone());
            }
            graph.add_file(node);
        }

        let result = order(&graph);
        assert_eq!(result.order.first().map(String::as_str), Some("f19999"));
        assert_eq!(result.order.last().map(String::as_str), Some("f0"));
    }

    #[test]
    fn test_repeated_runs_match() {
        let graph = graph_of(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &["b"])]);
        assert_eq!(order(&graph), order(&graph));
    }
}
