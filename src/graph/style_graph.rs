//! Stylesheet import graph implementation using petgraph.
//!
//! Provides a directed graph keyed by file id, with nodes kept in
//! insertion order (the order the builder discovered them in), edges
//! pointing from an importing file to the file it imports, and cycle
//! detection for reporting.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use super::node::FileNode;

/// A directed graph of stylesheet files.
///
/// Each node owns its [`FileNode`], whose `imports` list is the source of
/// truth for edges. Call [`StyleGraph::link_imports`] after all nodes are
/// added to mirror those lists as graph edges.
///
/// # Example
///
/// ```rust
/// use stylegraph::graph::{FileNode, StyleGraph};
///
/// let mut graph = StyleGraph::new();
///
/// let mut styles = FileNode::new("styles.scss", "/src/styles.scss");
/// styles.add_import("_colors.scss");
/// graph.add_file(styles);
/// graph.add_file(FileNode::new("_colors.scss", "/src/_colors.scss"));
/// graph.link_imports();
///
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 1);
/// assert_eq!(graph.dependents("_colors.scss"), vec!["styles.scss"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StyleGraph {
    /// The underlying directed graph
    graph: DiGraph<FileNode, ()>,
    /// Maps file ids to their node indices for O(1) lookup
    node_indices: HashMap<String, NodeIndex>,
}

impl StyleGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new graph with pre-allocated capacity.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(nodes, edges),
            node_indices: HashMap::with_capacity(nodes),
        }
    }

    /// Adds a file to the graph.
    ///
    /// If a file with the same id already exists, returns its existing
    /// index and leaves the stored node untouched.
    pub fn add_file(&mut self, node: FileNode) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(&node.id) {
            return idx;
        }

        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_indices.insert(id, idx);
        idx
    }

    /// Adds an edge between two files that are both in the graph.
    ///
    /// # Returns
    ///
    /// `true` if the edge was added, `false` if either file doesn't exist
    /// or the edge is already present.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let (Some(&from_idx), Some(&to_idx)) = (self.node_indices.get(from), self.node_indices.get(to))
        else {
            return false;
        };
        if self.graph.contains_edge(from_idx, to_idx) {
            return false;
        }

        self.graph.add_edge(from_idx, to_idx, ());
        true
    }

    /// Mirrors every node's `imports` list as graph edges.
    ///
    /// Imports naming ids that are not in the graph are ignored.
    ///
    /// # Returns
    ///
    /// The number of edges added.
    pub fn link_imports(&mut self) -> usize {
        let pairs: Vec<(String, String)> = self
            .graph
            .node_weights()
            .flat_map(|node| {
                node.imports
                    .iter()
                    .map(move |import| (node.id.clone(), import.clone()))
            })
            .collect();

        pairs
            .iter()
            .filter(|(from, to)| self.add_edge(from, to))
            .count()
    }

    /// Gets a file by id.
    pub fn get(&self, id: &str) -> Option<&FileNode> {
        self.node_indices
            .get(id)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Gets a mutable reference to a file by id.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut FileNode> {
        let idx = *self.node_indices.get(id)?;
        self.graph.node_weight_mut(idx)
    }

    /// Returns the node index for a file id.
    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.node_indices.get(id).copied()
    }

    /// Checks if a file exists in the graph.
    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Iterates over files in insertion order.
    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.graph.node_weights()
    }

    /// Iterates over file ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(|node| node.id.as_str())
    }

    /// Returns the ids of files that import `id`, in insertion order.
    pub fn dependents(&self, id: &str) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(id) else {
            return Vec::new();
        };

        let mut dependents: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| edge.source())
            .collect();
        dependents.sort();

        dependents
            .into_iter()
            .filter_map(|source| self.graph.node_weight(source))
            .map(|node| node.id.as_str())
            .collect()
    }

    /// Detects and returns all import cycles.
    ///
    /// Uses Tarjan's algorithm to find strongly connected components. Each
    /// cycle lists its member files in discovery order, along with the
    /// shortest chain of real imports that leads from the first member back
    /// to itself.
    pub fn detect_cycles(&self) -> Vec<CycleInfo> {
        let mut cycles: Vec<CycleInfo> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || (scc.len() == 1 && self.graph.contains_edge(scc[0], scc[0]))
            })
            .map(|mut scc| {
                scc.sort();
                let members: HashSet<NodeIndex> = scc.iter().copied().collect();
                let path = self.shortest_cycle(scc[0], &members);
                CycleInfo {
                    nodes: self.ids_of(&scc),
                    path: self.ids_of(&path),
                }
            })
            .collect();

        cycles.sort_by(|a, b| {
            let first = |cycle: &CycleInfo| cycle.nodes.first().and_then(|id| self.index_of(id));
            first(a).cmp(&first(b))
        });
        cycles
    }

    /// Breadth-first search along imports inside `members`, from `start`
    /// until an edge leads back to it.
    fn shortest_cycle(&self, start: NodeIndex, members: &HashSet<NodeIndex>) -> Vec<NodeIndex> {
        let mut parents: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(idx) = queue.pop_front() {
            let mut targets: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(idx, Direction::Outgoing)
                .filter(|target| members.contains(target))
                .collect();
            targets.sort();
            targets.dedup();

            for target in targets {
                if target == start {
                    let mut path = vec![idx];
                    let mut current = idx;
                    while let Some(&parent) = parents.get(&current) {
                        path.push(parent);
                        current = parent;
                    }
                    path.reverse();
                    return path;
                }
                if !parents.contains_key(&target) {
                    parents.insert(target, idx);
                    queue.push_back(target);
                }
            }
        }

        vec![start]
    }

    fn ids_of(&self, indices: &[NodeIndex]) -> Vec<String> {
        indices
            .iter()
            .filter_map(|&idx| self.graph.node_weight(idx))
            .map(|node| node.id.clone())
            .collect()
    }

    /// Returns the number of files in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of import edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Checks if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

/// Information about a detected import cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleInfo {
    /// The file ids in the strongly connected group, in discovery order
    pub nodes: Vec<String>,
    /// An import chain through the group; the last file imports the first
    pub path: Vec<String>,
}

impl CycleInfo {
    /// Returns a formatted string representation of the cycle path.
    ///
    /// For example: "a.scss -> b.scss -> a.scss"
    pub fn cycle_path(&self) -> String {
        let Some(first) = self.path.first() else {
            return String::new();
        };
        format!("{} -> {}", self.path.join(" -> "), first)
    }

    /// Returns the number of files in the cycle.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the cycle is empty (should not happen in practice).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Serializes as a single object keyed by file id, in insertion order.
impl Serialize for StyleGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.node_count()))?;
        for node in self.files() {
            map.serialize_entry(&node.id, node)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StyleGraph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GraphVisitor;

        impl<'de> Visitor<'de> for GraphVisitor {
            type Value = StyleGraph;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object keyed by stylesheet id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<StyleGraph, A::Error> {
                let mut graph = StyleGraph::with_capacity(access.size_hint().unwrap_or(0), 0);
                while let Some((key, mut node)) = access.next_entry::<String, FileNode>()? {
                    if node.id.is_empty() {
                        node.id = key;
                    }
                    graph.add_file(node);
                }
                graph.link_imports();
                Ok(graph)
            }
        }

        deserializer.deserialize_map(GraphVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(id: &str, imports: &[&str]) -> FileNode {
        let mut node = FileNode::new(id, format!("/src/{}", id));
        for import in imports {
            node.add_import(*import);
        }
        node
    }

    fn graph_of(files: &[(&str, &[&str])]) -> StyleGraph {
        let mut graph = StyleGraph::new();
        for (id, imports) in files {
            graph.add_file(file(id, imports));
        }
        graph.link_imports();
        graph
    }

    #[test]
    fn test_new_graph_is_empty() {
        let graph = StyleGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_add_file_keeps_first() {
        let mut graph = StyleGraph::new();
        let first = graph.add_file(file("a.scss", &["b.scss"]));
        let second = graph.add_file(file("a.scss", &[]));
        assert_eq!(first, second);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.get("a.scss").unwrap().imports, vec!["b.scss"]);
    }

    #[test]
    fn test_add_edge_requires_both_nodes() {
        let mut graph = graph_of(&[("a.scss", &[]), ("b.scss", &[])]);
        assert!(graph.add_edge("a.scss", "b.scss"));
        assert!(!graph.add_edge("a.scss", "b.scss"));
        assert!(!graph.add_edge("a.scss", "missing.scss"));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_link_imports_ignores_unknown_ids() {
        let graph = graph_of(&[("a.scss", &["b.scss", "ghost.scss"]), ("b.scss", &[])]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_files_in_insertion_order() {
        let graph = graph_of(&[("z.scss", &[]), ("a.scss", &[]), ("m.scss", &[])]);
        let ids: Vec<&str> = graph.ids().collect();
        assert_eq!(ids, vec!["z.scss", "a.scss", "m.scss"]);
    }

    #[test]
    fn test_dependents() {
        let graph = graph_of(&[
            ("styles.scss", &["_a.scss", "_b.scss"]),
            ("_a.scss", &["_b.scss"]),
            ("_b.scss", &[]),
        ]);
        assert_eq!(graph.dependents("_b.scss"), vec!["styles.scss", "_a.scss"]);
        assert!(graph.dependents("styles.scss").is_empty());
        assert!(graph.dependents("missing.scss").is_empty());
    }

    #[test]
    fn test_detect_cycles() {
        let graph = graph_of(&[
            ("a.scss", &["b.scss"]),
            ("b.scss", &["c.scss"]),
            ("c.scss", &["a.scss"]),
            ("d.scss", &["d.scss"]),
            ("e.scss", &[]),
        ]);
        let cycles = graph.detect_cycles();
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].nodes, vec!["a.scss", "b.scss", "c.scss"]);
        assert_eq!(cycles[0].cycle_path(), "a.scss -> b.scss -> c.scss -> a.scss");
        assert_eq!(cycles[1].cycle_path(), "d.scss -> d.scss");
    }

    #[test]
    fn test_cycle_path_follows_imports() {
        let graph = graph_of(&[
            ("a.scss", &["b.scss", "c.scss"]),
            ("b.scss", &["c.scss"]),
            ("c.scss", &["a.scss"]),
        ]);
        let cycles = graph.detect_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].nodes, vec!["a.scss", "b.scss", "c.scss"]);
        // c does not import b, so the chain goes straight from a to c.
        assert_eq!(cycles[0].path, vec!["a.scss", "c.scss"]);
        assert_eq!(cycles[0].cycle_path(), "a.scss -> c.scss -> a.scss");
    }

    #[test]
    fn test_no_cycles() {
        let graph = graph_of(&[("a.scss", &["b.scss"]), ("b.scss", &[])]);
        assert!(graph.detect_cycles().is_empty());
    }

    #[test]
    fn test_cycle_info_path() {
        let ids = vec!["a.scss".to_string(), "b.scss".to_string()];
        let cycle = CycleInfo {
            nodes: ids.clone(),
            path: ids,
        };
        assert_eq!(cycle.cycle_path(), "a.scss -> b.scss -> a.scss");
        assert_eq!(cycle.len(), 2);
        let empty = CycleInfo {
            nodes: vec![],
            path: vec![],
        };
        assert!(empty.cycle_path().is_empty());
    }

    #[test]
    fn test_serialization_keeps_insertion_order() {
        let graph = graph_of(&[("z.scss", &["a.scss"]), ("a.scss", &[])]);
        let json = serde_json::to_string(&graph).unwrap();
        let z = json.find("\"z.scss\":").unwrap();
        let a = json.find("\"a.scss\":").unwrap();
        assert!(z < a);

        let loaded: StyleGraph = serde_json::from_str(&json).unwrap();
        let ids: Vec<&str> = loaded.ids().collect();
        assert_eq!(ids, vec!["z.scss", "a.scss"]);
        assert_eq!(loaded.edge_count(), 1);
        assert_eq!(loaded.get("z.scss"), graph.get("z.scss"));
    }
}
