//! Graph view over a finished set of selections.

use std::collections::{HashMap, HashSet};
use std::fmt;

use feedsolve_core::selection::Selections;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// A selected implementation.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SelectedNode {
    pub interface: String,
    pub id: String,
    pub version: String,
}

impl fmt::Display for SelectedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.interface, self.version)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Dependency,
    Runner,
}

/// Selections as a directed graph: implementations are nodes, dependency
/// and runner references are edges.
pub struct SelectionGraph {
    graph: DiGraph<SelectedNode, EdgeKind>,
    index: HashMap<String, NodeIndex>,
    /// Referenced interfaces that have no selection.
    missing: Vec<String>,
    pub root: Option<NodeIndex>,
}

impl SelectionGraph {
    pub fn from_selections(selections: &Selections) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for sel in &selections.implementations {
            // A duplicate interface keeps its first selection.
            index.entry(sel.interface.clone()).or_insert_with(|| {
                graph.add_node(SelectedNode {
                    interface: sel.interface.clone(),
                    id: sel.id.clone(),
                    version: sel.version.to_string(),
                })
            });
        }

        let mut missing = Vec::new();
        for sel in &selections.implementations {
            let from = index[&sel.interface];
            let mut edges: Vec<(&str, EdgeKind)> = sel
                .dependencies
                .iter()
                .map(|d| (d.interface.as_str(), EdgeKind::Dependency))
                .collect();
            for command in &sel.commands {
                if let Some(runner) = &command.runner {
                    edges.push((runner.interface.as_str(), EdgeKind::Runner));
                }
                edges.extend(
                    command
                        .dependencies
                        .iter()
                        .map(|d| (d.interface.as_str(), EdgeKind::Dependency)),
                );
            }

            for (target, kind) in edges {
                match index.get(target) {
                    Some(&to) => {
                        if !graph.edges(from).any(|e| e.target() == to) {
                            graph.add_edge(from, to, kind);
                        }
                    }
                    None => {
                        if !missing.iter().any(|m| m == target) {
                            missing.push(target.to_string());
                        }
                    }
                }
            }
        }

        let root = index.get(&selections.interface).copied();
        Self {
            graph,
            index,
            missing,
            root,
        }
    }

    pub fn find(&self, interface: &str) -> Option<NodeIndex> {
        self.index.get(interface).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &SelectedNode {
        &self.graph[idx]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Interfaces referenced by some selection but never selected.
    pub fn missing_targets(&self) -> &[String] {
        &self.missing
    }

    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, EdgeKind)> {
        let mut out: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), *e.weight()))
            .collect();
        // petgraph yields edges newest first
        out.reverse();
        out
    }

    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| e.source())
            .collect()
    }

    /// Render the graph as a tree from the root. Repeated subtrees on the same
    /// branch are cut off to keep cycles finite.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let Some(root) = self.root else {
            return output;
        };
        output.push_str(&format!("{}\n", self.graph[root]));

        let mut visited = HashSet::new();
        visited.insert(root);
        let deps = self.dependencies_of(root);
        let count = deps.len();
        for (i, (child, kind)) in deps.into_iter().enumerate() {
            let mut walker = TreeWalker {
                graph: self,
                output: &mut output,
                max_depth,
                visited: &mut visited,
            };
            walker.subtree(child, kind, "", i == count - 1, 1);
        }
        output
    }

    /// The chain of nodes from the root to `interface`.
    pub fn find_path(&self, interface: &str) -> Option<Vec<&SelectedNode>> {
        let root = self.root?;
        let target = self.find(interface)?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(root, target, &mut path, &mut visited) {
            Some(path.iter().map(|&idx| &self.graph[idx]).collect())
        } else {
            None
        }
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for (child, _) in self.dependencies_of(current) {
            if self.dfs_path(child, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }
}

struct TreeWalker<'g, 'o> {
    graph: &'g SelectionGraph,
    output: &'o mut String,
    max_depth: Option<usize>,
    visited: &'o mut HashSet<NodeIndex>,
}

impl TreeWalker<'_, '_> {
    fn subtree(&mut self, idx: NodeIndex, kind: EdgeKind, prefix: &str, is_last: bool, depth: usize) {
        let connector = if is_last { "└── " } else { "├── " };
        let label = match kind {
            EdgeKind::Runner => " (runner)",
            EdgeKind::Dependency => "",
        };
        self.output
            .push_str(&format!("{prefix}{connector}{}{label}\n", self.graph.node(idx)));

        if self.max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        if !self.visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.graph.dependencies_of(idx);
        let count = deps.len();
        for (i, (child, kind)) in deps.into_iter().enumerate() {
            self.subtree(child, kind, &child_prefix, i == count - 1, depth + 1);
        }
        self.visited.remove(&idx);
    }
}
