//! Arena of resolved extensions.
//!
//! Every extension reachable from the root is stored exactly once, keyed by
//! `publisher.id`. A dependency that is reached again through another path is
//! an edge to the existing node, never a second, partially filled copy.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

use crate::models::ResolvedExtension;

/// Dependency graph of resolved extensions rooted at the requested extension.
///
/// Edges point from a dependent to its dependency. The declaration order of
/// each node's dependencies is kept in [`ResolvedExtension::dependencies`].
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// The underlying directed graph.
    graph: DiGraph<ResolvedExtension, ()>,
    /// Map from extension keys to their graph indices.
    node_map: HashMap<String, NodeIndex>,
    /// Key of the root extension.
    root: String,
}

impl DependencyGraph {
    /// Create a graph holding only `root`.
    pub fn new(mut root: ResolvedExtension) -> Self {
        root.dependencies.clear();
        let key = root.key();
        let mut graph = DiGraph::new();
        let index = graph.add_node(root);
        Self {
            graph,
            node_map: HashMap::from([(key.clone(), index)]),
            root: key,
        }
    }

    /// Add a node if its key isn't present yet.
    ///
    /// Returns `false` (and leaves the graph untouched) for a known key:
    /// the first resolution of an identity wins.
    pub fn insert(&mut self, mut node: ResolvedExtension) -> bool {
        let key = node.key();
        if self.node_map.contains_key(&key) {
            return false;
        }
        node.dependencies.clear();
        let index = self.graph.add_node(node);
        self.node_map.insert(key, index);
        true
    }

    /// Record that `parent` depends on `dependency`.
    ///
    /// Both keys must already be present; duplicate and self edges are
    /// ignored. Returns whether an edge was added.
    pub fn link(&mut self, parent: &str, dependency: &str) -> bool {
        if parent == dependency {
            return false;
        }
        let (Some(&from), Some(&to)) = (self.node_map.get(parent), self.node_map.get(dependency))
        else {
            return false;
        };
        if self.graph.contains_edge(from, to) {
            return false;
        }
        self.graph.add_edge(from, to, ());
        self.graph[from].dependencies.push(dependency.to_string());
        true
    }

    /// The root extension.
    pub fn root(&self) -> &ResolvedExtension {
        &self.graph[self.node_map[&self.root]]
    }

    /// Look up a node by key.
    pub fn get(&self, key: &str) -> Option<&ResolvedExtension> {
        self.node_map.get(key).map(|&index| &self.graph[index])
    }

    /// Whether `key` was resolved.
    pub fn contains(&self, key: &str) -> bool {
        self.node_map.contains_key(key)
    }

    /// Direct dependencies of `key`, in declaration order.
    pub fn direct_dependencies(&self, key: &str) -> Vec<&ResolvedExtension> {
        self.get(key)
            .map(|node| node.dependencies.iter().filter_map(|dep| self.get(dep)).collect())
            .unwrap_or_default()
    }

    /// Number of resolved extensions.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Always false: a graph holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All nodes, in resolution order.
    pub fn nodes(&self) -> impl Iterator<Item = &ResolvedExtension> {
        self.graph.node_weights()
    }

    /// Whether the extensions depend on each other circularly.
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Human-readable dependency tree starting at the root.
    ///
    /// A node already printed higher up is shown once more with a
    /// back-reference marker instead of its subtree.
    pub fn to_tree_string(&self) -> String {
        let mut result = format!("{}\n", self.root());
        let mut visited = HashSet::from([self.root.clone()]);
        let deps = &self.root().dependencies;
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, &mut result, "", i == deps.len() - 1, &mut visited);
        }
        result
    }

    fn build_tree_string(
        &self,
        key: &str,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<String>,
    ) {
        let Some(node) = self.get(key) else {
            return;
        };
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };

        if !visited.insert(key.to_string()) {
            result.push_str(&format!("{prefix}{connector}{node} (see above)\n"));
            return;
        }
        result.push_str(&format!("{prefix}{connector}{node}\n"));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        for (i, dep) in node.dependencies.iter().enumerate() {
            let is_last_child = i == node.dependencies.len() - 1;
            self.build_tree_string(dep, result, &child_prefix, is_last_child, visited);
        }
    }
}
