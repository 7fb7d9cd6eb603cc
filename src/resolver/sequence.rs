//! Dependency-first ordering of a resolved graph.

use std::collections::HashSet;

use super::dependency_graph::DependencyGraph;
use crate::models::ResolvedExtension;

enum Frame<'a> {
    Enter(&'a str),
    Exit(&'a ResolvedExtension),
}

/// Order every extension of `graph` so that each one follows all of its
/// dependencies, with the root last.
///
/// Post-order depth-first traversal from the root, visiting children in
/// declaration order. Keys are marked on entry, so a node reached again
/// (including through a cycle) is emitted only once; inside a cycle the
/// node entered first comes last.
pub fn sequence(graph: &DependencyGraph) -> Vec<ResolvedExtension> {
    let mut order = Vec::with_capacity(graph.len());
    let mut visited: HashSet<&str> = HashSet::with_capacity(graph.len());
    let root_key = graph.root().key();
    let mut stack = vec![Frame::Enter(root_key.as_str())];

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(key) => {
                let Some(node) = graph.get(key) else {
                    continue;
                };
                if !visited.insert(key) {
                    continue;
                }
                stack.push(Frame::Exit(node));
                // Reverse so the first declared dependency is popped first.
                for dep in node.dependencies.iter().rev() {
                    if !visited.contains(dep.as_str()) {
                        stack.push(Frame::Enter(dep.as_str()));
                    }
                }
            }
            Frame::Exit(node) => order.push(node.clone()),
        }
    }

    order
}

/// Ordering for a run that ignores dependencies: the root alone.
pub fn single(root: &ResolvedExtension) -> Vec<ResolvedExtension> {
    let mut root = root.clone();
    root.dependencies.clear();
    vec![root]
}
