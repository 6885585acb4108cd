//! Essential-dependency graph helpers
//!
//! The graph maps each slice key to the keys it depends on. Edges towards
//! keys that are not themselves nodes are ignored here; dangling references
//! are reported by the callers before any ordering happens.

use std::collections::{BTreeMap, BTreeSet};

use super::error::{Result, SetupError};
use super::{Slice, SliceKey};

pub type Graph = BTreeMap<SliceKey, Vec<SliceKey>>;

/// Build the graph formed by the essentials of the given slices
pub fn from_slices<'a>(slices: impl IntoIterator<Item = &'a Slice>) -> Graph {
    slices
        .into_iter()
        .map(|slice| (slice.key(), slice.essential.clone()))
        .collect()
}

/// Find the first essential loop in key order
///
/// Nodes are visited depth-first in key order and edges in declaration
/// order. The returned cycle starts at the node that was revisited, so the
/// same graph always reports the same cycle.
pub fn find_cycle(graph: &Graph) -> Option<Vec<SliceKey>> {
    let mut search = CycleSearch {
        graph,
        done: BTreeSet::new(),
        stack: Vec::new(),
        on_stack: BTreeMap::new(),
    };
    graph.keys().find_map(|node| search.visit(node))
}

struct CycleSearch<'a> {
    graph: &'a Graph,
    done: BTreeSet<&'a SliceKey>,
    stack: Vec<&'a SliceKey>,
    // Position of each stacked node, so the cycle can be sliced off.
    on_stack: BTreeMap<&'a SliceKey, usize>,
}

impl<'a> CycleSearch<'a> {
    fn visit(&mut self, node: &'a SliceKey) -> Option<Vec<SliceKey>> {
        if self.done.contains(node) {
            return None;
        }
        if let Some(&start) = self.on_stack.get(node) {
            return Some(self.stack[start..].iter().map(|key| (*key).clone()).collect());
        }

        self.on_stack.insert(node, self.stack.len());
        self.stack.push(node);

        if let Some(edges) = self.graph.get(node) {
            for next in edges {
                if let Some(cycle) = self.visit(next) {
                    return Some(cycle);
                }
            }
        }

        self.stack.pop();
        self.on_stack.remove(node);
        self.done.insert(node);
        None
    }
}

/// Order nodes so that every node follows all of its dependencies
///
/// Among nodes whose dependencies are all placed, the smallest key goes
/// first.
pub fn topological_order(graph: &Graph) -> Result<Vec<SliceKey>> {
    let mut pending: BTreeMap<&SliceKey, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<&SliceKey, Vec<&SliceKey>> = BTreeMap::new();

    for (node, edges) in graph {
        let deps: BTreeSet<&SliceKey> = edges.iter().filter(|e| graph.contains_key(*e)).collect();
        pending.insert(node, deps.len());
        for dep in deps {
            dependents.entry(dep).or_default().push(node);
        }
    }

    let mut ready: BTreeSet<&SliceKey> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| *node)
        .collect();
    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.clone());
        for dependent in dependents.get(node).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    if order.len() != graph.len() {
        let cycle = find_cycle(graph).unwrap_or_default();
        return Err(SetupError::EssentialLoop { cycle });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> SliceKey {
        s.parse().unwrap()
    }

    fn graph(edges: &[(&str, &[&str])]) -> Graph {
        edges
            .iter()
            .map(|(node, deps)| (key(node), deps.iter().map(|d| key(d)).collect()))
            .collect()
    }

    #[test]
    fn test_no_cycle() {
        let g = graph(&[
            ("pkg.aaa", &["pkg.bbb", "pkg.ccc"]),
            ("pkg.bbb", &["pkg.ccc"]),
            ("pkg.ccc", &[]),
        ]);
        assert_eq!(find_cycle(&g), None);
    }

    #[test]
    fn test_cycle_within_package() {
        let g = graph(&[
            ("mypkg.myslice1", &["mypkg.myslice2"]),
            ("mypkg.myslice2", &["mypkg.myslice3"]),
            ("mypkg.myslice3", &["mypkg.myslice1"]),
        ]);
        assert_eq!(
            find_cycle(&g),
            Some(vec![key("mypkg.myslice1"), key("mypkg.myslice2"), key("mypkg.myslice3")])
        );
    }

    #[test]
    fn test_cycle_starts_at_revisited_node() {
        // aaa leads into the loop but is not part of it.
        let g = graph(&[
            ("pkg.aaa", &["pkg.bbb"]),
            ("pkg.bbb", &["pkg.ccc"]),
            ("pkg.ccc", &["pkg.ddd"]),
            ("pkg.ddd", &["pkg.bbb"]),
        ]);
        assert_eq!(
            find_cycle(&g),
            Some(vec![key("pkg.bbb"), key("pkg.ccc"), key("pkg.ddd")])
        );
    }

    #[test]
    fn test_self_loop() {
        let g = graph(&[("pkg.aaa", &["pkg.aaa"])]);
        assert_eq!(find_cycle(&g), Some(vec![key("pkg.aaa")]));
    }

    #[test]
    fn test_topological_order_breaks_ties_by_key() {
        let g = graph(&[
            ("pkg2.top", &["pkg1.left", "pkg1.right"]),
            ("pkg1.right", &["pkg0.base"]),
            ("pkg1.left", &["pkg0.base"]),
            ("pkg0.base", &[]),
            ("pkg0.zzz", &[]),
        ]);
        let order: Vec<String> = topological_order(&g)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            order,
            vec!["pkg0.base", "pkg0.zzz", "pkg1.left", "pkg1.right", "pkg2.top"]
        );
    }

    #[test]
    fn test_topological_order_dependency_after_dependent_key() {
        // The dependency sorts after its dependent but must still come first.
        let g = graph(&[("aaa.top", &["zzz.base"]), ("zzz.base", &[])]);
        let order = topological_order(&g).unwrap();
        assert_eq!(order, vec![key("zzz.base"), key("aaa.top")]);
    }

    #[test]
    fn test_topological_order_reports_loop() {
        let g = graph(&[("pkg.aaa", &["pkg.bbb"]), ("pkg.bbb", &["pkg.aaa"])]);
        let err = topological_order(&g).unwrap_err();
        assert_eq!(
            err.to_string(),
            "essential loop detected: pkg.aaa, pkg.bbb"
        );
    }
}
