//! Applied-diff records: exactly what one expand inserted into the live graph.

use std::collections::HashSet;

use crate::graph::{Graph, Link, Node};

/// Node ids and link pairs inserted by expanding one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedDiff {
    /// In insertion order.
    pub added_node_ids: Vec<String>,
    pub added_links: Vec<Link>,
}

/// Elements of a cached sub-graph that are new to the live graph.
#[derive(Debug, Default)]
pub(super) struct Merge {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Merge {
    /// Everything in `cached` not already in `live`, never including the pivot itself.
    /// Links are unique by `(source, target)` against the live graph and each other.
    pub fn plan(live: &Graph, pivot_id: &str, cached: &Graph) -> Self {
        let existing = live.node_ids();
        let nodes = cached
            .nodes
            .iter()
            .filter(|n| n.id != pivot_id && !existing.contains(n.id.as_str()))
            .cloned()
            .collect();

        let mut known: HashSet<&Link> = live.links.iter().collect();
        let links = cached
            .links
            .iter()
            .filter(|l| known.insert(*l))
            .cloned()
            .collect();

        Self { nodes, links }
    }

    pub fn diff(&self) -> AppliedDiff {
        AppliedDiff {
            added_node_ids: self.nodes.iter().map(|n| n.id.clone()).collect(),
            added_links: self.links.clone(),
        }
    }

    /// Append after the existing elements, keeping sub-graph order.
    pub fn apply(self, live: &mut Graph) {
        live.nodes.extend(self.nodes);
        live.links.extend(self.links);
    }
}

/// Remove the diff's nodes and every link matching one of its pairs.
/// Returns `(nodes_removed, links_removed)`.
pub(super) fn revert(live: &mut Graph, diff: &AppliedDiff) -> (usize, usize) {
    let node_ids: HashSet<&str> = diff.added_node_ids.iter().map(String::as_str).collect();
    let links: HashSet<&Link> = diff.added_links.iter().collect();

    let nodes_before = live.nodes.len();
    let links_before = live.links.len();
    live.nodes.retain(|n| !node_ids.contains(n.id.as_str()));
    live.links.retain(|l| !links.contains(l));

    (nodes_before - live.nodes.len(), links_before - live.links.len())
}
