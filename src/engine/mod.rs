//! Expansion engine: the incremental expand/collapse state machine over a live graph.
//!
//! The engine is synchronous and owns every piece of mutable state: the live graph,
//! the per-node expansion status table, the probe sub-graph cache, the applied-diff
//! records, and the current leaf set. Links owned by an expansion are kept while
//! an endpoint is collapsed away and are left out of snapshots until it returns. Fetching happens elsewhere; the engine hands
//! out [`ProbeRequest`]s and consumes [`ProbeCompletion`]s.

mod diff;

pub use diff::AppliedDiff;

use lru::LruCache;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroUsize;

use crate::error::{DocflowError, Result};
use crate::graph::{transform, Graph, Link, Node, RelationSet, Role};
use diff::Merge;

/// Expansion state of a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpansionStatus {
    #[default]
    Unprobed,
    Checking,
    Expandable,
    NotExpandable,
    Expanded,
}

impl ExpansionStatus {
    /// `None` until a probe has finished.
    pub fn has_more_relations(self) -> Option<bool> {
        match self {
            Self::Expandable | Self::Expanded => Some(true),
            Self::NotExpandable => Some(false),
            Self::Unprobed | Self::Checking => None,
        }
    }
}

/// A relation check the engine wants performed for one leaf node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    /// Engine generation the request belongs to.
    pub generation: u64,
    pub node_id: String,
    pub object_id: String,
    pub object_type: String,
}

/// Result of a [`ProbeRequest`].
#[derive(Debug)]
pub struct ProbeCompletion {
    pub request: ProbeRequest,
    pub result: Result<RelationSet>,
}

/// What a completed probe decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Expandable { new_successors: usize },
    NotExpandable,
    Failed,
    /// The engine was re-initialized after the request was issued.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandOutcome {
    pub added_nodes: usize,
    pub added_links: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollapseOutcome {
    pub removed_nodes: usize,
    pub removed_links: usize,
    /// Expanded descendants collapsed along the way.
    pub cascaded: usize,
}

/// Work scheduled to run once the current mutation is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DeferredTask {
    ReclassifyLeaves,
    /// Look up relations again for a node whose cached sub-graph was evicted.
    Reprobe(String),
}

/// A node as the view sees it: immutable fields plus expansion flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    #[serde(flatten)]
    pub node: Node,
    pub is_expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more_relations: Option<bool>,
    pub is_checking_relations: bool,
}

/// `{nodes, links}` handed to the graph view after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeView>,
    pub links: Vec<Link>,
}

pub struct ExpansionEngine {
    live: Graph,
    statuses: HashMap<String, ExpansionStatus>,
    subgraph_cache: LruCache<String, Graph>,
    /// Sub-graphs of expanded nodes, held outside the LRU until collapse.
    expanded_subgraphs: HashMap<String, Graph>,
    applied_diffs: HashMap<String, AppliedDiff>,
    known_leaf_ids: HashSet<String>,
    deferred: VecDeque<DeferredTask>,
    generation: u64,
}

impl ExpansionEngine {
    /// Create an empty engine whose sub-graph cache holds at most `cache_capacity` entries.
    pub fn new(cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            live: Graph::default(),
            statuses: HashMap::new(),
            subgraph_cache: LruCache::new(capacity),
            expanded_subgraphs: HashMap::new(),
            applied_diffs: HashMap::new(),
            known_leaf_ids: HashSet::new(),
            deferred: VecDeque::new(),
            generation: 0,
        }
    }

    /// Replace the live graph, reset all per-session state, and classify leaves.
    pub fn initialize(&mut self, graph: Graph) -> Vec<ProbeRequest> {
        self.generation += 1;
        self.live = graph;
        self.statuses.clear();
        self.subgraph_cache.clear();
        self.expanded_subgraphs.clear();
        self.applied_diffs.clear();
        self.known_leaf_ids.clear();
        self.deferred.clear();

        log::info!(
            "Graph initialized: {} nodes, {} links (generation {})",
            self.live.nodes.len(),
            self.live.links.len(),
            self.generation
        );

        self.refresh_leaf_classification()
    }

    /// Recompute the leaf set and request probes for nodes that just became leaves
    /// and have never been probed.
    pub fn refresh_leaf_classification(&mut self) -> Vec<ProbeRequest> {
        let leaves = self.live.leaf_ids();

        let entering: Vec<&Node> = self
            .live
            .nodes
            .iter()
            .filter(|n| leaves.contains(&n.id) && !self.known_leaf_ids.contains(&n.id))
            .filter(|n| self.status(&n.id) == ExpansionStatus::Unprobed)
            .collect();

        let requests: Vec<ProbeRequest> = entering
            .into_iter()
            .map(|n| self.probe_request(n))
            .collect();

        for request in &requests {
            self.statuses
                .insert(request.node_id.clone(), ExpansionStatus::Checking);
        }

        self.known_leaf_ids = leaves;
        requests
    }

    fn probe_request(&self, node: &Node) -> ProbeRequest {
        ProbeRequest {
            generation: self.generation,
            node_id: node.id.clone(),
            object_id: node.object_id.clone(),
            object_type: node.object_type.clone(),
        }
    }

    /// Record the result of a probe.
    pub fn complete_probe(&mut self, completion: ProbeCompletion) -> ProbeOutcome {
        let ProbeCompletion { request, result } = completion;

        if request.generation != self.generation {
            log::debug!("Discarding stale probe for {}", request.node_id);
            return ProbeOutcome::Stale;
        }

        let set = match result {
            Ok(set) => set,
            Err(e) => {
                log::warn!("Error checking relations for node {}: {}", request.node_id, e);
                self.statuses
                    .insert(request.node_id, ExpansionStatus::NotExpandable);
                return ProbeOutcome::Failed;
            }
        };

        let present = self.live.node_ids();
        let new_successors = set
            .value
            .iter()
            .filter(|r| r.role == Role::Successor && !present.contains(r.related_object_id.as_str()))
            .count();

        if new_successors == 0 {
            log::debug!("Node {} has no new successor relations", request.node_id);
            self.statuses
                .insert(request.node_id, ExpansionStatus::NotExpandable);
            return ProbeOutcome::NotExpandable;
        }

        log::debug!(
            "Node {} has {} new successor relations",
            request.node_id,
            new_successors
        );
        let subgraph = transform(&set.value, &request.object_id);
        self.subgraph_cache.put(request.node_id.clone(), subgraph);
        self.statuses
            .insert(request.node_id, ExpansionStatus::Expandable);
        ProbeOutcome::Expandable { new_successors }
    }

    /// Merge a node's cached sub-graph into the live graph.
    pub fn expand(&mut self, node_id: &str) -> Result<ExpandOutcome> {
        if !self.live.contains_node(node_id) {
            return Err(DocflowError::NodeNotFound(node_id.to_string()));
        }

        match self.status(node_id) {
            ExpansionStatus::Expandable => {}
            ExpansionStatus::Expanded => {
                return Err(DocflowError::AlreadyExpanded(node_id.to_string()))
            }
            _ => return Err(DocflowError::NotExpandable(node_id.to_string())),
        }

        let Some(cached) = self.subgraph_cache.pop(node_id) else {
            log::error!("No cached data for node: {}", node_id);
            self.statuses
                .insert(node_id.to_string(), ExpansionStatus::Unprobed);
            self.deferred
                .push_back(DeferredTask::Reprobe(node_id.to_string()));
            return Err(DocflowError::MissingSubgraph(node_id.to_string()));
        };
        let merge = Merge::plan(&self.live, node_id, &cached);

        let outcome = ExpandOutcome {
            added_nodes: merge.nodes.len(),
            added_links: merge.links.len(),
        };
        self.applied_diffs.insert(node_id.to_string(), merge.diff());
        merge.apply(&mut self.live);
        self.expanded_subgraphs.insert(node_id.to_string(), cached);
        self.statuses
            .insert(node_id.to_string(), ExpansionStatus::Expanded);
        self.deferred.push_back(DeferredTask::ReclassifyLeaves);

        log::info!(
            "Expanded node {}, added {} nodes and {} links",
            node_id,
            outcome.added_nodes,
            outcome.added_links
        );
        Ok(outcome)
    }

    /// Remove exactly what expanding `node_id` inserted. Links other expansions
    /// added towards removed nodes stay recorded and reappear once the node does.
    pub fn collapse(&mut self, node_id: &str) -> Result<CollapseOutcome> {
        if !self.live.contains_node(node_id) {
            return Err(DocflowError::NodeNotFound(node_id.to_string()));
        }

        let outcome = self.collapse_inner(node_id);
        self.deferred.push_back(DeferredTask::ReclassifyLeaves);

        log::info!(
            "Collapsed node {}, removed {} nodes and {} links",
            node_id,
            outcome.removed_nodes,
            outcome.removed_links
        );
        Ok(outcome)
    }

    fn collapse_inner(&mut self, node_id: &str) -> CollapseOutcome {
        let mut outcome = CollapseOutcome::default();

        let Some(applied) = self.applied_diffs.remove(node_id) else {
            log::debug!("No tracked expansion data for node {}, clearing expanded flag", node_id);
            self.mark_collapsed(node_id);
            return outcome;
        };

        // Nodes about to disappear take their own expansions with them.
        for added in &applied.added_node_ids {
            if self.applied_diffs.contains_key(added) {
                let nested = self.collapse_inner(added);
                outcome.removed_nodes += nested.removed_nodes;
                outcome.removed_links += nested.removed_links;
                outcome.cascaded += nested.cascaded + 1;
            }
        }

        let (nodes, links) = diff::revert(&mut self.live, &applied);
        outcome.removed_nodes += nodes;
        outcome.removed_links += links;
        self.mark_collapsed(node_id);
        outcome
    }

    fn mark_collapsed(&mut self, node_id: &str) {
        if self.status(node_id) == ExpansionStatus::Expanded {
            self.statuses
                .insert(node_id.to_string(), ExpansionStatus::Expandable);
        }
        if let Some(subgraph) = self.expanded_subgraphs.remove(node_id) {
            self.subgraph_cache.put(node_id.to_string(), subgraph);
        }
    }

    /// Run every deferred task, returning the probes they produced.
    pub fn run_deferred(&mut self) -> Vec<ProbeRequest> {
        let mut requests = Vec::new();
        while let Some(task) = self.deferred.pop_front() {
            match task {
                DeferredTask::ReclassifyLeaves => {
                    requests.extend(self.refresh_leaf_classification())
                }
                DeferredTask::Reprobe(node_id) => {
                    if self.status(&node_id) != ExpansionStatus::Unprobed {
                        continue;
                    }
                    let Some(node) = self.live.node(&node_id) else {
                        continue;
                    };
                    let request = self.probe_request(node);
                    self.statuses.insert(node_id, ExpansionStatus::Checking);
                    requests.push(request);
                }
            }
        }
        requests
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    pub fn status(&self, node_id: &str) -> ExpansionStatus {
        self.statuses.get(node_id).copied().unwrap_or_default()
    }

    pub fn graph(&self) -> &Graph {
        &self.live
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn known_leaf_ids(&self) -> &HashSet<String> {
        &self.known_leaf_ids
    }

    pub fn applied_diff(&self, node_id: &str) -> Option<&AppliedDiff> {
        self.applied_diffs.get(node_id)
    }

    /// Whether a probe result is held; does not touch LRU order.
    pub fn has_cached_subgraph(&self, node_id: &str) -> bool {
        self.subgraph_cache.contains(node_id) || self.expanded_subgraphs.contains_key(node_id)
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .live
                .nodes
                .iter()
                .map(|node| {
                    let status = self.status(&node.id);
                    NodeView {
                        node: node.clone(),
                        is_expanded: status == ExpansionStatus::Expanded,
                        has_more_relations: status.has_more_relations(),
                        is_checking_relations: status == ExpansionStatus::Checking,
                    }
                })
                .collect(),
            links: self.live.closed_links().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests;
