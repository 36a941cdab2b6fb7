//! Graph-view session: drives the expansion engine against a relation fetcher.
//!
//! Probes run as spawned tasks and report back over a channel; their results are
//! applied on the session's own thread of control, either opportunistically with
//! [`Session::apply_ready`] or by waiting for all of them with [`Session::settle`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::engine::{
    CollapseOutcome, ExpandOutcome, ExpansionEngine, ExpansionStatus, GraphSnapshot,
    ProbeCompletion, ProbeRequest,
};
use crate::error::{DocflowError, Result};
use crate::fetcher::RelationFetcher;
use crate::graph::{demo, transform};
use crate::navigation::{NavigationCommand, NavigationSink, ViewType};

/// Object the initial graph is pivoted on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub source_id: String,
    pub source_type: String,
}

/// Where the live graph came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphOrigin {
    #[default]
    Empty,
    Live,
    Demo,
}

/// Result of a toggle gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ToggleOutcome {
    Ignored,
    Expanded(ExpandOutcome),
    Collapsed(CollapseOutcome),
}

pub struct Session {
    engine: ExpansionEngine,
    fetcher: Arc<dyn RelationFetcher>,
    sink: Arc<dyn NavigationSink>,
    completions_tx: mpsc::UnboundedSender<ProbeCompletion>,
    completions_rx: mpsc::UnboundedReceiver<ProbeCompletion>,
    in_flight: usize,
    origin: GraphOrigin,
    error_message: Option<String>,
}

impl Session {
    pub fn new(
        fetcher: Arc<dyn RelationFetcher>,
        sink: Arc<dyn NavigationSink>,
        cache_capacity: usize,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            engine: ExpansionEngine::new(cache_capacity),
            fetcher,
            sink,
            completions_tx,
            completions_rx,
            in_flight: 0,
            origin: GraphOrigin::Empty,
            error_message: None,
        }
    }

    /// Build the initial graph: live data pivoted on `source`, or the demo graph
    /// when there is no source or the fetch fails.
    pub async fn load(&mut self, source: Option<SourceRef>) -> GraphOrigin {
        self.error_message = None;

        let Some(source) = source else {
            log::info!("No source id provided, showing demo graph");
            self.initialize_with(demo::demo_graph(), GraphOrigin::Demo);
            return self.origin;
        };

        log::info!(
            "Loading document flow for {} (type {})",
            source.source_id,
            source.source_type
        );
        match self
            .fetcher
            .fetch_relations(&source.source_id, &source.source_type)
            .await
        {
            Ok(set) => {
                let graph = transform(&set.value, &source.source_id);
                self.initialize_with(graph, GraphOrigin::Live);
            }
            Err(e) => {
                log::error!("Error loading document flow: {}", e);
                self.error_message = Some(format!("Failed to load document flow: {}", e));
                self.initialize_with(demo::demo_graph(), GraphOrigin::Demo);
            }
        }
        self.origin
    }

    fn initialize_with(&mut self, graph: crate::graph::Graph, origin: GraphOrigin) {
        // Completions of the previous generation are discarded by the engine.
        let requests = self.engine.initialize(graph);
        self.origin = origin;
        self.dispatch(requests);
    }

    fn dispatch(&mut self, requests: Vec<ProbeRequest>) {
        for request in requests {
            let fetcher = Arc::clone(&self.fetcher);
            let tx = self.completions_tx.clone();
            self.in_flight += 1;
            let (object_id, object_type) = (request.object_id.clone(), request.object_type.clone());
            tokio::spawn(async move {
                let fetch = tokio::spawn(async move {
                    fetcher.fetch_relations(&object_id, &object_type).await
                });
                // Every dispatched request reports back, even when the fetch panics.
                let result = fetch.await.unwrap_or_else(|e| {
                    Err(DocflowError::Fetch(format!("Relation lookup aborted: {}", e)))
                });
                // Receiver only goes away with the session.
                let _ = tx.send(ProbeCompletion { request, result });
            });
        }
    }

    fn apply(&mut self, completion: ProbeCompletion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let node_id = completion.request.node_id.clone();
        let outcome = self.engine.complete_probe(completion);
        log::debug!("Probe for {} finished: {:?}", node_id, outcome);
    }

    /// Apply every probe completion that has already arrived. Never waits.
    pub fn apply_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Wait until no probe is outstanding.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.completions_rx.recv().await {
                Some(completion) => self.apply(completion),
                None => break,
            }
        }
    }

    fn run_deferred(&mut self) {
        let requests = self.engine.run_deferred();
        self.dispatch(requests);
    }

    pub fn expand(&mut self, node_id: &str) -> Result<ExpandOutcome> {
        // A failed expand may still schedule a fresh relation lookup.
        let outcome = self.engine.expand(node_id);
        self.run_deferred();
        outcome
    }

    pub fn collapse(&mut self, node_id: &str) -> Result<CollapseOutcome> {
        let outcome = self.engine.collapse(node_id)?;
        self.run_deferred();
        Ok(outcome)
    }

    /// Expand/collapse toggle as the view sends it; ignored unless the node has more relations.
    pub fn toggle(&mut self, node_id: &str) -> Result<ToggleOutcome> {
        if self.engine.graph().node(node_id).is_none() {
            return Err(DocflowError::NodeNotFound(node_id.to_string()));
        }

        match self.engine.status(node_id) {
            ExpansionStatus::Expanded => self.collapse(node_id).map(ToggleOutcome::Collapsed),
            ExpansionStatus::Expandable => self.expand(node_id).map(ToggleOutcome::Expanded),
            _ => Ok(ToggleOutcome::Ignored),
        }
    }

    /// Send a navigation command for `node_id`. Returns `false` when the node's
    /// type has no routing key and nothing was sent.
    pub fn navigate(&self, node_id: &str, view_type: ViewType) -> Result<bool> {
        let node = self
            .engine
            .graph()
            .node(node_id)
            .ok_or_else(|| DocflowError::NodeNotFound(node_id.to_string()))?;

        match NavigationCommand::for_node(node, view_type) {
            Some(command) => {
                log::debug!("Opening {:?} for {}", view_type, node_id);
                self.sink.notify(command);
                Ok(true)
            }
            None => {
                log::warn!("No routing key found for object type: {}", node.object_type);
                Ok(false)
            }
        }
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.engine.snapshot()
    }

    pub fn engine(&self) -> &ExpansionEngine {
        &self.engine
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn origin(&self) -> GraphOrigin {
        self.origin
    }

    /// User-visible message from the last failed initial load.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}
