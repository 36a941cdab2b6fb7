//! Outbound navigation messages for the host application shell.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::graph::Node;
use crate::registry;

/// Which host view to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewType {
    #[serde(rename = "quickview")]
    QuickView,
    #[serde(rename = "list")]
    List,
    #[serde(rename = "quickcreate")]
    QuickCreate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
    pub routing_key: String,
    pub view_type: ViewType,
}

/// `{ operation: "navigation", params: {...} }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationCommand {
    pub operation: String,
    pub params: NavigationParams,
}

impl NavigationCommand {
    /// Command for `node`, or `None` when its type has no routing key.
    /// Only quickview targets a specific object.
    pub fn for_node(node: &Node, view_type: ViewType) -> Option<Self> {
        let routing_key = registry::routing_key(&node.object_type)?;
        let object_key = match view_type {
            ViewType::QuickView => Some(node.object_id.clone()),
            ViewType::List | ViewType::QuickCreate => None,
        };

        Some(Self {
            operation: "navigation".to_string(),
            params: NavigationParams {
                object_key,
                routing_key: routing_key.to_string(),
                view_type,
            },
        })
    }
}

/// Fire-and-forget delivery of navigation commands to the host.
pub trait NavigationSink: Send + Sync {
    fn notify(&self, command: NavigationCommand);
}

/// Writes commands to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NavigationSink for LogSink {
    fn notify(&self, command: NavigationCommand) {
        match serde_json::to_string(&command) {
            Ok(json) => log::info!("navigation: {}", json),
            Err(e) => log::warn!("Failed to encode navigation command: {}", e),
        }
    }
}

/// Publishes commands to every subscriber (e.g. SSE clients).
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<NavigationCommand>,
}

impl BroadcastSink {
    pub fn new(tx: broadcast::Sender<NavigationCommand>) -> Self {
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigationCommand> {
        self.tx.subscribe()
    }
}

impl NavigationSink for BroadcastSink {
    fn notify(&self, command: NavigationCommand) {
        // No subscribers is fine: nobody is listening for host messages.
        if self.tx.send(command).is_err() {
            log::debug!("navigation command dropped: no subscribers");
        }
    }
}
