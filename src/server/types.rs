use serde::{Deserialize, Serialize};

use crate::engine::{GraphSnapshot, NodeView};
use crate::graph::Link;
use crate::navigation::ViewType;
use crate::session::{GraphOrigin, Session};

/// Body of `POST /graph/load`; both fields optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub source_id: Option<String>,
    pub source_type: Option<String>,
}

/// Body of `POST /nodes/{id}/navigate`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateRequest {
    pub view_type: ViewType,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResponse {
    /// `false` when the node type has no routing key
    pub sent: bool,
}

/// Graph state as served to the view
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphResponse {
    pub origin: GraphOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub in_flight: usize,
    pub nodes: Vec<NodeView>,
    pub links: Vec<Link>,
}

impl GraphResponse {
    pub fn from_session(session: &Session) -> Self {
        let GraphSnapshot { nodes, links } = session.snapshot();
        Self {
            origin: session.origin(),
            error_message: session.error_message().map(str::to_string),
            in_flight: session.in_flight(),
            nodes,
            links,
        }
    }
}
