//! Document flow graph: relation wire types, nodes, links, and the transform
//! from a flat relation set into a deduplicated node/link graph.

pub mod demo;
mod transformer;

pub use transformer::transform;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::registry::NodeStatus;

/// Direction of a relation as reported by the relationship API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// `object -> relatedObject`
    Successor,
    /// `relatedObject -> object`
    Predecessor,
}

/// Audit fields attached to each relation; passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminData {
    pub created_by: String,
    pub created_on: String,
    pub updated_by: String,
    pub updated_on: String,
}

/// A single business-object association returned by the relationship API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    #[serde(default)]
    pub id: String,
    pub object_id: String,
    pub object_type: String,
    pub object_display_id: String,
    pub related_object_id: String,
    pub related_object_type: String,
    pub related_object_display_id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_data: Option<AdminData>,
}

impl Relation {
    /// Build a relation without API metadata.
    pub fn new(
        (object_id, object_type, object_display_id): (&str, &str, &str),
        role: Role,
        (related_object_id, related_object_type, related_object_display_id): (&str, &str, &str),
    ) -> Self {
        Self {
            id: String::new(),
            object_id: object_id.to_string(),
            object_type: object_type.to_string(),
            object_display_id: object_display_id.to_string(),
            related_object_id: related_object_id.to_string(),
            related_object_type: related_object_type.to_string(),
            related_object_display_id: related_object_display_id.to_string(),
            role,
            admin_data: None,
        }
    }

    /// Directed edge this relation produces.
    pub fn link(&self) -> Link {
        match self.role {
            Role::Successor => Link::new(&self.object_id, &self.related_object_id),
            Role::Predecessor => Link::new(&self.related_object_id, &self.object_id),
        }
    }
}

/// Response body of the relationship API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSet {
    #[serde(default)]
    pub value: Vec<Relation>,
}

impl From<Vec<Relation>> for RelationSet {
    fn from(value: Vec<Relation>) -> Self {
        Self { value }
    }
}

/// One business object in the graph. Set once by the transform and never mutated;
/// expansion flags live in the engine's status table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub object_id: String,
    pub object_type: String,
    pub object_display_id: String,
    pub label: String,
    pub icon: String,
    pub status: NodeStatus,
    pub is_current: bool,
}

/// Directed edge between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
}

impl Link {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// Nodes in discovery order plus links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Graph {
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Links whose source and target both exist.
    pub fn closed_links(&self) -> impl Iterator<Item = &Link> + '_ {
        let ids = self.node_ids();
        self.links
            .iter()
            .filter(move |l| ids.contains(l.source.as_str()) && ids.contains(l.target.as_str()))
    }

    /// Nodes with no outgoing link to an existing node.
    pub fn leaf_ids(&self) -> HashSet<String> {
        let with_outgoing: HashSet<&str> = self.closed_links().map(|l| l.source.as_str()).collect();
        self.nodes
            .iter()
            .filter(|n| !with_outgoing.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect()
    }

    /// Every link endpoint refers to an existing node.
    pub fn links_are_closed(&self) -> bool {
        self.closed_links().count() == self.links.len()
    }
}
