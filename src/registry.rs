//! Static type registry: object type code to display name, icon, status and routing key.

use serde::{Deserialize, Serialize};

/// Visual status of a document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Success,
    Warning,
    Error,
    Neutral,
}

/// Registry entry for one object type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub name: &'static str,
    pub icon: &'static str,
    pub status: NodeStatus,
    /// Host routing key used for navigation.
    pub routing_key: &'static str,
}

/// Icon used for type codes the registry does not know.
pub const FALLBACK_ICON: &str = "document";

const fn entry(
    name: &'static str,
    icon: &'static str,
    status: NodeStatus,
    routing_key: &'static str,
) -> TypeInfo {
    TypeInfo {
        name,
        icon,
        status,
        routing_key,
    }
}

const TYPES: &[(&str, TypeInfo)] = &[
    ("12", entry("Appointment", "appointment", NodeStatus::Neutral, "appointment")),
    ("30", entry("Quote", "sales-quote", NodeStatus::Warning, "sales-quote")),
    ("64", entry("Lead", "leads", NodeStatus::Neutral, "lead")),
    ("72", entry("Opportunity", "opportunity", NodeStatus::Success, "guidedselling")),
    ("80", entry("Sales Order", "sales-order", NodeStatus::Success, "sales-order")),
    ("86", entry("Phone Call", "phone", NodeStatus::Neutral, "phone")),
    ("90", entry("Outbound Delivery", "shipping-status", NodeStatus::Warning, "delivery")),
    ("100", entry("Invoice", "document", NodeStatus::Success, "invoice")),
    ("110", entry("Accounting Doc", "account", NodeStatus::Error, "accounting")),
    ("542", entry("Task", "task", NodeStatus::Neutral, "task")),
    ("2054", entry("Visit", "visits", NodeStatus::Neutral, "visit")),
    ("2059", entry("Sales Order", "sales-order", NodeStatus::Success, "sales-order")),
    ("2886", entry("Case", "customer-and-contacts", NodeStatus::Warning, "case")),
];

/// Look up a type code.
pub fn lookup(code: &str) -> Option<&'static TypeInfo> {
    TYPES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, info)| info)
}

/// Routing key for navigation, if the type is routable.
pub fn routing_key(code: &str) -> Option<&'static str> {
    lookup(code).map(|info| info.routing_key)
}

/// Display name, falling back to `Type {code}` for unknown codes.
pub fn display_name(code: &str) -> String {
    match lookup(code) {
        Some(info) => info.name.to_string(),
        None => format!("Type {}", code),
    }
}

pub fn icon(code: &str) -> &'static str {
    lookup(code).map(|info| info.icon).unwrap_or(FALLBACK_ICON)
}

pub fn status(code: &str) -> NodeStatus {
    lookup(code)
        .map(|info| info.status)
        .unwrap_or(NodeStatus::Neutral)
}
