//! Relation set to graph conversion.

use std::collections::HashSet;

use super::{Graph, Node, Relation};
use crate::registry;

/// Convert a flat relation set into a graph, highlighting `current_object_id`.
///
/// One node per distinct object id in first-discovery order, one link per
/// relation. Links are not deduplicated here; merging into a live graph does that.
pub fn transform(relations: &[Relation], current_object_id: &str) -> Graph {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut graph = Graph::default();

    for relation in relations {
        let endpoints = [
            (
                relation.object_id.as_str(),
                relation.object_type.as_str(),
                relation.object_display_id.as_str(),
            ),
            (
                relation.related_object_id.as_str(),
                relation.related_object_type.as_str(),
                relation.related_object_display_id.as_str(),
            ),
        ];

        for (object_id, object_type, display_id) in endpoints {
            if seen.insert(object_id) {
                graph.nodes.push(build_node(object_id, object_type, display_id, current_object_id));
            }
        }

        graph.links.push(relation.link());
    }

    graph
}

fn build_node(object_id: &str, object_type: &str, display_id: &str, current_object_id: &str) -> Node {
    if registry::lookup(object_type).is_none() {
        log::debug!("Unmapped object type {} for {}, using fallback label", object_type, object_id);
    }

    Node {
        id: object_id.to_string(),
        object_id: object_id.to_string(),
        object_type: object_type.to_string(),
        object_display_id: display_id.to_string(),
        label: format!("{} {}", registry::display_name(object_type), display_id),
        icon: registry::icon(object_type).to_string(),
        status: registry::status(object_type),
        is_current: object_id == current_object_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Link, Role};
    use crate::registry::NodeStatus;

    fn rel(from: (&str, &str), role: Role, to: (&str, &str)) -> Relation {
        Relation::new((from.0, from.1, "100"), role, (to.0, to.1, "200"))
    }

    #[test]
    fn test_single_successor() {
        let graph = transform(&[rel(("A", "64"), Role::Successor, ("B", "72"))], "A");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.links, vec![Link::new("A", "B")]);
        assert!(graph.nodes[0].is_current);
        assert!(!graph.nodes[1].is_current);
        assert_eq!(graph.nodes[0].label, "Lead 100");
        assert_eq!(graph.nodes[1].label, "Opportunity 200");
        assert_eq!(graph.nodes[1].status, NodeStatus::Success);

        let leaves = graph.leaf_ids();
        assert!(!leaves.contains("A"));
        assert!(leaves.contains("B"));
    }

    #[test]
    fn test_predecessor_reverses_edge() {
        let graph = transform(&[rel(("A", "72"), Role::Predecessor, ("L", "64"))], "A");
        assert_eq!(graph.links, vec![Link::new("L", "A")]);
        // current is independent of direction
        assert!(graph.node("A").unwrap().is_current);
    }

    #[test]
    fn test_nodes_unique_in_discovery_order() {
        let relations = vec![
            rel(("B", "72"), Role::Predecessor, ("A", "64")),
            rel(("B", "72"), Role::Successor, ("C", "30")),
            rel(("B", "72"), Role::Successor, ("D", "12")),
            rel(("C", "30"), Role::Predecessor, ("B", "72")),
        ];
        let graph = transform(&relations, "B");
        let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A", "C", "D"]);
        assert_eq!(graph.links.len(), 4);
    }

    #[test]
    fn test_duplicate_pair_yields_two_links() {
        let relations = vec![
            rel(("A", "64"), Role::Successor, ("B", "72")),
            rel(("B", "72"), Role::Predecessor, ("A", "64")),
        ];
        let graph = transform(&relations, "A");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.links, vec![Link::new("A", "B"), Link::new("A", "B")]);
    }

    #[test]
    fn test_unknown_type_fallback() {
        let graph = transform(&[rel(("A", "64"), Role::Successor, ("X", "4711"))], "");
        let x = graph.node("X").unwrap();
        assert_eq!(x.label, "Type 4711 200");
        assert_eq!(x.icon, "document");
        assert_eq!(x.status, NodeStatus::Neutral);
        assert!(graph.nodes.iter().all(|n| !n.is_current));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let relations = vec![
            rel(("A", "64"), Role::Successor, ("B", "72")),
            rel(("B", "72"), Role::Successor, ("C", "30")),
            rel(("D", "12"), Role::Predecessor, ("B", "72")),
        ];
        assert_eq!(transform(&relations, "B"), transform(&relations, "B"));
    }

    #[test]
    fn test_empty_relations() {
        let graph = transform(&[], "A");
        assert!(graph.nodes.is_empty());
        assert!(graph.links.is_empty());
    }
}
