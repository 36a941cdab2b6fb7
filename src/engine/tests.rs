use super::*;
use crate::graph::Relation;

fn succ(from: &str, to: &str) -> Relation {
    Relation::new((from, "72", from), Role::Successor, (to, "30", to))
}

fn pred(of: &str, from: &str) -> Relation {
    Relation::new((of, "30", of), Role::Predecessor, (from, "72", from))
}

fn ok(request: &ProbeRequest, relations: Vec<Relation>) -> ProbeCompletion {
    ProbeCompletion {
        request: request.clone(),
        result: Ok(RelationSet::from(relations)),
    }
}

fn find<'a>(requests: &'a [ProbeRequest], node_id: &str) -> &'a ProbeRequest {
    requests
        .iter()
        .find(|r| r.node_id == node_id)
        .unwrap_or_else(|| panic!("no probe request for {}", node_id))
}

fn ids(graph: &Graph) -> HashSet<String> {
    graph.nodes.iter().map(|n| n.id.clone()).collect()
}

fn pairs(graph: &Graph) -> HashSet<Link> {
    graph.links.iter().cloned().collect()
}

/// A -> B with B probed and expandable into C and D.
fn expandable_b() -> ExpansionEngine {
    let mut engine = ExpansionEngine::new(16);
    let requests = engine.initialize(transform(&[succ("A", "B")], "A"));
    let outcome = engine.complete_probe(ok(
        find(&requests, "B"),
        vec![succ("B", "C"), succ("B", "D"), pred("B", "A")],
    ));
    assert_eq!(outcome, ProbeOutcome::Expandable { new_successors: 2 });
    engine
}

#[test]
fn test_initialize_probes_only_leaves() {
    let mut engine = ExpansionEngine::new(16);
    let requests = engine.initialize(transform(&[succ("A", "B")], "A"));

    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].node_id, "B");
    assert_eq!(requests[0].object_type, "30");
    assert_eq!(engine.status("A"), ExpansionStatus::Unprobed);
    assert_eq!(engine.status("B"), ExpansionStatus::Checking);
    assert_eq!(engine.graph().nodes.len(), 2);
    assert_eq!(engine.graph().links, vec![Link::new("A", "B")]);
}

#[test]
fn test_repeated_classification_does_not_reprobe() {
    let mut engine = ExpansionEngine::new(16);
    engine.initialize(transform(&[succ("A", "B")], "A"));
    assert!(engine.refresh_leaf_classification().is_empty());
    assert!(engine.refresh_leaf_classification().is_empty());
    assert_eq!(engine.status("A"), ExpansionStatus::Unprobed);
}

#[test]
fn test_predecessor_only_probe_is_not_expandable() {
    let mut engine = ExpansionEngine::new(16);
    let requests = engine.initialize(transform(&[succ("A", "B")], "A"));

    let outcome = engine.complete_probe(ok(&requests[0], vec![pred("B", "A"), pred("B", "Z")]));

    assert_eq!(outcome, ProbeOutcome::NotExpandable);
    assert_eq!(engine.status("B").has_more_relations(), Some(false));
    assert!(!engine.has_cached_subgraph("B"));
}

#[test]
fn test_successor_already_in_graph_is_not_new() {
    let mut engine = ExpansionEngine::new(16);
    let requests = engine.initialize(transform(&[succ("A", "B"), succ("A", "C")], "A"));

    let outcome = engine.complete_probe(ok(find(&requests, "B"), vec![succ("B", "C")]));
    assert_eq!(outcome, ProbeOutcome::NotExpandable);
}

#[test]
fn test_probe_failure_is_terminal() {
    let mut engine = ExpansionEngine::new(16);
    let requests = engine.initialize(transform(&[succ("A", "B")], "A"));

    let outcome = engine.complete_probe(ProbeCompletion {
        request: requests[0].clone(),
        result: Err(DocflowError::Fetch("boom".to_string())),
    });

    assert_eq!(outcome, ProbeOutcome::Failed);
    assert_eq!(engine.status("B"), ExpansionStatus::NotExpandable);
    assert!(matches!(engine.expand("B"), Err(DocflowError::NotExpandable(_))));
}

#[test]
fn test_stale_completion_is_discarded() {
    let mut engine = ExpansionEngine::new(16);
    let old = engine.initialize(transform(&[succ("A", "B")], "A"));
    engine.initialize(transform(&[succ("A", "B")], "A"));

    let outcome = engine.complete_probe(ok(&old[0], vec![succ("B", "C")]));

    assert_eq!(outcome, ProbeOutcome::Stale);
    assert_eq!(engine.status("B"), ExpansionStatus::Checking);
    assert!(!engine.has_cached_subgraph("B"));
}

#[test]
fn test_expand_merges_without_pivot() {
    let mut engine = expandable_b();

    let outcome = engine.expand("B").unwrap();

    assert_eq!(outcome, ExpandOutcome { added_nodes: 2, added_links: 2 });
    let order: Vec<_> = engine.graph().nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(order, vec!["A", "B", "C", "D"]);
    assert_eq!(
        engine.graph().links,
        vec![Link::new("A", "B"), Link::new("B", "C"), Link::new("B", "D")]
    );
    assert_eq!(engine.status("B"), ExpansionStatus::Expanded);
    assert_eq!(
        engine.applied_diff("B").unwrap().added_node_ids,
        vec!["C".to_string(), "D".to_string()]
    );
    assert!(engine.graph().links_are_closed());
}

#[test]
fn test_expand_defers_reclassification() {
    let mut engine = expandable_b();
    engine.expand("B").unwrap();

    assert!(engine.has_deferred());
    let requests = engine.run_deferred();
    let probed: HashSet<_> = requests.iter().map(|r| r.node_id.as_str()).collect();
    assert_eq!(probed, HashSet::from(["C", "D"]));
    assert!(!engine.known_leaf_ids().contains("B"));
    assert!(!engine.has_deferred());
}

#[test]
fn test_expand_rejections() {
    let mut engine = expandable_b();

    assert!(matches!(engine.expand("A"), Err(DocflowError::NotExpandable(_))));
    assert!(matches!(engine.expand("Q"), Err(DocflowError::NodeNotFound(_))));

    engine.expand("B").unwrap();
    let before = engine.graph().clone();
    assert!(matches!(engine.expand("B"), Err(DocflowError::AlreadyExpanded(_))));
    assert_eq!(engine.graph(), &before);
}

#[test]
fn test_evicted_subgraph_aborts_expand_and_reprobes() {
    let mut engine = ExpansionEngine::new(1);
    let requests = engine.initialize(transform(&[succ("A", "B"), succ("A", "E")], "A"));
    engine.complete_probe(ok(find(&requests, "B"), vec![succ("B", "C")]));
    engine.complete_probe(ok(find(&requests, "E"), vec![succ("E", "F")]));

    let before = engine.graph().clone();
    let err = engine.expand("B").unwrap_err();

    assert!(matches!(err, DocflowError::MissingSubgraph(_)));
    assert_eq!(engine.graph(), &before);
    assert_eq!(engine.status("B"), ExpansionStatus::Unprobed);
    assert!(engine.applied_diff("B").is_none());

    let requests = engine.run_deferred();
    assert_eq!(requests.len(), 1);
    assert_eq!(engine.status("B"), ExpansionStatus::Checking);
    engine.complete_probe(ok(&requests[0], vec![succ("B", "C")]));

    assert_eq!(engine.expand("B").unwrap(), ExpandOutcome { added_nodes: 1, added_links: 1 });
}

#[test]
fn test_expanded_subgraph_survives_cache_pressure() {
    let mut engine = ExpansionEngine::new(1);
    let requests = engine.initialize(transform(&[succ("A", "B")], "A"));
    engine.complete_probe(ok(&requests[0], vec![succ("B", "C"), succ("B", "E")]));
    engine.expand("B").unwrap();

    // C and E resolve after B was expanded and compete for the single slot.
    let requests = engine.run_deferred();
    engine.complete_probe(ok(find(&requests, "C"), vec![succ("C", "G")]));
    engine.complete_probe(ok(find(&requests, "E"), vec![succ("E", "H")]));
    assert!(engine.has_cached_subgraph("B"));

    engine.collapse("B").unwrap();
    engine.run_deferred();
    let outcome = engine.expand("B").unwrap();

    assert_eq!(outcome, ExpandOutcome { added_nodes: 2, added_links: 2 });
    assert_eq!(engine.status("B"), ExpansionStatus::Expanded);
}

#[test]
fn test_collapse_restores_graph() {
    let mut engine = expandable_b();
    let original = engine.graph().clone();

    engine.expand("B").unwrap();
    engine.run_deferred();
    let outcome = engine.collapse("B").unwrap();

    assert_eq!(outcome.removed_nodes, 2);
    assert_eq!(outcome.removed_links, 2);
    assert_eq!(ids(engine.graph()), ids(&original));
    assert_eq!(pairs(engine.graph()), pairs(&original));
    assert_eq!(engine.status("B"), ExpansionStatus::Expandable);
    assert!(engine.applied_diff("B").is_none());
    assert!(engine.has_cached_subgraph("B"));
}

#[test]
fn test_expand_collapse_cycle_is_stable() {
    let mut engine = expandable_b();
    let (nodes, links) = (engine.graph().nodes.len(), engine.graph().links.len());

    for _ in 0..2 {
        engine.expand("B").unwrap();
        engine.run_deferred();
        assert_eq!(engine.graph().nodes.len(), 4);
        engine.collapse("B").unwrap();
        engine.run_deferred();
        assert_eq!(engine.graph().nodes.len(), nodes);
        assert_eq!(engine.graph().links.len(), links);
    }
}

#[test]
fn test_collapse_without_diff_only_clears_flag() {
    let mut engine = expandable_b();
    let before = engine.graph().clone();

    let outcome = engine.collapse("A").unwrap();

    assert_eq!(outcome, CollapseOutcome::default());
    assert_eq!(engine.graph(), &before);
}

#[test]
fn test_leaf_again_after_collapse_is_not_reprobed() {
    let mut engine = expandable_b();
    engine.expand("B").unwrap();
    engine.run_deferred();
    engine.collapse("B").unwrap();

    // B is a leaf again but its probe result is already known.
    let requests = engine.run_deferred();
    assert!(requests.iter().all(|r| r.node_id != "B"));
    assert!(engine.known_leaf_ids().contains("B"));
}

#[test]
fn test_collapse_cascades_into_expanded_descendants() {
    let mut engine = expandable_b();
    let original = engine.graph().clone();

    engine.expand("B").unwrap();
    let requests = engine.run_deferred();
    engine.complete_probe(ok(find(&requests, "C"), vec![pred("C", "B"), succ("C", "G")]));
    engine.expand("C").unwrap();
    engine.run_deferred();
    assert_eq!(engine.graph().nodes.len(), 5);

    let outcome = engine.collapse("B").unwrap();

    assert_eq!(outcome.cascaded, 1);
    assert_eq!(outcome.removed_nodes, 3);
    assert_eq!(ids(engine.graph()), ids(&original));
    assert_eq!(pairs(engine.graph()), pairs(&original));
    assert_eq!(engine.status("C"), ExpansionStatus::Expandable);
    assert!(engine.applied_diff("C").is_none());
}

fn shared_successor() -> ExpansionEngine {
    let mut engine = ExpansionEngine::new(16);
    let requests = engine.initialize(transform(&[succ("A", "B"), succ("A", "E")], "A"));
    engine.complete_probe(ok(find(&requests, "B"), vec![succ("B", "C")]));
    engine.complete_probe(ok(find(&requests, "E"), vec![succ("E", "C")]));

    engine.expand("B").unwrap();
    engine.run_deferred();
    // C already present: E contributes only its link
    assert_eq!(engine.expand("E").unwrap(), ExpandOutcome { added_nodes: 0, added_links: 1 });
    engine.run_deferred();
    engine
}

#[test]
fn test_collapse_hides_links_to_shared_nodes() {
    let mut engine = shared_successor();

    engine.collapse("B").unwrap();

    assert!(!engine.graph().contains_node("C"));
    assert_eq!(engine.status("E"), ExpansionStatus::Expanded);
    let snapshot = engine.snapshot();
    let links: HashSet<_> = snapshot.links.into_iter().collect();
    assert_eq!(links, HashSet::from([Link::new("A", "B"), Link::new("A", "E")]));
}

#[test]
fn test_reexpand_reconnects_shared_nodes() {
    let mut engine = shared_successor();
    let expanded = pairs(engine.graph());

    engine.collapse("B").unwrap();
    engine.run_deferred();
    engine.expand("B").unwrap();

    assert_eq!(pairs(engine.graph()), expanded);
    assert!(engine.graph().links_are_closed());
    assert_eq!(engine.status("E"), ExpansionStatus::Expanded);

    engine.collapse("E").unwrap();
    assert_eq!(
        pairs(engine.graph()),
        HashSet::from([Link::new("A", "B"), Link::new("A", "E"), Link::new("B", "C")])
    );
}

#[test]
fn test_snapshot_flags() {
    let mut engine = ExpansionEngine::new(16);
    engine.initialize(transform(&[succ("A", "B")], "A"));

    let snapshot = engine.snapshot();
    let a = &snapshot.nodes[0];
    let b = &snapshot.nodes[1];
    assert!(a.node.is_current);
    assert_eq!(a.has_more_relations, None);
    assert!(!a.is_checking_relations);
    assert!(b.is_checking_relations);

    let json = serde_json::to_value(&snapshot).unwrap();
    let first = &json["nodes"][0];
    assert_eq!(first["objectId"], "A");
    assert_eq!(first["isCurrent"], true);
    assert_eq!(first["isExpanded"], false);
    assert!(first.get("hasMoreRelations").is_none());
    assert_eq!(json["links"][0]["source"], "A");
}

#[test]
fn test_initialize_resets_state() {
    let mut engine = expandable_b();
    engine.expand("B").unwrap();

    let requests = engine.initialize(transform(&[succ("X", "Y")], "X"));

    assert_eq!(requests.len(), 1);
    assert_eq!(engine.status("B"), ExpansionStatus::Unprobed);
    assert!(!engine.has_cached_subgraph("B"));
    assert!(engine.applied_diff("B").is_none());
    assert!(!engine.has_deferred());
}
