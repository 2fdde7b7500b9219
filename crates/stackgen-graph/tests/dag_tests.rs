use stackgen_graph::{logical_id, EdgeKind, GraphBuilder, GraphError, NodeId, NodeKind};
use proptest::prelude::*;
use std::collections::HashSet;

fn flat_builder(count: usize) -> (GraphBuilder, Vec<NodeId>) {
    let mut builder = GraphBuilder::new("Stack").unwrap();
    let root = builder.tree().root();
    let nodes = (0..count)
        .map(|i| {
            builder
                .add_node(root, &format!("N{i}"), NodeKind::Resource)
                .unwrap()
        })
        .collect();
    (builder, nodes)
}

proptest! {
    #[test]
    fn prop_accepted_edges_stay_acyclic(
        node_count in 1..20usize,
        edges in proptest::collection::vec((0..20usize, 0..20usize), 0..50)
    ) {
        let (mut builder, nodes) = flat_builder(node_count);
        let mut accepted = Vec::new();

        for (a, b) in edges {
            if a < nodes.len() && b < nodes.len() {
                match builder.add_dependency(nodes[a], nodes[b], EdgeKind::Explicit) {
                    Ok(()) => accepted.push((nodes[b], nodes[a])),
                    Err(GraphError::SelfLoop(_) | GraphError::CycleDetected(_)) => {}
                    Err(other) => prop_assert!(false, "unexpected error {other}"),
                }
            }
        }

        let validated = builder.validate().unwrap();
        let order = validated.deployment_order();
        prop_assert_eq!(order.len(), node_count);

        let position = |n: NodeId| order.iter().position(|x| *x == n).unwrap();
        for (before, after) in accepted {
            prop_assert!(position(before) < position(after));
        }
    }

    #[test]
    fn prop_logical_ids_unique_per_path(
        paths in proptest::collection::hash_set(
            proptest::collection::vec("[A-Za-z][A-Za-z0-9]{0,6}", 1..4),
            1..30
        )
    ) {
        prop_assume!(paths.iter().flatten().all(|c| c != "Default"));

        let mut seen = HashSet::new();
        for path in &paths {
            let id = logical_id(path.as_slice()).unwrap();
            prop_assert!(seen.insert(id.clone()), "duplicate logical id {}", id);
        }
    }

    #[test]
    fn prop_logical_id_deterministic(
        path in proptest::collection::vec("[A-Za-z0-9-]{1,8}", 1..5)
    ) {
        prop_assert_eq!(logical_id(path.as_slice()), logical_id(path.clone().as_slice()));
    }
}

#[test]
fn test_rejects_simple_cycle() {
    let (mut builder, n) = flat_builder(3);

    builder.add_dependency(n[1], n[0], EdgeKind::Explicit).unwrap();
    builder.add_dependency(n[2], n[1], EdgeKind::Explicit).unwrap();

    // n0 after n2 would close the loop
    assert!(builder.add_dependency(n[0], n[2], EdgeKind::Explicit).is_err());
}

#[test]
fn test_reference_edge_never_downgrades_explicit() {
    let (mut builder, n) = flat_builder(2);

    builder.add_dependency(n[1], n[0], EdgeKind::Explicit).unwrap();
    builder.add_dependency(n[1], n[0], EdgeKind::Reference).unwrap();

    assert_eq!(
        builder.declared().edge_kind(n[0], n[1]),
        Some(EdgeKind::Explicit)
    );
    let validated = builder.validate().unwrap();
    assert!(validated.explicit_dependencies(n[1]).contains(&n[0]));
}

#[test]
fn test_entry_and_exit_nodes() {
    let (mut builder, n) = flat_builder(3);
    builder.add_dependency(n[1], n[0], EdgeKind::Explicit).unwrap();
    builder.add_dependency(n[2], n[1], EdgeKind::Explicit).unwrap();

    let dag = builder.declared();
    assert_eq!(dag.entry_nodes(), vec![n[0]]);
    assert_eq!(dag.exit_nodes(), vec![n[2]]);
    assert_eq!(dag.topological_sort().unwrap(), vec![n[0], n[1], n[2]]);
}
