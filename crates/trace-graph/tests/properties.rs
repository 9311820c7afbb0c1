use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use trace_graph::{
    descendants, diff, flatten, rebuild, CollaboratorData, EdgeSynthesizer, NodeFilter,
    ViewComposer,
};
use trace_model::{
    ArtifactId, ArtifactKind, ArtifactNode, ConnectionSets, Edge, IdSet, RelationshipSnapshot,
    SnapshotChange, ViewScope,
};

/// Forest with unique ids `N{i}`; every node whose tag is 0 is named `Scope`
struct Forest {
    roots: Vec<ArtifactNode>,
    parent_of: BTreeMap<String, String>,
}

fn build(spec: &[(usize, u8)]) -> Forest {
    let mut children: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut roots = Vec::new();
    let mut parent_of = BTreeMap::new();

    for (i, (pick, _)) in spec.iter().enumerate() {
        if i == 0 || pick % 5 == 0 {
            roots.push(i);
        } else {
            let parent = pick % i;
            children.entry(parent).or_default().push(i);
            parent_of.insert(format!("N{i}"), format!("N{parent}"));
        }
    }

    fn node(i: usize, spec: &[(usize, u8)], children: &BTreeMap<usize, Vec<usize>>) -> ArtifactNode {
        let mut n = ArtifactNode::new(format!("N{i}"), ArtifactKind::Block);
        if spec[i].1 == 0 {
            n = n.with_name("Scope");
        }
        let kids = children.get(&i).map(Vec::as_slice).unwrap_or_default();
        n.with_children(kids.iter().map(|k| node(*k, spec, children)).collect())
    }

    Forest {
        roots: roots.iter().map(|r| node(*r, spec, &children)).collect(),
        parent_of,
    }
}

fn forest_spec() -> impl Strategy<Value = Vec<(usize, u8)>> {
    proptest::collection::vec((any::<usize>(), 0u8..6), 1..40)
}

fn id_set() -> impl Strategy<Value = IdSet> {
    proptest::collection::btree_set("[A-J]", 0..6)
        .prop_map(|s| s.into_iter().map(ArtifactId::new).collect())
}

fn snapshot(version: &str, outgoing: IdSet) -> RelationshipSnapshot {
    RelationshipSnapshot::new("B1", version).with_connections(ConnectionSets {
        outgoing,
        ..ConnectionSets::default()
    })
}

proptest! {
    #[test]
    fn prop_flatten_rebuild_idempotent(spec in forest_spec()) {
        let forest = build(&spec);
        let flat = flatten(&forest.roots).unwrap();
        let all: IdSet = flat.keys().cloned().collect();
        let edges = EdgeSynthesizer::new(NodeFilter::none())
            .synthesize(&forest.roots, &all)
            .unwrap();

        let again = flatten(&rebuild(&flat, &edges).unwrap()).unwrap();
        prop_assert_eq!(again.keys().collect::<Vec<_>>(), flat.keys().collect::<Vec<_>>());
        prop_assert_eq!(again, flat);
    }

    #[test]
    fn prop_synthesized_edges_are_valid(spec in forest_spec()) {
        let forest = build(&spec);
        let synth = EdgeSynthesizer::default();
        let flat = flatten(&forest.roots).unwrap();
        let valid = synth.filter().valid_ids(&flat);

        for edge in synth.synthesize(&forest.roots, &valid).unwrap() {
            prop_assert!(valid.contains(edge.target.as_str()));
            prop_assert_eq!(
                forest.parent_of.get(edge.target.as_str()).map(String::as_str),
                Some(edge.source.as_str())
            );
        }
    }

    #[test]
    fn prop_descendants_closed_and_terminating(
        raw in proptest::collection::vec(("[A-E]", "[A-E]"), 0..30),
        root in "[A-E]",
    ) {
        let edges: Vec<Edge> = raw.iter().map(|(s, t)| Edge::manual(s.as_str(), t.as_str())).collect();
        let reached = descendants(&root, &edges);

        for edge in &edges {
            if edge.source == root.as_str() || reached.contains(edge.source.as_str()) {
                prop_assert!(reached.contains(edge.target.as_str()));
            }
        }
        for id in &reached {
            prop_assert!(edges.iter().any(|e| e.target == *id));
        }
    }

    #[test]
    fn prop_diff_is_set_difference(before in id_set(), after in id_set()) {
        let result = diff(&snapshot("v2", after.clone()), Some(&snapshot("v1", before.clone())));

        let added: IdSet = after.difference(&before).cloned().collect();
        let removed: IdSet = before.difference(&after).cloned().collect();
        prop_assert_eq!(&result.added, &added);
        prop_assert_eq!(&result.removed, &removed);
        prop_assert!(result.added.is_disjoint(&result.removed));
        prop_assert!(result.modified.is_empty());
    }

    #[test]
    fn prop_change_endpoints_always_added(
        base in id_set(),
        source in "[A-F]",
        target in "[A-F]",
    ) {
        let current = snapshot("v2", base.clone())
            .with_change(SnapshotChange::connection(source.as_str(), target.as_str()));
        let result = diff(&current, Some(&snapshot("v1", base)));

        prop_assert!(result.added.contains(source.as_str()));
        prop_assert!(result.added.contains(target.as_str()));
    }

    #[test]
    fn prop_composition_suppressed_for_identical_inputs(spec in forest_spec()) {
        let forest = build(&spec);
        let mut data = CollaboratorData::new();
        data.set_requirements(forest.roots);

        let mut composer = ViewComposer::default();
        let first = composer.compose(&ViewScope::Collapsed, &data).unwrap();
        let second = composer.compose(&ViewScope::Collapsed, &data).unwrap();
        prop_assert!(Arc::ptr_eq(&first, &second));
    }
}

#[test]
fn descendants_of_two_cycle() {
    let edges = vec![Edge::structural("A", "B"), Edge::structural("B", "A")];
    let reached = descendants("A", &edges);
    let ids: Vec<_> = reached.iter().map(ArtifactId::as_str).collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert!(descendants("A", &[]).is_empty());
}

#[test]
fn fresh_composer_recomposes_equal_output() {
    let mut data = CollaboratorData::new();
    data.set_requirements(build(&[(0, 1), (0, 1), (1, 0)]).roots);

    let first = ViewComposer::default().compose(&ViewScope::Collapsed, &data).unwrap();
    let second = ViewComposer::default().compose(&ViewScope::Collapsed, &data).unwrap();
    assert_eq!(*first, *second);
}
