//! Path finder and trie integration tests

mod common;

use std::sync::Arc;

use common::*;
use leakscope_core::features::dominators::Dominator;
use leakscope_core::features::heap_graph::{FieldValue, GcRootKind, HeapGraph};
use leakscope_core::features::path_finding::{
    deduplicate_shortest_paths, PathFinder, PathFindingResults,
};
use leakscope_core::features::reference_reader::{jdk_reference_matchers, ReferenceMatchers};
use leakscope_core::{
    AnalysisError, AnalysisStep, CancellationToken, ObjectId, ReferenceMatcher, ReferencePattern,
};
use pretty_assertions::assert_eq;
use rustc_hash::FxHashSet;

fn find(
    graph: &dyn HeapGraph,
    matchers: &[ReferenceMatcher],
    leaking: &[ObjectId],
    retained: bool,
) -> PathFindingResults {
    let matchers = Arc::new(ReferenceMatchers::new(matchers));
    let leaking: FxHashSet<ObjectId> = leaking.iter().copied().collect();
    PathFinder::new(graph, matchers)
        .unwrap()
        .find_paths_from_gc_roots(&leaking, retained)
        .unwrap()
}

#[test]
fn test_fewest_hops_wins() {
    let fixture = two_routes();
    let results = find(&fixture.graph, &[], &[fixture.target], false);

    let paths = results.shortest_paths();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].object_ids(), vec![fixture.root, fixture.short_hop, fixture.target]);
    assert_eq!(paths[0].root.gc_root.kind, GcRootKind::ThreadBlock);
    assert!(results.dominator_tree.is_none());
}

#[test]
fn test_dominator_tree_is_built_with_retained_sizes() {
    let fixture = two_routes();
    let results = find(&fixture.graph, &[], &[fixture.target], true);

    let tree = results.dominator_tree.expect("retained sizes build a tree");
    assert_eq!(tree.immediate_dominator(fixture.root), Dominator::Root);
    assert_eq!(tree.immediate_dominator(fixture.short_hop), Dominator::Object(fixture.root));
    // Two disjoint routes meet only at the root
    assert_eq!(tree.immediate_dominator(fixture.target), Dominator::Object(fixture.root));
}

#[test]
fn test_unreachable_objects_have_no_path() {
    let mut scenario = HeapScenario::new();
    let class = scenario.class(ACTIVITY_CLASS, 64);
    let orphan = scenario.instance(class);
    let graph = scenario.build();

    let results = find(&graph, &[], &[orphan], false);
    assert!(results.shortest_paths().is_empty());
}

#[test]
fn test_ignored_static_field_is_not_followed() {
    let fixture = single_chain();
    let ignored = ReferenceMatcher::ignored(ReferencePattern::static_field(APP_CLASS, "registry"));
    let results = find(&fixture.graph, &[ignored], &[fixture.activity], false);
    assert!(results.shortest_paths().is_empty());
}

#[test]
fn test_library_leak_reference_is_tagged_on_the_path() {
    let fixture = single_chain();
    let matcher = ReferenceMatcher::library_leak(
        ReferencePattern::instance_field(REGISTRY_CLASS, "activity"),
        "Registry holds activities",
    );
    let results = find(&fixture.graph, &[matcher], &[fixture.activity], false);

    let paths = results.shortest_paths();
    assert_eq!(paths.len(), 1);
    let library_leak = paths[0].first_library_leak().expect("tagged reference");
    assert_eq!(library_leak.description, "Registry holds activities");
    assert!(!paths[0].children[0].reference.is_library_leak());
    assert!(paths[0].children[1].reference.is_library_leak());
}

#[test]
fn test_weak_referents_are_skipped_by_jdk_matchers() {
    let mut scenario = HeapScenario::new();
    let app_class = scenario.class(APP_CLASS, 0);
    let activity_class = scenario.class(ACTIVITY_CLASS, 64);
    let activity = scenario.instance(activity_class);
    let weak_reference_class = scenario.weak_reference_class;
    let reference_class = scenario.reference_class;
    let weak = scenario.instance(weak_reference_class);
    scenario.static_field(app_class, "weak", weak);
    scenario.builder.set_field_declared_by(
        weak,
        reference_class,
        "referent",
        FieldValue::reference(activity),
    );
    scenario.root(GcRootKind::StickyClass, app_class);
    let graph = scenario.build();

    let without = find(&graph, &[], &[activity], false);
    assert_eq!(without.shortest_paths().len(), 1);

    let with_jdk = find(&graph, &jdk_reference_matchers(), &[activity], false);
    assert!(with_jdk.shortest_paths().is_empty());
}

#[test]
fn test_cancellation_stops_the_search() {
    let fixture = two_routes();
    let token = CancellationToken::new();
    token.cancel();
    let leaking: FxHashSet<ObjectId> = [fixture.target].into_iter().collect();
    let result = PathFinder::new(&fixture.graph, Arc::new(ReferenceMatchers::new(&[])))
        .unwrap()
        .with_cancellation(token, 1)
        .find_paths_from_gc_roots(&leaking, false);

    assert!(matches!(
        result,
        Err(AnalysisError::Canceled {
            step: AnalysisStep::FindingPathsToRetainedObjects
        })
    ));
}

#[test]
fn test_dedup_drops_paths_through_other_leaking_objects() {
    let fixture = single_chain();
    let results = find(&fixture.graph, &[], &[fixture.registry, fixture.activity], false);
    assert_eq!(results.shortest_paths().len(), 2);

    let deduplicated = deduplicate_shortest_paths(results.shortest_paths());
    assert_eq!(deduplicated.len(), 1);
    assert_eq!(deduplicated[0].leaking_object_id(), fixture.registry);
}

#[test]
fn test_dedup_keeps_siblings() {
    let fixture = sibling_leaks();
    let results = find(&fixture.graph, &[], &[fixture.activity, fixture.fragment], false);

    let mut leaking: Vec<ObjectId> = deduplicate_shortest_paths(results.shortest_paths())
        .iter()
        .map(|path| path.leaking_object_id())
        .collect();
    leaking.sort_unstable();
    let mut expected = vec![fixture.activity, fixture.fragment];
    expected.sort_unstable();
    assert_eq!(leaking, expected);
}
