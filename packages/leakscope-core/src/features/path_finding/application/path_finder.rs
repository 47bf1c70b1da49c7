//! Two-queue breadth-first search from GC roots
//!
//! References matched as library leaks go to a second queue that is only
//! drained once the clean queue is empty, so a clean path always wins over a
//! tainted path of equal or greater length. Each object is visited once.

use std::cmp::Reverse;
use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::errors::{AnalysisError, Result};
use crate::features::analysis::{AnalysisStep, CancellationToken};
use crate::features::dominators::DominatorTreeBuilder;
use crate::features::heap_graph::{GcRoot, GcRootKind, GraphResult, HeapGraph, HeapObject, ObjectId};
use crate::features::path_finding::domain::{
    ChildNode, NodeIndex, PathFindingResults, PathNodeArena, ReferencePathNode, RootNode,
};
use crate::features::reference_reader::{
    MatchOutcome, ReferenceMatchers, ReferenceReader, ReferenceReaderChain,
};

/// Queue an object currently waits in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Enqueued {
    Clean,
    Tainted,
}

/// Working state of one search
struct SearchState {
    arena: PathNodeArena,
    to_visit: VecDeque<NodeIndex>,
    to_visit_last: VecDeque<NodeIndex>,
    enqueued: FxHashMap<ObjectId, Enqueued>,
    visited: FxHashSet<ObjectId>,
    dominators: Option<DominatorTreeBuilder>,
}

impl SearchState {
    fn new(compute_retained_heap_size: bool) -> Self {
        Self {
            arena: PathNodeArena::new(),
            to_visit: VecDeque::new(),
            to_visit_last: VecDeque::new(),
            enqueued: FxHashMap::default(),
            visited: FxHashSet::default(),
            dominators: compute_retained_heap_size.then(DominatorTreeBuilder::new),
        }
    }

    /// Enqueue a node unless its object was visited or already waits in a
    /// queue at least as good
    fn enqueue(&mut self, node: ReferencePathNode, tainted: bool) {
        let object_id = node.object_id();
        if self.visited.contains(&object_id) {
            return;
        }
        match (self.enqueued.get(&object_id), tainted) {
            (Some(Enqueued::Clean), _) => return,
            (Some(Enqueued::Tainted), true) => return,
            // A clean path upgrades a tainted one; the stale tainted node is
            // skipped at dequeue because the object is visited by then
            (Some(Enqueued::Tainted), false) | (None, _) => {}
        }
        let index = self.arena.push(node);
        if tainted {
            self.enqueued.insert(object_id, Enqueued::Tainted);
            self.to_visit_last.push_back(index);
        } else {
            self.enqueued.insert(object_id, Enqueued::Clean);
            self.to_visit.push_back(index);
        }
    }

    /// Next node to expand and whether it came from the tainted queue
    fn poll(&mut self) -> Option<(NodeIndex, bool)> {
        if let Some(index) = self.to_visit.pop_front() {
            return Some((index, false));
        }
        self.to_visit_last.pop_front().map(|index| (index, true))
    }
}

/// Breadth-first search over the reference graph
pub struct PathFinder<'g> {
    graph: &'g dyn HeapGraph,
    reader: ReferenceReaderChain,
    cancellation: CancellationToken,
    cancellation_check_interval: u32,
}

impl<'g> PathFinder<'g> {
    pub fn new(graph: &'g dyn HeapGraph, matchers: Arc<ReferenceMatchers>) -> GraphResult<Self> {
        Ok(Self {
            graph,
            reader: ReferenceReaderChain::new(graph, matchers)?,
            cancellation: CancellationToken::new(),
            cancellation_check_interval: 1,
        })
    }

    /// Poll `token` every `interval` dequeued objects
    pub fn with_cancellation(mut self, token: CancellationToken, interval: u32) -> Self {
        self.cancellation = token;
        self.cancellation_check_interval = interval.max(1);
        self
    }

    /// Find the shortest path to every reachable leaking object
    ///
    /// Without retained sizes the search stops as soon as every leaking object
    /// has been reached. With retained sizes it runs until both queues are
    /// empty so that every edge of the reachable graph is recorded.
    pub fn find_paths_from_gc_roots(
        &mut self,
        leaking_object_ids: &FxHashSet<ObjectId>,
        compute_retained_heap_size: bool,
    ) -> Result<PathFindingResults> {
        let mut state = SearchState::new(compute_retained_heap_size);
        let root_count = self.enqueue_gc_roots(&mut state, compute_retained_heap_size)?;
        debug!(roots = root_count, targets = leaking_object_ids.len(), "Enqueued GC roots");

        let mut remaining: FxHashSet<ObjectId> = leaking_object_ids.clone();
        let mut paths_to_leaking_objects = Vec::new();
        let mut dequeued: u64 = 0;
        let interval = u64::from(self.cancellation_check_interval);

        while let Some((index, visiting_last)) = state.poll() {
            if dequeued % interval == 0 && self.cancellation.is_canceled() {
                return Err(AnalysisError::Canceled {
                    step: AnalysisStep::FindingPathsToRetainedObjects,
                });
            }
            dequeued += 1;

            let Some(node) = state.arena.get(index) else {
                continue;
            };
            let object_id = node.object_id();
            if !state.visited.insert(object_id) {
                continue;
            }

            if remaining.remove(&object_id) {
                paths_to_leaking_objects.push(index);
                if remaining.is_empty() && !compute_retained_heap_size {
                    debug!(visited = state.visited.len(), "All leaking objects reached");
                    break;
                }
            }

            let Some(object) = self.graph.find_object_by_id(object_id)? else {
                continue;
            };
            let references = self.reader.read(self.graph, &object)?;
            for reference in references {
                let target_id = reference.target_id;
                let Some(target) = self.graph.find_object_by_id(target_id)? else {
                    continue;
                };
                if let Some(dominators) = state.dominators.as_mut() {
                    dominators.add_edge(object_id, target_id);
                } else if is_leaf(&target) && !leaking_object_ids.contains(&target_id) {
                    continue;
                }
                let tainted = visiting_last || reference.is_library_leak();
                let child = ReferencePathNode::Child(ChildNode {
                    object_id: target_id,
                    parent: index,
                    reference,
                });
                state.enqueue(child, tainted);
            }
        }

        debug!(
            visited = state.visited.len(),
            nodes = state.arena.len(),
            found = paths_to_leaking_objects.len(),
            unreachable = remaining.len(),
            "Path finding done"
        );

        Ok(PathFindingResults {
            arena: state.arena,
            paths_to_leaking_objects,
            dominator_tree: state.dominators.map(DominatorTreeBuilder::build),
        })
    }

    /// Enqueue roots by descending priority, ties broken by class name then id
    fn enqueue_gc_roots(&mut self, state: &mut SearchState, compute_retained_heap_size: bool) -> Result<usize> {
        let mut roots: Vec<(GcRoot, String)> = Vec::new();
        for root in self.graph.gc_roots()? {
            if self.reader.java_local_reader().is_thread_local_root(&root) {
                continue;
            }
            match self.graph.find_object_by_id(root.object_id)? {
                Some(object) => roots.push((root, object.class_name().to_string())),
                None => warn!(
                    object_id = root.object_id,
                    kind = %root.kind,
                    "GC root points at a missing object"
                ),
            }
        }
        roots.sort_by(|(a, a_class), (b, b_class)| {
            (Reverse(a.kind.priority()), a_class, a.object_id)
                .cmp(&(Reverse(b.kind.priority()), b_class, b.object_id))
        });

        let mut enqueued = 0;
        for (root, class_name) in roots {
            let outcome = if root.kind == GcRootKind::JniGlobal {
                self.reader.matchers().match_native_global(&class_name).cloned()
            } else {
                None
            };
            let library_leak = match outcome {
                Some(MatchOutcome::Ignored) => continue,
                Some(MatchOutcome::LibraryLeak(matcher)) => Some(matcher),
                None => None,
            };
            if let Some(dominators) = state.dominators.as_mut() {
                dominators.add_root(root.object_id);
            }
            let tainted = library_leak.is_some();
            state.enqueue(
                ReferencePathNode::Root(RootNode {
                    object_id: root.object_id,
                    gc_root: root,
                    library_leak,
                }),
                tainted,
            );
            enqueued += 1;
        }
        if compute_retained_heap_size {
            debug!("Recording edges for dominator computation");
        }
        Ok(enqueued)
    }
}

/// Objects that cannot hold references
fn is_leaf(object: &HeapObject) -> bool {
    matches!(object, HeapObject::PrimitiveArray(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::heap_graph::{FieldValue, HeapGraphBuilder};
    use crate::features::reference_reader::{ReferenceMatcher, ReferencePattern};

    fn ids(set: &[ObjectId]) -> FxHashSet<ObjectId> {
        set.iter().copied().collect()
    }

    #[test]
    fn test_higher_priority_root_wins_tie() {
        let mut builder = HeapGraphBuilder::new();
        let class = builder.add_class("com.example.Node");
        let via_global = builder.add_instance(class);
        let via_thread = builder.add_instance(class);
        let target = builder.add_instance(class);
        builder.set_field(via_global, "next", FieldValue::reference(target));
        builder.set_field(via_thread, "next", FieldValue::reference(target));
        builder.add_root(GcRootKind::JniGlobal, via_global);
        builder.add_root(GcRootKind::ThreadBlock, via_thread);
        let graph = builder.build().unwrap();

        let mut finder = PathFinder::new(&graph, Arc::new(ReferenceMatchers::default())).unwrap();
        let results = finder.find_paths_from_gc_roots(&ids(&[target]), false).unwrap();
        let paths = results.shortest_paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].root.gc_root.kind, GcRootKind::ThreadBlock);
    }

    #[test]
    fn test_ignored_native_global_root_is_skipped() {
        let mut builder = HeapGraphBuilder::new();
        let class = builder.add_class("com.example.Native");
        let held = builder.add_instance(class);
        builder.add_root(GcRootKind::JniGlobal, held);
        let graph = builder.build().unwrap();

        let matchers = ReferenceMatchers::new(&[ReferenceMatcher::ignored(
            ReferencePattern::native_global_variable("com.example.Native"),
        )]);
        let mut finder = PathFinder::new(&graph, Arc::new(matchers)).unwrap();
        let results = finder.find_paths_from_gc_roots(&ids(&[held]), false).unwrap();
        assert!(results.paths_to_leaking_objects.is_empty());
    }

    #[test]
    fn test_missing_targets_are_dead_ends() {
        let mut builder = HeapGraphBuilder::new();
        let class = builder.add_class("com.example.Node");
        let a = builder.add_instance(class);
        let b = builder.add_instance(class);
        builder.set_field(a, "dangling", FieldValue::reference(9_999));
        builder.set_field(a, "next", FieldValue::reference(b));
        builder.add_root(GcRootKind::StickyClass, a);
        builder.add_root(GcRootKind::JniGlobal, 8_888);
        let graph = builder.build().unwrap();

        let mut finder = PathFinder::new(&graph, Arc::new(ReferenceMatchers::default())).unwrap();
        let results = finder.find_paths_from_gc_roots(&ids(&[b, 9_999]), true).unwrap();
        assert_eq!(results.shortest_paths().len(), 1);
        let tree = results.dominator_tree.unwrap();
        assert_eq!(
            tree.immediate_dominator(9_999),
            crate::features::dominators::Dominator::Unreachable
        );
    }

    #[test]
    fn test_cancellation_aborts_search() {
        let mut builder = HeapGraphBuilder::new();
        let class = builder.add_class("com.example.Node");
        let a = builder.add_instance(class);
        builder.add_root(GcRootKind::StickyClass, a);
        let graph = builder.build().unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let mut finder = PathFinder::new(&graph, Arc::new(ReferenceMatchers::default()))
            .unwrap()
            .with_cancellation(token, 1);
        let err = finder.find_paths_from_gc_roots(&ids(&[a]), false).unwrap_err();
        assert!(err.is_canceled());
    }

    #[test]
    fn test_frame_local_is_reached_through_its_thread() {
        let mut builder = HeapGraphBuilder::new();
        let thread_class = builder.add_class("java.lang.Thread");
        let local_class = builder.add_class("com.example.Local");
        let name = builder.add_string("worker");
        let thread = builder.add_instance(thread_class);
        builder.set_field(thread, "name", FieldValue::reference(name));
        let local = builder.add_instance(local_class);
        builder.add_gc_root(GcRoot::new(GcRootKind::ThreadObject, thread).with_thread(3));
        builder.add_gc_root(GcRoot::new(GcRootKind::JavaFrame, local).with_thread(3));
        let graph = builder.build().unwrap();

        let mut finder = PathFinder::new(&graph, Arc::new(ReferenceMatchers::default())).unwrap();
        let paths = finder
            .find_paths_from_gc_roots(&ids(&[local]), false)
            .unwrap()
            .shortest_paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].root.object_id, thread);
        assert_eq!(paths[0].object_ids(), vec![thread, local]);
    }
}
