//! Leaking object finders

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::features::analysis::ports::LeakingObjectFinder;
use crate::features::heap_graph::{GraphResult, HeapGraph, ObjectId};
use crate::features::leak_status::find_keyed_weak_references;

/// Referents of keyed weak references the watcher considers retained
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyedWeakReferenceFinder;

impl LeakingObjectFinder for KeyedWeakReferenceFinder {
    fn find_leaking_object_ids(&self, graph: &dyn HeapGraph) -> GraphResult<FxHashSet<ObjectId>> {
        let references = find_keyed_weak_references(graph)?;
        let ids: FxHashSet<ObjectId> = references
            .iter()
            .filter(|mirror| mirror.is_retained())
            .filter_map(|mirror| mirror.referent_id)
            .collect();
        debug!(
            keyed_weak_references = references.len(),
            retained = ids.len(),
            "Found retained keyed weak references"
        );
        Ok(ids)
    }
}

/// Every direct instance of the given classes
#[derive(Debug, Clone)]
pub struct ClassInstancesLeakingObjectFinder {
    class_names: Vec<String>,
}

impl ClassInstancesLeakingObjectFinder {
    pub fn new<I, S>(class_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class_names: class_names.into_iter().map(Into::into).collect(),
        }
    }
}

impl LeakingObjectFinder for ClassInstancesLeakingObjectFinder {
    fn find_leaking_object_ids(&self, graph: &dyn HeapGraph) -> GraphResult<FxHashSet<ObjectId>> {
        let mut ids = FxHashSet::default();
        for class_name in &self.class_names {
            match graph.find_class_by_name(class_name)? {
                Some(class) => ids.extend(graph.instance_ids_of(class.object_id)?),
                None => warn!(class = %class_name, "Leaking class not found in heap"),
            }
        }
        Ok(ids)
    }
}

/// A fixed set of ids, for callers that already know the leaking objects
#[derive(Debug, Clone, Default)]
pub struct FixedLeakingObjectFinder {
    ids: FxHashSet<ObjectId>,
}

impl FixedLeakingObjectFinder {
    pub fn new(ids: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }
}

impl LeakingObjectFinder for FixedLeakingObjectFinder {
    fn find_leaking_object_ids(&self, _graph: &dyn HeapGraph) -> GraphResult<FxHashSet<ObjectId>> {
        Ok(self.ids.clone())
    }
}
