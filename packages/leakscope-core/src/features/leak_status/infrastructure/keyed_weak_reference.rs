//! Watched objects
//!
//! An object watcher wraps every object expected to be collected soon in a
//! `KeyedWeakReference`. A reference still holding its referent after the
//! watcher gave up marks that referent as retained.

use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::features::heap_graph::{GraphResult, HeapGraph, HeapInstance, ObjectId};
use crate::features::leak_status::domain::ObjectReporter;
use crate::features::leak_status::ports::ObjectInspector;

const KEYED_WEAK_REFERENCE_CLASSES: [&str; 2] = [
    "leakcanary.KeyedWeakReference",
    "com.squareup.leakcanary.KeyedWeakReference",
];

/// Decoded `KeyedWeakReference` instance
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedWeakReferenceMirror {
    pub reference_id: ObjectId,
    pub referent_id: Option<ObjectId>,
    pub key: Option<String>,
    pub description: Option<String>,
    pub watch_uptime_millis: Option<i64>,
    /// -1 while the object is not yet considered retained
    pub retained_uptime_millis: Option<i64>,
}

impl KeyedWeakReferenceMirror {
    fn from_instance(graph: &dyn HeapGraph, instance: &HeapInstance) -> GraphResult<Self> {
        let string_field = |name: &str| -> GraphResult<Option<String>> {
            match instance.field_named(name).and_then(|v| v.as_object_id()) {
                Some(id) => graph.read_string(id),
                None => Ok(None),
            }
        };
        let description = match string_field("description")? {
            Some(description) => Some(description),
            None => string_field("name")?,
        };
        Ok(Self {
            reference_id: instance.object_id,
            referent_id: instance.field_named("referent").and_then(|v| v.as_object_id()),
            key: string_field("key")?,
            description,
            watch_uptime_millis: instance.field_named("watchUptimeMillis").and_then(|v| v.as_long()),
            retained_uptime_millis: instance
                .field_named("retainedUptimeMillis")
                .and_then(|v| v.as_long()),
        })
    }

    /// Older watchers did not record retention and retained everything
    pub fn is_retained(&self) -> bool {
        self.retained_uptime_millis.map_or(true, |millis| millis != -1)
    }

    pub fn has_referent(&self) -> bool {
        self.referent_id.is_some()
    }
}

/// Every keyed weak reference in the heap
pub fn find_keyed_weak_references(graph: &dyn HeapGraph) -> GraphResult<Vec<KeyedWeakReferenceMirror>> {
    let mut mirrors = Vec::new();
    for class_name in KEYED_WEAK_REFERENCE_CLASSES {
        let Some(class) = graph.find_class_by_name(class_name)? else {
            continue;
        };
        for id in graph.instance_ids_of(class.object_id)? {
            let Some(object) = graph.find_object_by_id(id)? else {
                continue;
            };
            if let Some(instance) = object.as_instance() {
                mirrors.push(KeyedWeakReferenceMirror::from_instance(graph, instance)?);
            }
        }
    }
    Ok(mirrors)
}

/// Marks referents of retained keyed weak references as leaking
///
/// The reference table is read on first use, so one instance serves one heap.
#[derive(Default)]
pub struct KeyedWeakReferenceInspector {
    watched: OnceCell<FxHashMap<ObjectId, KeyedWeakReferenceMirror>>,
}

impl KeyedWeakReferenceInspector {
    pub fn new() -> Self {
        Self::default()
    }

    fn watched(&self, graph: &dyn HeapGraph) -> GraphResult<&FxHashMap<ObjectId, KeyedWeakReferenceMirror>> {
        self.watched.get_or_try_init(|| {
            Ok(find_keyed_weak_references(graph)?
                .into_iter()
                .filter(|mirror| mirror.is_retained())
                .filter_map(|mirror| mirror.referent_id.map(|id| (id, mirror)))
                .collect())
        })
    }
}

impl ObjectInspector for KeyedWeakReferenceInspector {
    fn inspect(&self, graph: &dyn HeapGraph, reporter: &mut ObjectReporter) -> Result<()> {
        let Some(mirror) = self.watched(graph)?.get(&reporter.object_id()) else {
            return Ok(());
        };
        let reason = match &mirror.description {
            Some(description) if !description.is_empty() => {
                format!("ObjectWatcher was watching this because {}", description)
            }
            _ => "ObjectWatcher was watching this".to_string(),
        };
        reporter.add_leaking_reason(reason);
        if let Some(key) = &mirror.key {
            reporter.add_label(format!("key = {}", key));
        }
        if let (Some(watched), Some(retained)) = (mirror.watch_uptime_millis, mirror.retained_uptime_millis) {
            if retained >= watched {
                reporter.add_label(format!("retainedDurationMillis = {}", retained - watched));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "keyed_weak_reference"
    }
}
