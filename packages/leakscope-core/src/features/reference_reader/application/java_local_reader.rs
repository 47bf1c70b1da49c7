//! Stack-frame locals of threads
//!
//! A JavaFrame root that belongs to a thread with a ThreadObject root is not
//! traversed as a root. Its object becomes a LOCAL reference from the thread
//! instance, so paths read "thread → local" instead of starting at an
//! anonymous frame.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::apply_outcome;
use crate::features::heap_graph::{GcRoot, GcRootKind, GraphResult, HeapGraph, HeapInstance, ObjectId};
use crate::features::reference_reader::domain::{Reference, ReferenceLocationType, ReferenceMatchers};

/// Name of a `java.lang.Thread` instance, if it can be decoded
pub fn read_thread_name(graph: &dyn HeapGraph, instance: &HeapInstance) -> GraphResult<Option<String>> {
    match instance.field_named("name").and_then(|v| v.as_object_id()) {
        Some(name_id) => graph.read_string(name_id),
        None => Ok(None),
    }
}

pub struct JavaLocalReader {
    matchers: Arc<ReferenceMatchers>,
    threads_by_serial: FxHashMap<u32, ObjectId>,
    locals_by_thread: FxHashMap<ObjectId, Vec<ObjectId>>,
}

impl JavaLocalReader {
    pub fn new(graph: &dyn HeapGraph, matchers: Arc<ReferenceMatchers>) -> GraphResult<Self> {
        let roots = graph.gc_roots()?;
        let threads_by_serial: FxHashMap<u32, ObjectId> = roots
            .iter()
            .filter(|root| root.kind == GcRootKind::ThreadObject)
            .filter_map(|root| root.thread_serial_number.map(|serial| (serial, root.object_id)))
            .collect();

        let mut locals_by_thread: FxHashMap<ObjectId, Vec<ObjectId>> = FxHashMap::default();
        for root in roots.iter().filter(|root| root.kind == GcRootKind::JavaFrame) {
            let thread = root
                .thread_serial_number
                .and_then(|serial| threads_by_serial.get(&serial));
            if let Some(thread_id) = thread {
                let locals = locals_by_thread.entry(*thread_id).or_default();
                if !locals.contains(&root.object_id) {
                    locals.push(root.object_id);
                }
            }
        }

        Ok(Self {
            matchers,
            threads_by_serial,
            locals_by_thread,
        })
    }

    /// Whether this root is read as a thread local instead of being a root
    pub fn is_thread_local_root(&self, root: &GcRoot) -> bool {
        root.kind == GcRootKind::JavaFrame
            && root
                .thread_serial_number
                .is_some_and(|serial| self.threads_by_serial.contains_key(&serial))
    }

    pub fn thread_count(&self) -> usize {
        self.locals_by_thread.len()
    }

    pub fn read(&self, graph: &dyn HeapGraph, instance: &HeapInstance) -> GraphResult<Vec<Reference>> {
        let Some(locals) = self.locals_by_thread.get(&instance.object_id) else {
            return Ok(Vec::new());
        };
        let thread_name = read_thread_name(graph, instance)?;
        let outcome = thread_name
            .as_deref()
            .and_then(|name| self.matchers.match_java_local(name));
        Ok(locals
            .iter()
            .filter_map(|local| {
                let reference = Reference::new(
                    *local,
                    ReferenceLocationType::Local,
                    "",
                    instance.class_name.clone(),
                );
                apply_outcome(reference, outcome)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::heap_graph::{FieldValue, HeapGraphBuilder};
    use crate::features::reference_reader::domain::{ReferenceMatcher, ReferencePattern};

    fn thread_graph(thread_name: &str) -> (crate::features::heap_graph::InMemoryHeapGraph, ObjectId, ObjectId) {
        let mut builder = HeapGraphBuilder::new();
        let thread_class = builder.add_class("java.lang.Thread");
        let local_class = builder.add_class("com.example.Local");
        let name = builder.add_string(thread_name);
        let thread = builder.add_instance(thread_class);
        builder.set_field(thread, "name", FieldValue::reference(name));
        let local = builder.add_instance(local_class);
        builder.add_gc_root(GcRoot::new(GcRootKind::ThreadObject, thread).with_thread(7));
        builder.add_gc_root(GcRoot::new(GcRootKind::JavaFrame, local).with_thread(7));
        (builder.build().unwrap(), thread, local)
    }

    #[test]
    fn test_frame_root_becomes_local_reference() {
        let (graph, thread, local) = thread_graph("worker");
        let reader = JavaLocalReader::new(&graph, Arc::new(ReferenceMatchers::default())).unwrap();

        let frame_root = GcRoot::new(GcRootKind::JavaFrame, local).with_thread(7);
        assert!(reader.is_thread_local_root(&frame_root));
        assert!(!reader.is_thread_local_root(&GcRoot::new(GcRootKind::JavaFrame, local).with_thread(8)));

        let object = graph.find_object_by_id(thread).unwrap().unwrap();
        let references = reader.read(&graph, object.as_instance().unwrap()).unwrap();
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].target_id, local);
        assert_eq!(references[0].location_type, ReferenceLocationType::Local);
        assert_eq!(references[0].owning_class_name, "java.lang.Thread");
    }

    #[test]
    fn test_ignored_thread_locals_dropped() {
        let (graph, thread, _) = thread_graph("main");
        let matchers = ReferenceMatchers::new(&[ReferenceMatcher::ignored(ReferencePattern::java_local("main"))]);
        let reader = JavaLocalReader::new(&graph, Arc::new(matchers)).unwrap();
        let object = graph.find_object_by_id(thread).unwrap().unwrap();
        assert!(reader.read(&graph, object.as_instance().unwrap()).unwrap().is_empty());
    }
}
