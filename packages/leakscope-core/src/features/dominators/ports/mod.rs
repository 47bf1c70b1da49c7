//! Dominator Ports

use crate::features::heap_graph::{GraphResult, HeapGraph, ObjectId};

/// Size attributed to a single object when summing retained sizes
pub trait ObjectSizeCalculator {
    fn size_of(&mut self, graph: &dyn HeapGraph, object_id: ObjectId) -> GraphResult<u64>;
}

impl<F> ObjectSizeCalculator for F
where
    F: FnMut(ObjectId) -> u64,
{
    fn size_of(&mut self, _graph: &dyn HeapGraph, object_id: ObjectId) -> GraphResult<u64> {
        Ok(self(object_id))
    }
}
