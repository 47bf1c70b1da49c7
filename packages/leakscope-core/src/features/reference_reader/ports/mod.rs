//! Reference Reader Ports

use crate::features::heap_graph::{GraphResult, HeapGraph, HeapObject};

use super::domain::Reference;

/// Produces the outgoing references of a heap object
///
/// Readers may cache per-class data between calls, hence `&mut self`.
/// A reference to a missing object is still returned; the path finder drops
/// it when it fails to resolve the target.
pub trait ReferenceReader {
    fn read(&mut self, graph: &dyn HeapGraph, object: &HeapObject) -> GraphResult<Vec<Reference>>;
}
