//! Dominator Application Layer - object size functions

mod native_size;
mod shallow_size;

pub use native_size::NativeSizeMapper;
pub use shallow_size::ShallowSizeCalculator;

use rustc_hash::FxHashMap;

use crate::features::dominators::ports::ObjectSizeCalculator;
use crate::features::heap_graph::{GraphResult, HeapGraph, ObjectId};

/// Shallow size plus native allocations credited to the object
pub struct TotalSizeCalculator {
    shallow: ShallowSizeCalculator,
    native_sizes: FxHashMap<ObjectId, u64>,
}

impl TotalSizeCalculator {
    pub fn new(shallow: ShallowSizeCalculator, native_sizes: FxHashMap<ObjectId, u64>) -> Self {
        Self {
            shallow,
            native_sizes,
        }
    }

    pub fn native_size_of(&self, object_id: ObjectId) -> u64 {
        self.native_sizes.get(&object_id).copied().unwrap_or(0)
    }
}

impl ObjectSizeCalculator for TotalSizeCalculator {
    fn size_of(&mut self, graph: &dyn HeapGraph, object_id: ObjectId) -> GraphResult<u64> {
        Ok(self.shallow.size_of(graph, object_id)? + self.native_size_of(object_id))
    }
}
