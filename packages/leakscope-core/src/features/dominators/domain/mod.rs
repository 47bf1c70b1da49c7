//! Dominator domain model

use serde::{Deserialize, Serialize};

use crate::features::heap_graph::ObjectId;

/// Immediate dominator of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dominator {
    /// Only dominated by the virtual root above all GC roots
    Root,
    Object(ObjectId),
    /// Never reached by the traversal
    Unreachable,
}

/// Bytes and objects kept alive by one object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetainedSize {
    pub byte_size: u64,
    pub object_count: u32,
}

impl RetainedSize {
    pub fn add(&mut self, other: RetainedSize) {
        self.byte_size += other.byte_size;
        self.object_count += other.object_count;
    }
}

/// Statistics of one dominator computation
#[derive(Debug, Clone, Default)]
pub struct DominatorStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub iterations: usize,
}
