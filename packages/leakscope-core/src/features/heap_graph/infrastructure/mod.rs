//! Heap Graph Infrastructure - in-memory accessor and JSON snapshots

mod in_memory;
mod snapshot;

pub use in_memory::{HeapGraphBuilder, InMemoryHeapGraph};
pub use snapshot::{load_snapshot, HeapSnapshot};
