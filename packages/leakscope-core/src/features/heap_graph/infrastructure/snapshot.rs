//! JSON heap snapshots
//!
//! A snapshot is the decoded content of a dump: every record plus the GC
//! roots. Dump parsers emit this shape; the CLI reads it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::in_memory::{InMemoryHeapGraph, DEFAULT_IDENTIFIER_BYTE_SIZE};
use crate::features::heap_graph::domain::{GcRoot, HeapObject};
use crate::features::heap_graph::ports::GraphResult;

fn default_identifier_byte_size() -> u32 {
    DEFAULT_IDENTIFIER_BYTE_SIZE
}

/// Serialized heap content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeapSnapshot {
    #[serde(default = "default_identifier_byte_size")]
    pub identifier_byte_size: u32,
    #[serde(default)]
    pub objects: Vec<HeapObject>,
    #[serde(default)]
    pub gc_roots: Vec<GcRoot>,
}

impl HeapSnapshot {
    pub fn into_graph(self) -> GraphResult<InMemoryHeapGraph> {
        InMemoryHeapGraph::from_parts(self.identifier_byte_size, self.objects, self.gc_roots)
    }

    pub fn from_graph(graph: &InMemoryHeapGraph) -> GraphResult<Self> {
        use crate::features::heap_graph::ports::HeapGraph;
        Ok(Self {
            identifier_byte_size: graph.identifier_byte_size(),
            objects: graph.objects().into_iter().cloned().collect(),
            gc_roots: graph.gc_roots()?,
        })
    }
}

/// Read a JSON snapshot from disk and index it
pub fn load_snapshot(path: &Path) -> GraphResult<InMemoryHeapGraph> {
    let content = fs::read_to_string(path)?;
    let snapshot: HeapSnapshot = serde_json::from_str(&content)?;
    debug!(
        path = %path.display(),
        objects = snapshot.objects.len(),
        roots = snapshot.gc_roots.len(),
        "Loaded heap snapshot"
    );
    snapshot.into_graph()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::heap_graph::{FieldValue, GcRootKind, HeapGraph, HeapGraphBuilder};
    use std::io::Write;

    #[test]
    fn test_snapshot_file_roundtrip() {
        let mut builder = HeapGraphBuilder::new();
        let class = builder.add_class("com.example.A");
        let a = builder.add_instance(class);
        builder.set_field(a, "self", FieldValue::reference(a));
        builder.add_root(GcRootKind::JniGlobal, a);
        let graph = builder.build().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&HeapSnapshot::from_graph(&graph).unwrap()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = load_snapshot(file.path()).unwrap();
        assert_eq!(loaded.object_count(), 2);
        assert_eq!(loaded.gc_roots().unwrap().len(), 1);
        assert!(loaded.find_class_by_name("com.example.A").unwrap().is_some());
    }

    #[test]
    fn test_malformed_snapshot_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        assert!(load_snapshot(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_snapshot(Path::new("/nonexistent/leakscope.json")).unwrap_err();
        assert!(matches!(
            err,
            crate::features::heap_graph::HeapGraphError::Io(_)
        ));
    }
}
