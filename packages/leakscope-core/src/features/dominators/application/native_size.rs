//! Native allocation sizes
//!
//! Objects backed by native memory register a cleaner whose thunk points at
//! the allocation registry. The registry's `size` is credited to the object
//! the cleaner watches, so native memory shows up in retained sizes.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::features::heap_graph::{GraphResult, HeapGraph, ObjectId};

const CLEANER_CLASS: &str = "sun.misc.Cleaner";
const CLEANER_THUNK_CLASS: &str = "libcore.util.NativeAllocationRegistry$CleanerThunk";

pub struct NativeSizeMapper;

impl NativeSizeMapper {
    /// Native bytes per object id, for every object watched by a cleaner
    pub fn map_native_sizes(graph: &dyn HeapGraph) -> GraphResult<FxHashMap<ObjectId, u64>> {
        let mut sizes: FxHashMap<ObjectId, u64> = FxHashMap::default();
        let Some(cleaner_class) = graph.find_class_by_name(CLEANER_CLASS)? else {
            return Ok(sizes);
        };
        if graph.find_class_by_name(CLEANER_THUNK_CLASS)?.is_none() {
            return Ok(sizes);
        }

        for cleaner_id in graph.instance_ids_of(cleaner_class.object_id)? {
            let Some(cleaner) = graph.find_object_by_id(cleaner_id)? else {
                continue;
            };
            let Some(cleaner) = cleaner.as_instance() else {
                continue;
            };
            let referent = cleaner.field_named("referent").and_then(|v| v.as_object_id());
            let thunk = cleaner.field_named("thunk").and_then(|v| v.as_object_id());
            let (Some(referent), Some(thunk)) = (referent, thunk) else {
                continue;
            };
            let Some(thunk) = graph.find_object_by_id(thunk)? else {
                continue;
            };
            let registry = thunk
                .as_instance()
                .filter(|t| t.class_name == CLEANER_THUNK_CLASS)
                .and_then(|t| t.field_named("this$0"))
                .and_then(|v| v.as_object_id());
            let Some(registry) = registry else {
                continue;
            };
            let size = graph
                .find_object_by_id(registry)?
                .and_then(|r| r.as_instance().and_then(|i| i.field_named("size")).and_then(|v| v.as_long()))
                .unwrap_or(0);
            if size > 0 {
                *sizes.entry(referent).or_insert(0) += size as u64;
            }
        }

        debug!(objects = sizes.len(), "Mapped native allocation sizes");
        Ok(sizes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::heap_graph::{FieldValue, HeapGraphBuilder};

    #[test]
    fn test_native_size_credited_to_referent() {
        let mut builder = HeapGraphBuilder::new();
        let bitmap_class = builder.add_class("android.graphics.Bitmap");
        let cleaner_class = builder.add_class(CLEANER_CLASS);
        let thunk_class = builder.add_class(CLEANER_THUNK_CLASS);
        let registry_class = builder.add_class("libcore.util.NativeAllocationRegistry");

        let bitmap = builder.add_instance(bitmap_class);
        let registry = builder.add_instance(registry_class);
        builder.set_field(registry, "size", FieldValue::Long(4096));
        let thunk = builder.add_instance(thunk_class);
        builder.set_field(thunk, "this$0", FieldValue::reference(registry));
        for _ in 0..2 {
            let cleaner = builder.add_instance(cleaner_class);
            builder.set_field(cleaner, "referent", FieldValue::reference(bitmap));
            builder.set_field(cleaner, "thunk", FieldValue::reference(thunk));
        }
        let graph = builder.build().unwrap();

        let sizes = NativeSizeMapper::map_native_sizes(&graph).unwrap();
        assert_eq!(sizes.get(&bitmap), Some(&8192));
        assert_eq!(sizes.len(), 1);
    }

    #[test]
    fn test_no_cleaner_class_means_no_native_sizes() {
        let graph = HeapGraphBuilder::new().build().unwrap();
        assert!(NativeSizeMapper::map_native_sizes(&graph).unwrap().is_empty());
    }
}
