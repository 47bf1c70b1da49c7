//! Heap graph domain model

mod gc_root;
mod heap_object;

pub use gc_root::{GcRoot, GcRootKind};
pub use heap_object::{
    FieldValue, HeapClass, HeapInstance, HeapObject, HeapObjectArray, HeapPrimitiveArray,
    InstanceField, ObjectId, PrimitiveType, StaticField,
};
