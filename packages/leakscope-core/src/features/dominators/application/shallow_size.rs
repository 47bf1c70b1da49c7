//! Shallow object sizes

use rustc_hash::FxHashMap;

use crate::features::dominators::ports::ObjectSizeCalculator;
use crate::features::heap_graph::{GraphResult, HeapGraph, HeapObject, ObjectId};

/// Bytes an object occupies by itself, excluding anything it references
///
/// - instance: the class's instance size
/// - object array: length × identifier size
/// - primitive array: length × element size
/// - class: storage of its static fields
#[derive(Debug, Default)]
pub struct ShallowSizeCalculator {
    instance_sizes: FxHashMap<ObjectId, u64>,
}

impl ShallowSizeCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    fn instance_size(&mut self, graph: &dyn HeapGraph, class_id: ObjectId) -> GraphResult<u64> {
        if let Some(size) = self.instance_sizes.get(&class_id) {
            return Ok(*size);
        }
        let size = graph
            .find_class(class_id)?
            .map(|class| u64::from(class.instance_byte_size))
            .unwrap_or(0);
        self.instance_sizes.insert(class_id, size);
        Ok(size)
    }
}

impl ObjectSizeCalculator for ShallowSizeCalculator {
    fn size_of(&mut self, graph: &dyn HeapGraph, object_id: ObjectId) -> GraphResult<u64> {
        let Some(object) = graph.find_object_by_id(object_id)? else {
            return Ok(0);
        };
        let identifier_byte_size = graph.identifier_byte_size();
        Ok(match &*object {
            HeapObject::Instance(instance) => self.instance_size(graph, instance.class_id)?,
            HeapObject::ObjectArray(array) => array.elements.len() as u64 * u64::from(identifier_byte_size),
            HeapObject::PrimitiveArray(array) => {
                u64::from(array.length) * u64::from(array.primitive_type.byte_size())
            }
            HeapObject::Class(class) => class
                .static_fields
                .iter()
                .map(|field| u64::from(field.value.byte_size(identifier_byte_size)))
                .sum(),
        })
    }
}
