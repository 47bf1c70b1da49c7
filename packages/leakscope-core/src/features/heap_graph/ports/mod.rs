//! Heap Graph Ports
//!
//! [`HeapGraph`] is the only way the engine touches a dump. Implementations
//! may page data in lazily; the engine never assumes reads are cheap and never
//! mutates the graph.

use std::borrow::Cow;

use thiserror::Error;

use super::domain::{GcRoot, HeapClass, HeapObject, ObjectId};

// ═══════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════

/// Failure while reading the dump
///
/// A reference to an id that has no record is not an error: lookups return
/// `Ok(None)` and callers treat the reference as a dead end.
#[derive(Debug, Error)]
pub enum HeapGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed heap snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Corrupted heap record: {0}")]
    Corrupted(String),
}

impl HeapGraphError {
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }
}

pub type GraphResult<T> = std::result::Result<T, HeapGraphError>;

// ═══════════════════════════════════════════════════════════════════════════
// Graph Accessor Port
// ═══════════════════════════════════════════════════════════════════════════

/// Random-access view of heap objects, classes and GC roots
///
/// Object-safe so the engine can run against `&dyn HeapGraph`.
pub trait HeapGraph {
    /// Size of an object reference in bytes (4 or 8)
    fn identifier_byte_size(&self) -> u32;

    fn find_object_by_id(&self, id: ObjectId) -> GraphResult<Option<Cow<'_, HeapObject>>>;

    /// All GC roots, in dump order
    fn gc_roots(&self) -> GraphResult<Vec<GcRoot>>;

    fn find_class_by_name(&self, name: &str) -> GraphResult<Option<Cow<'_, HeapClass>>>;

    /// Ids of the direct instances of a class (subclass instances excluded)
    fn instance_ids_of(&self, class_id: ObjectId) -> GraphResult<Vec<ObjectId>>;

    fn object_exists(&self, id: ObjectId) -> GraphResult<bool> {
        Ok(self.find_object_by_id(id)?.is_some())
    }

    fn find_class(&self, class_id: ObjectId) -> GraphResult<Option<Cow<'_, HeapClass>>> {
        Ok(match self.find_object_by_id(class_id)? {
            Some(Cow::Borrowed(HeapObject::Class(class))) => Some(Cow::Borrowed(class)),
            Some(Cow::Owned(HeapObject::Class(class))) => Some(Cow::Owned(class)),
            _ => None,
        })
    }

    /// The class followed by its superclasses, root superclass last
    fn class_hierarchy(&self, class_id: ObjectId) -> GraphResult<Vec<HeapClass>> {
        let mut hierarchy = Vec::new();
        let mut next = Some(class_id);
        while let Some(id) = next {
            let Some(class) = self.find_class(id)? else {
                break;
            };
            if hierarchy.iter().any(|c: &HeapClass| c.object_id == id) {
                return Err(HeapGraphError::corrupted(format!(
                    "class hierarchy cycle at class {}",
                    id
                )));
            }
            next = class.superclass_id;
            hierarchy.push(class.into_owned());
        }
        Ok(hierarchy)
    }

    /// Whether the class, or one of its superclasses, is named `ancestor_name`
    fn is_subclass_of(&self, class_id: ObjectId, ancestor_name: &str) -> GraphResult<bool> {
        Ok(self
            .class_hierarchy(class_id)?
            .iter()
            .any(|c| c.name == ancestor_name))
    }

    /// Text of a `java.lang.String` instance, when its backing array was decoded
    fn read_string(&self, id: ObjectId) -> GraphResult<Option<String>> {
        let Some(object) = self.find_object_by_id(id)? else {
            return Ok(None);
        };
        let Some(instance) = object.as_instance() else {
            return Ok(None);
        };
        if instance.class_name != "java.lang.String" {
            return Ok(None);
        }
        let Some(value_id) = instance
            .read_field("java.lang.String", "value")
            .and_then(|v| v.as_object_id())
        else {
            return Ok(None);
        };
        Ok(self
            .find_object_by_id(value_id)?
            .and_then(|o| o.as_primitive_array().and_then(|a| a.text.clone())))
    }

    /// Read a reference field of an instance and return the referenced string
    fn read_string_field(
        &self,
        instance_id: ObjectId,
        declaring_class: &str,
        field: &str,
    ) -> GraphResult<Option<String>> {
        let Some(object) = self.find_object_by_id(instance_id)? else {
            return Ok(None);
        };
        let target = object
            .as_instance()
            .and_then(|i| i.read_field(declaring_class, field))
            .and_then(|v| v.as_object_id());
        match target {
            Some(id) => self.read_string(id),
            None => Ok(None),
        }
    }
}
