//! In-memory heap graph
//!
//! Holds every record in a hash map keyed by object id. Built either from a
//! [`HeapSnapshot`](super::HeapSnapshot) or incrementally with
//! [`HeapGraphBuilder`].

use std::borrow::Cow;

use rustc_hash::FxHashMap;

use crate::features::heap_graph::domain::{
    FieldValue, GcRoot, GcRootKind, HeapClass, HeapInstance, HeapObject, HeapObjectArray,
    HeapPrimitiveArray, InstanceField, ObjectId, PrimitiveType, StaticField,
};
use crate::features::heap_graph::ports::{GraphResult, HeapGraph, HeapGraphError};

/// Default reference size for snapshots that do not declare one
pub const DEFAULT_IDENTIFIER_BYTE_SIZE: u32 = 4;

/// Heap graph fully resident in memory
#[derive(Debug, Clone)]
pub struct InMemoryHeapGraph {
    identifier_byte_size: u32,
    objects: FxHashMap<ObjectId, HeapObject>,
    gc_roots: Vec<GcRoot>,
    class_ids_by_name: FxHashMap<String, ObjectId>,
    instances_by_class: FxHashMap<ObjectId, Vec<ObjectId>>,
}

impl InMemoryHeapGraph {
    /// Index a set of records
    ///
    /// Fails on duplicate ids and on instances whose class record is missing.
    pub fn from_parts(
        identifier_byte_size: u32,
        objects: impl IntoIterator<Item = HeapObject>,
        gc_roots: Vec<GcRoot>,
    ) -> GraphResult<Self> {
        let mut by_id: FxHashMap<ObjectId, HeapObject> = FxHashMap::default();
        for object in objects {
            let id = object.object_id();
            if by_id.insert(id, object).is_some() {
                return Err(HeapGraphError::corrupted(format!(
                    "duplicate object id {}",
                    id
                )));
            }
        }

        let mut class_ids_by_name = FxHashMap::default();
        let mut instances_by_class: FxHashMap<ObjectId, Vec<ObjectId>> = FxHashMap::default();
        for object in by_id.values() {
            match object {
                HeapObject::Class(class) => {
                    class_ids_by_name
                        .entry(class.name.clone())
                        .or_insert(class.object_id);
                }
                HeapObject::Instance(instance) => {
                    if !matches!(by_id.get(&instance.class_id), Some(HeapObject::Class(_))) {
                        return Err(HeapGraphError::corrupted(format!(
                            "instance {} refers to missing class {}",
                            instance.object_id, instance.class_id
                        )));
                    }
                    instances_by_class
                        .entry(instance.class_id)
                        .or_default()
                        .push(instance.object_id);
                }
                HeapObject::ObjectArray(_) | HeapObject::PrimitiveArray(_) => {}
            }
        }
        for ids in instances_by_class.values_mut() {
            ids.sort_unstable();
        }

        Ok(Self {
            identifier_byte_size,
            objects: by_id,
            gc_roots,
            class_ids_by_name,
            instances_by_class,
        })
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// All records, sorted by id
    pub fn objects(&self) -> Vec<&HeapObject> {
        let mut objects: Vec<&HeapObject> = self.objects.values().collect();
        objects.sort_by_key(|o| o.object_id());
        objects
    }
}

impl HeapGraph for InMemoryHeapGraph {
    fn identifier_byte_size(&self) -> u32 {
        self.identifier_byte_size
    }

    fn find_object_by_id(&self, id: ObjectId) -> GraphResult<Option<Cow<'_, HeapObject>>> {
        Ok(self.objects.get(&id).map(Cow::Borrowed))
    }

    fn gc_roots(&self) -> GraphResult<Vec<GcRoot>> {
        Ok(self.gc_roots.clone())
    }

    fn find_class_by_name(&self, name: &str) -> GraphResult<Option<Cow<'_, HeapClass>>> {
        Ok(self
            .class_ids_by_name
            .get(name)
            .and_then(|id| self.objects.get(id))
            .and_then(HeapObject::as_class)
            .map(Cow::Borrowed))
    }

    fn instance_ids_of(&self, class_id: ObjectId) -> GraphResult<Vec<ObjectId>> {
        Ok(self
            .instances_by_class
            .get(&class_id)
            .cloned()
            .unwrap_or_default())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════

/// Incremental builder for [`InMemoryHeapGraph`]
///
/// Ids are allocated sequentially starting at 1. Classes must be added before
/// their instances so field and class names can be resolved eagerly.
///
/// # Example
/// ```rust
/// use leakscope_core::features::heap_graph::{FieldValue, GcRootKind, HeapGraph, HeapGraphBuilder};
///
/// let mut builder = HeapGraphBuilder::new();
/// let class = builder.add_class("com.example.Holder");
/// let holder = builder.add_instance(class);
/// let held = builder.add_instance(class);
/// builder.set_field(holder, "next", FieldValue::reference(held));
/// builder.add_root(GcRootKind::StickyClass, class);
///
/// let graph = builder.build().unwrap();
/// assert!(graph.object_exists(held).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct HeapGraphBuilder {
    identifier_byte_size: u32,
    next_id: ObjectId,
    objects: FxHashMap<ObjectId, HeapObject>,
    order: Vec<ObjectId>,
    gc_roots: Vec<GcRoot>,
}

impl HeapGraphBuilder {
    pub fn new() -> Self {
        Self {
            identifier_byte_size: DEFAULT_IDENTIFIER_BYTE_SIZE,
            next_id: 1,
            objects: FxHashMap::default(),
            order: Vec::new(),
            gc_roots: Vec::new(),
        }
    }

    pub fn identifier_byte_size(mut self, size: u32) -> Self {
        self.identifier_byte_size = size;
        self
    }

    fn allocate(&mut self, object: HeapObject) -> ObjectId {
        let id = object.object_id();
        self.next_id = self.next_id.max(id + 1);
        self.order.push(id);
        self.objects.insert(id, object);
        id
    }

    fn fresh_id(&self) -> ObjectId {
        self.next_id
    }

    pub fn add_class(&mut self, name: &str) -> ObjectId {
        let id = self.fresh_id();
        self.allocate(HeapObject::Class(HeapClass::new(id, name)))
    }

    pub fn add_subclass(&mut self, name: &str, superclass_id: ObjectId) -> ObjectId {
        let id = self.fresh_id();
        let instance_byte_size = self
            .class(superclass_id)
            .map(|c| c.instance_byte_size)
            .unwrap_or(0);
        self.allocate(HeapObject::Class(
            HeapClass::new(id, name)
                .with_superclass(superclass_id)
                .with_instance_byte_size(instance_byte_size),
        ))
    }

    pub fn set_instance_byte_size(&mut self, class_id: ObjectId, size: u32) -> &mut Self {
        if let Some(HeapObject::Class(class)) = self.objects.get_mut(&class_id) {
            class.instance_byte_size = size;
        }
        self
    }

    pub fn add_static_field(&mut self, class_id: ObjectId, name: &str, value: FieldValue) -> &mut Self {
        if let Some(HeapObject::Class(class)) = self.objects.get_mut(&class_id) {
            class.static_fields.push(StaticField {
                name: name.to_string(),
                value,
            });
        }
        self
    }

    pub fn add_instance(&mut self, class_id: ObjectId) -> ObjectId {
        let id = self.fresh_id();
        let class_name = self
            .class(class_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        self.allocate(HeapObject::Instance(HeapInstance {
            object_id: id,
            class_id,
            class_name,
            fields: Vec::new(),
        }))
    }

    /// Set a field declared by the instance's own class
    pub fn set_field(&mut self, instance_id: ObjectId, name: &str, value: FieldValue) -> &mut Self {
        let declaring = match self.objects.get(&instance_id) {
            Some(HeapObject::Instance(i)) => i.class_name.clone(),
            _ => return self,
        };
        self.put_field(instance_id, declaring, name, value)
    }

    /// Set a field declared by a superclass of the instance's class
    pub fn set_field_declared_by(
        &mut self,
        instance_id: ObjectId,
        declaring_class_id: ObjectId,
        name: &str,
        value: FieldValue,
    ) -> &mut Self {
        let declaring = self
            .class(declaring_class_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        self.put_field(instance_id, declaring, name, value)
    }

    fn put_field(
        &mut self,
        instance_id: ObjectId,
        declaring_class: String,
        name: &str,
        value: FieldValue,
    ) -> &mut Self {
        let hierarchy = self.hierarchy_names(instance_id);
        if let Some(HeapObject::Instance(instance)) = self.objects.get_mut(&instance_id) {
            if let Some(existing) = instance
                .fields
                .iter_mut()
                .find(|f| f.declaring_class == declaring_class && f.name == name)
            {
                existing.value = value;
            } else {
                instance.fields.push(InstanceField {
                    declaring_class,
                    name: name.to_string(),
                    value,
                });
                let rank = |f: &InstanceField| {
                    hierarchy
                        .iter()
                        .position(|n| *n == f.declaring_class)
                        .unwrap_or(hierarchy.len())
                };
                instance.fields.sort_by_key(rank);
            }
        }
        self
    }

    fn hierarchy_names(&self, instance_id: ObjectId) -> Vec<String> {
        let mut names = Vec::new();
        let mut next = match self.objects.get(&instance_id) {
            Some(HeapObject::Instance(i)) => Some(i.class_id),
            _ => None,
        };
        while let Some(class) = next.and_then(|id| self.class(id)) {
            if names.contains(&class.name) {
                break;
            }
            names.push(class.name.clone());
            next = class.superclass_id;
        }
        names
    }

    pub fn add_object_array(&mut self, array_class_name: &str, elements: Vec<Option<ObjectId>>) -> ObjectId {
        let array_class_id = match self.find_class_id(array_class_name) {
            Some(id) => id,
            None => self.add_class(array_class_name),
        };
        let id = self.fresh_id();
        self.allocate(HeapObject::ObjectArray(HeapObjectArray {
            object_id: id,
            array_class_id,
            array_class_name: array_class_name.to_string(),
            elements,
        }))
    }

    pub fn add_primitive_array(&mut self, primitive_type: PrimitiveType, length: u32) -> ObjectId {
        let id = self.fresh_id();
        self.allocate(HeapObject::PrimitiveArray(HeapPrimitiveArray {
            object_id: id,
            primitive_type,
            length,
            text: None,
        }))
    }

    /// Add a `java.lang.String` backed by a decoded char array
    pub fn add_string(&mut self, text: &str) -> ObjectId {
        let string_class = match self.find_class_id("java.lang.String") {
            Some(id) => id,
            None => {
                let id = self.add_class("java.lang.String");
                self.set_instance_byte_size(id, 12);
                id
            }
        };
        let value_id = self.fresh_id();
        self.allocate(HeapObject::PrimitiveArray(HeapPrimitiveArray {
            object_id: value_id,
            primitive_type: PrimitiveType::Char,
            length: text.chars().count() as u32,
            text: Some(text.to_string()),
        }));
        let string_id = self.add_instance(string_class);
        self.set_field(string_id, "value", FieldValue::reference(value_id));
        string_id
    }

    pub fn add_root(&mut self, kind: GcRootKind, object_id: ObjectId) -> &mut Self {
        self.gc_roots.push(GcRoot::new(kind, object_id));
        self
    }

    pub fn add_gc_root(&mut self, root: GcRoot) -> &mut Self {
        self.gc_roots.push(root);
        self
    }

    pub fn find_class_id(&self, name: &str) -> Option<ObjectId> {
        self.order.iter().copied().find(|id| {
            matches!(self.objects.get(id), Some(HeapObject::Class(c)) if c.name == name)
        })
    }

    fn class(&self, class_id: ObjectId) -> Option<&HeapClass> {
        self.objects.get(&class_id).and_then(HeapObject::as_class)
    }

    pub fn build(self) -> GraphResult<InMemoryHeapGraph> {
        let Self {
            identifier_byte_size,
            mut objects,
            order,
            gc_roots,
            ..
        } = self;
        let ordered = order.into_iter().filter_map(move |id| objects.remove(&id));
        InMemoryHeapGraph::from_parts(identifier_byte_size, ordered.collect::<Vec<_>>(), gc_roots)
    }
}

impl Default for HeapGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
