//! Heap graph builders
//!
//! [`HeapScenario`] wraps [`HeapGraphBuilder`] with the JDK classes most
//! scenarios need.

use leakscope_core::features::heap_graph::{
    FieldValue, GcRootKind, HeapGraphBuilder, InMemoryHeapGraph, ObjectId,
};

pub struct HeapScenario {
    pub builder: HeapGraphBuilder,
    pub object_class: ObjectId,
    pub reference_class: ObjectId,
    pub weak_reference_class: ObjectId,
    keyed_weak_reference_class: Option<ObjectId>,
}

impl HeapScenario {
    pub fn new() -> Self {
        let mut builder = HeapGraphBuilder::new();
        let object_class = builder.add_class("java.lang.Object");
        let reference_class = builder.add_subclass("java.lang.ref.Reference", object_class);
        let weak_reference_class = builder.add_subclass("java.lang.ref.WeakReference", reference_class);
        Self {
            builder,
            object_class,
            reference_class,
            weak_reference_class,
            keyed_weak_reference_class: None,
        }
    }

    /// A class deriving from `java.lang.Object` with the given instance size
    pub fn class(&mut self, name: &str, instance_byte_size: u32) -> ObjectId {
        let class = self.builder.add_subclass(name, self.object_class);
        self.builder.set_instance_byte_size(class, instance_byte_size);
        class
    }

    pub fn instance(&mut self, class_id: ObjectId) -> ObjectId {
        self.builder.add_instance(class_id)
    }

    pub fn field(&mut self, from: ObjectId, name: &str, to: ObjectId) -> &mut Self {
        self.builder.set_field(from, name, FieldValue::reference(to));
        self
    }

    pub fn static_field(&mut self, class_id: ObjectId, name: &str, to: ObjectId) -> &mut Self {
        self.builder.add_static_field(class_id, name, FieldValue::reference(to));
        self
    }

    pub fn root(&mut self, kind: GcRootKind, object_id: ObjectId) -> &mut Self {
        self.builder.add_root(kind, object_id);
        self
    }

    /// A retained `leakcanary.KeyedWeakReference` watching `referent`
    pub fn watch(&mut self, referent: Option<ObjectId>, description: &str) -> ObjectId {
        let keyed = match self.keyed_weak_reference_class {
            Some(id) => id,
            None => {
                let id = self
                    .builder
                    .add_subclass("leakcanary.KeyedWeakReference", self.weak_reference_class);
                self.keyed_weak_reference_class = Some(id);
                id
            }
        };
        let reference = self.builder.add_instance(keyed);
        let description = self.builder.add_string(description);
        let key = self.builder.add_string(&format!("key-{}", reference));
        let referent = match referent {
            Some(id) => FieldValue::reference(id),
            None => FieldValue::null(),
        };
        let reference_class = self.reference_class;
        self.builder
            .set_field_declared_by(reference, reference_class, "referent", referent);
        self.builder
            .set_field(reference, "description", FieldValue::reference(description))
            .set_field(reference, "key", FieldValue::reference(key))
            .set_field(reference, "watchUptimeMillis", FieldValue::Long(1_000))
            .set_field(reference, "retainedUptimeMillis", FieldValue::Long(6_000));
        reference
    }

    pub fn build(self) -> InMemoryHeapGraph {
        self.builder.build().expect("scenario graph is consistent")
    }
}

impl Default for HeapScenario {
    fn default() -> Self {
        Self::new()
    }
}
