//! Built-in object inspectors

mod default_inspectors;
mod keyed_weak_reference;

pub use default_inspectors::{
    default_object_inspectors, AnonymousClassInspector, ClassInspector, ClassLoaderInspector,
    ThreadInspector,
};
pub use keyed_weak_reference::{
    find_keyed_weak_references, KeyedWeakReferenceInspector, KeyedWeakReferenceMirror,
};
