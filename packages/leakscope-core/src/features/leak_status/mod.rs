//! Leak Status - evidence collection and status resolution
//!
//! Inspectors attach leaking / not-leaking reasons and labels to an
//! [`ObjectReporter`]. The resolver reduces the evidence of every object on a
//! path to one consistent [`LeakingStatus`] and a readable reason.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{compute_leak_statuses, resolve_status, resolve_unreachable_status};
pub use domain::{InspectedObject, LeakingStatus, ObjectReporter};
pub use infrastructure::{
    default_object_inspectors, find_keyed_weak_references, AnonymousClassInspector,
    ClassInspector, ClassLoaderInspector, KeyedWeakReferenceInspector, KeyedWeakReferenceMirror,
    ThreadInspector,
};
pub use ports::ObjectInspector;
