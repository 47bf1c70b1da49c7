//! Heap Graph - Random-access view of a heap dump
//!
//! ## Hexagonal Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Domain          HeapObject, GcRoot, FieldValue │
//! │ Ports           HeapGraph (object-safe trait)  │
//! │ Infrastructure  InMemoryHeapGraph, snapshots   │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Parsing raw dump formats is left to adapters that implement [`HeapGraph`].
//! The in-memory graph is what the CLI and the test-suite use.

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{
    FieldValue, GcRoot, GcRootKind, HeapClass, HeapInstance, HeapObject, HeapObjectArray,
    HeapPrimitiveArray, InstanceField, ObjectId, PrimitiveType, StaticField,
};
pub use infrastructure::{load_snapshot, HeapGraphBuilder, HeapSnapshot, InMemoryHeapGraph};
pub use ports::{GraphResult, HeapGraph, HeapGraphError};
