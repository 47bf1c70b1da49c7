//! Analysis Infrastructure - default collaborators

mod finders;
mod tracing_listener;

pub use finders::{ClassInstancesLeakingObjectFinder, FixedLeakingObjectFinder, KeyedWeakReferenceFinder};
pub use tracing_listener::TracingProgressListener;
