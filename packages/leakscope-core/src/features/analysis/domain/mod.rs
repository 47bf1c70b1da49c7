//! Analysis domain model - immutable report values

mod heap_analysis;
mod leak;
mod leak_trace;

pub use heap_analysis::{HeapAnalysis, HeapAnalysisFailure, HeapAnalysisSuccess};
pub use leak::{ApplicationLeak, LibraryLeak};
pub use leak_trace::{LeakTrace, LeakTraceObject, LeakTraceObjectType, LeakTraceReference};
