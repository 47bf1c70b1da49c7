//! Analysis - orchestration and leak reports
//!
//! ```text
//! metadata → leaking ids → paths → dedup → inspect → statuses
//!          → retained sizes → leak traces → application / library groups
//! ```
//!
//! [`HeapAnalyzer::analyze`] never returns an error: every failure becomes a
//! [`HeapAnalysis::Failure`] that keeps the cause and the elapsed time.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::HeapAnalyzer;
pub use domain::{
    ApplicationLeak, HeapAnalysis, HeapAnalysisFailure, HeapAnalysisSuccess, LeakTrace,
    LeakTraceObject, LeakTraceObjectType, LeakTraceReference, LibraryLeak,
};
pub use infrastructure::{
    ClassInstancesLeakingObjectFinder, FixedLeakingObjectFinder, KeyedWeakReferenceFinder,
    TracingProgressListener,
};
pub use ports::{
    AnalysisProgressListener, AnalysisStep, CancellationToken, LeakingObjectFinder,
    MetadataExtractor, NoOpMetadataExtractor, NoOpProgressListener,
};
