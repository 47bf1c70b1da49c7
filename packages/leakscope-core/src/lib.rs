/*
 * Leakscope - Heap Dump Leak Analysis Engine
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Hashing and naming helpers
 * - features/    : Vertical slices (heap_graph → reference_reader → path_finding
 *                  → dominators → leak_status → analysis)
 * - config/      : Presets and YAML-backed analysis configuration
 *
 * Execution model:
 * - Single-threaded, single pass per heap dump
 * - Cooperative cancellation polled per dequeued object
 */

#![allow(clippy::new_without_default)] // Default impl not always meaningful
#![allow(clippy::module_inception)] // Module naming intentional

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Analysis configuration (presets, YAML schema)
pub mod config;

/// Crate-level error types
pub mod errors;

/// Feature slices
pub mod features;

/// Shared helpers
pub mod shared;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{AnalysisConfig, MatcherSet, Preset};
pub use errors::{AnalysisError, Result};
pub use features::analysis::{
    AnalysisProgressListener, AnalysisStep, ApplicationLeak, CancellationToken, HeapAnalysis,
    HeapAnalysisFailure, HeapAnalysisSuccess, HeapAnalyzer, LeakTrace, LeakTraceObject,
    LeakTraceReference, LeakingObjectFinder, LibraryLeak, MetadataExtractor,
};
pub use features::heap_graph::{GcRoot, GcRootKind, HeapGraph, HeapObject, InMemoryHeapGraph, ObjectId};
pub use features::leak_status::{LeakingStatus, ObjectInspector, ObjectReporter};
pub use features::reference_reader::{ReferenceMatcher, ReferencePattern};
