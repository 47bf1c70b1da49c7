//! Analysis Ports - collaborators of the orchestrator

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::features::heap_graph::{GraphResult, HeapGraph, ObjectId};

// ═══════════════════════════════════════════════════════════════════════════
// Progress
// ═══════════════════════════════════════════════════════════════════════════

/// Phases of one analysis, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStep {
    ExtractingMetadata,
    FindingRetainedObjects,
    FindingPathsToRetainedObjects,
    FindingDominators,
    InspectingObjects,
    ComputingNativeRetainedSize,
    ComputingRetainedSize,
    BuildingLeakTraces,
}

impl AnalysisStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractingMetadata => "extracting metadata",
            Self::FindingRetainedObjects => "finding retained objects",
            Self::FindingPathsToRetainedObjects => "finding paths to retained objects",
            Self::FindingDominators => "finding dominators",
            Self::InspectingObjects => "inspecting objects",
            Self::ComputingNativeRetainedSize => "computing native retained size",
            Self::ComputingRetainedSize => "computing retained size",
            Self::BuildingLeakTraces => "building leak traces",
        }
    }
}

impl fmt::Display for AnalysisStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observer notified when a phase starts
pub trait AnalysisProgressListener {
    fn on_analysis_progress(&self, step: AnalysisStep);
}

pub struct NoOpProgressListener;

impl AnalysisProgressListener for NoOpProgressListener {
    fn on_analysis_progress(&self, _step: AnalysisStep) {}
}

impl<F> AnalysisProgressListener for F
where
    F: Fn(AnalysisStep),
{
    fn on_analysis_progress(&self, step: AnalysisStep) {
        self(step)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Cancellation
// ═══════════════════════════════════════════════════════════════════════════

/// Cooperative cancellation flag shared with the caller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    canceled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Relaxed)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Collaborators
// ═══════════════════════════════════════════════════════════════════════════

/// Decides which objects should have been garbage collected
pub trait LeakingObjectFinder {
    fn find_leaking_object_ids(&self, graph: &dyn HeapGraph) -> GraphResult<FxHashSet<ObjectId>>;
}

/// Informational key/value pairs describing the dump
pub trait MetadataExtractor {
    fn extract_metadata(&self, graph: &dyn HeapGraph) -> GraphResult<Vec<(String, String)>>;
}

pub struct NoOpMetadataExtractor;

impl MetadataExtractor for NoOpMetadataExtractor {
    fn extract_metadata(&self, _graph: &dyn HeapGraph) -> GraphResult<Vec<(String, String)>> {
        Ok(Vec::new())
    }
}

impl<F> MetadataExtractor for F
where
    F: Fn(&dyn HeapGraph) -> GraphResult<Vec<(String, String)>>,
{
    fn extract_metadata(&self, graph: &dyn HeapGraph) -> GraphResult<Vec<(String, String)>> {
        self(graph)
    }
}
