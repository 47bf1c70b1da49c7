//! Analysis results

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AnalysisError;

use super::leak::{ApplicationLeak, LibraryLeak};
use super::leak_trace::{LeakTrace, LeakTraceObject};

/// Outcome of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HeapAnalysis {
    Success(HeapAnalysisSuccess),
    Failure(HeapAnalysisFailure),
}

impl HeapAnalysis {
    pub fn analysis_id(&self) -> Uuid {
        match self {
            Self::Success(success) => success.analysis_id,
            Self::Failure(failure) => failure.analysis_id,
        }
    }

    pub fn analysis_duration_millis(&self) -> u64 {
        match self {
            Self::Success(success) => success.analysis_duration_millis,
            Self::Failure(failure) => failure.analysis_duration_millis,
        }
    }

    pub fn as_success(&self) -> Option<&HeapAnalysisSuccess> {
        match self {
            Self::Success(success) => Some(success),
            Self::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&HeapAnalysisFailure> {
        match self {
            Self::Failure(failure) => Some(failure),
            Self::Success(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeapAnalysisSuccess {
    pub analysis_id: Uuid,
    pub heap_dump_file: PathBuf,
    pub created_at: DateTime<Utc>,
    pub analysis_duration_millis: u64,
    pub metadata: Vec<(String, String)>,
    pub application_leaks: Vec<ApplicationLeak>,
    pub library_leaks: Vec<LibraryLeak>,
    /// Leaking objects no GC root reaches
    pub unreachable_objects: Vec<LeakTraceObject>,
}

impl HeapAnalysisSuccess {
    pub fn all_leak_traces(&self) -> impl Iterator<Item = &LeakTrace> {
        self.application_leaks
            .iter()
            .flat_map(|leak| leak.leak_traces.iter())
            .chain(self.library_leaks.iter().flat_map(|leak| leak.leak_traces.iter()))
    }

    pub fn leak_count(&self) -> usize {
        self.application_leaks.len() + self.library_leaks.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeapAnalysisFailure {
    pub analysis_id: Uuid,
    pub heap_dump_file: PathBuf,
    pub created_at: DateTime<Utc>,
    pub analysis_duration_millis: u64,
    pub error_message: String,
    pub canceled: bool,
    /// Original cause, not serialized
    #[serde(skip)]
    pub error: Option<Arc<AnalysisError>>,
}
