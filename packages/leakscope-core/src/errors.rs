//! Error types for leakscope-core
//!
//! Provides unified error handling across the crate. Graph accessor and
//! configuration failures are wrapped so that every phase can propagate with `?`.

use thiserror::Error;

use crate::config::ConfigError;
use crate::features::analysis::AnalysisStep;
use crate::features::heap_graph::HeapGraphError;

/// Main error type for analysis operations
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Heap graph could not be read
    #[error("Heap graph error: {0}")]
    Graph(#[from] HeapGraphError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cooperative cancellation was requested while a phase was running
    #[error("Analysis canceled during {step}")]
    Canceled { step: AnalysisStep },

    /// An object inspector failed
    #[error("Inspector '{inspector}' failed: {message}")]
    Inspection { inspector: String, message: String },

    /// Internal invariant violated
    #[error("Invalid analysis state: {0}")]
    InvalidState(String),
}

impl AnalysisError {
    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        AnalysisError::InvalidState(msg.into())
    }

    /// Create an inspection error
    pub fn inspection(inspector: impl Into<String>, msg: impl Into<String>) -> Self {
        AnalysisError::Inspection {
            inspector: inspector.into(),
            message: msg.into(),
        }
    }

    /// Whether this error is a cancellation rather than a crash
    pub fn is_canceled(&self) -> bool {
        matches!(self, AnalysisError::Canceled { .. })
    }
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canceled_is_distinguished() {
        let err = AnalysisError::Canceled {
            step: AnalysisStep::FindingPathsToRetainedObjects,
        };
        assert!(err.is_canceled());
        assert!(err.to_string().contains("canceled"));

        let err = AnalysisError::invalid_state("broken");
        assert!(!err.is_canceled());
    }

    #[test]
    fn test_graph_error_conversion() {
        let err: AnalysisError = HeapGraphError::corrupted("bad record").into();
        assert!(matches!(err, AnalysisError::Graph(_)));
        assert!(err.to_string().contains("bad record"));
    }
}
