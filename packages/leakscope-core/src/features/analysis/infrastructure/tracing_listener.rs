use tracing::info;

use crate::features::analysis::ports::{AnalysisProgressListener, AnalysisStep};

/// Logs every analysis step at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressListener;

impl AnalysisProgressListener for TracingProgressListener {
    fn on_analysis_progress(&self, step: AnalysisStep) {
        info!(step = step.as_str(), "Analysis progress");
    }
}
