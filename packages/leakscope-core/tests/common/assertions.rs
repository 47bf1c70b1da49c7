//! Custom assertions for analysis results

use leakscope_core::{HeapAnalysis, HeapAnalysisSuccess, LeakTrace, LeakingStatus, ObjectId};

/// Unwrap a successful analysis, printing the failure otherwise
pub fn expect_success(analysis: &HeapAnalysis) -> &HeapAnalysisSuccess {
    match analysis {
        HeapAnalysis::Success(success) => success,
        HeapAnalysis::Failure(failure) => panic!(
            "Expected a successful analysis, got failure: {}",
            failure.error_message
        ),
    }
}

/// Object ids from the root to the leaking object
pub fn trace_object_ids(trace: &LeakTrace) -> Vec<ObjectId> {
    trace
        .reference_path
        .iter()
        .map(|reference| reference.origin_object.object_id)
        .chain(std::iter::once(trace.leaking_object.object_id))
        .collect()
}

pub fn trace_statuses(trace: &LeakTrace) -> Vec<LeakingStatus> {
    trace
        .reference_path
        .iter()
        .map(|reference| reference.origin_object.leaking_status)
        .chain(std::iter::once(trace.leaking_object.leaking_status))
        .collect()
}

/// The single trace of a result holding exactly one leak
pub fn single_trace(success: &HeapAnalysisSuccess) -> &LeakTrace {
    let traces: Vec<&LeakTrace> = success.all_leak_traces().collect();
    assert_eq!(traces.len(), 1, "Expected one leak trace, got {}", traces.len());
    traces[0]
}

/// No NOT_LEAKING object follows a LEAKING one
pub fn assert_no_status_crossing(trace: &LeakTrace) {
    let statuses = trace_statuses(trace);
    let last_not_leaking = statuses.iter().rposition(|s| *s == LeakingStatus::NotLeaking);
    let first_leaking = statuses.iter().position(|s| *s == LeakingStatus::Leaking);
    if let (Some(not_leaking), Some(leaking)) = (last_not_leaking, first_leaking) {
        assert!(
            not_leaking < leaking,
            "Status boundary crossed: {:?}",
            statuses
        );
    }
    assert_eq!(statuses.last(), Some(&LeakingStatus::Leaking));
}
