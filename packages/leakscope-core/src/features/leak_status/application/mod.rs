//! Leak Status Resolver
//!
//! Per object, not-leaking evidence beats leaking evidence unless
//! `leaking_wins`, which is only set for the leaking object itself. Along a
//! path two propagation passes then make the statuses consistent:
//!
//! 1. every object before the last NOT_LEAKING object is NOT_LEAKING
//! 2. every object between the first LEAKING object and the leaking object
//!    is LEAKING
//!
//! Objects between the two boundaries without evidence stay UNKNOWN.

use crate::errors::{AnalysisError, Result};
use crate::features::leak_status::domain::{LeakingStatus, ObjectReporter};

/// Reduce the evidence of one object to a status and a reason
pub fn resolve_status(reporter: &ObjectReporter, leaking_wins: bool) -> (LeakingStatus, String) {
    let mut status = LeakingStatus::Unknown;
    let mut reason = String::new();

    if !reporter.not_leaking_reasons().is_empty() {
        status = LeakingStatus::NotLeaking;
        reason = reporter.not_leaking_reasons().join(" and ");
    }

    if !reporter.leaking_reasons().is_empty() {
        let leaking = reporter.leaking_reasons().join(" and ");
        if status == LeakingStatus::NotLeaking {
            if leaking_wins {
                status = LeakingStatus::Leaking;
                reason = format!("{}. Conflicts with {}", leaking, reason);
            } else {
                reason = format!("{}. Conflicts with {}", reason, leaking);
            }
        } else {
            status = LeakingStatus::Leaking;
            reason = leaking;
        }
    }

    (status, reason)
}

/// Status of an object no GC root reaches: always LEAKING
pub fn resolve_unreachable_status(reporter: &ObjectReporter) -> (LeakingStatus, String) {
    match resolve_status(reporter, true) {
        (LeakingStatus::Leaking, reason) => (LeakingStatus::Leaking, reason),
        (LeakingStatus::Unknown, _) => (LeakingStatus::Leaking, "This is a leaking object".to_string()),
        (LeakingStatus::NotLeaking, reason) => (
            LeakingStatus::Leaking,
            format!("This is a leaking object. Conflicts with {}", reason),
        ),
    }
}

/// Statuses for every object of a path, root first, leaking object last
pub fn compute_leak_statuses(reporters: &[ObjectReporter]) -> Result<Vec<(LeakingStatus, String)>> {
    if reporters.is_empty() {
        return Ok(Vec::new());
    }
    let last_index = reporters.len() - 1;
    let mut last_not_leaking_index: Option<usize> = None;
    let mut first_leaking_index = last_index;
    let mut statuses = Vec::with_capacity(reporters.len());

    for (index, reporter) in reporters.iter().enumerate() {
        let is_leaking_object = index == last_index;
        let (status, reason) = resolve_status(reporter, is_leaking_object);
        let resolved = if is_leaking_object {
            match status {
                LeakingStatus::Leaking => (status, reason),
                LeakingStatus::Unknown => (LeakingStatus::Leaking, "This is the leaking object".to_string()),
                LeakingStatus::NotLeaking => (
                    LeakingStatus::Leaking,
                    format!("This is the leaking object. Conflicts with {}", reason),
                ),
            }
        } else {
            (status, reason)
        };

        match resolved.0 {
            LeakingStatus::NotLeaking => {
                last_not_leaking_index = Some(index);
                // Keeps first_leaking_index after last_not_leaking_index
                first_leaking_index = last_index;
            }
            LeakingStatus::Leaking if first_leaking_index == last_index => {
                first_leaking_index = index;
            }
            _ => {}
        }
        statuses.push(resolved);
    }

    let simple_names: Vec<&str> = reporters.iter().map(|r| r.simple_class_name()).collect();

    if let Some(last_not_leaking) = last_not_leaking_index {
        for index in 0..last_not_leaking {
            let next_not_leaking = (index + 1..=last_not_leaking)
                .find(|i| statuses[*i].0 == LeakingStatus::NotLeaking)
                .unwrap_or(last_not_leaking);
            let next_name = simple_names[next_not_leaking];
            let (status, reason) = &statuses[index];
            let forced = match status {
                LeakingStatus::Unknown => format!("{}↓ is not leaking", next_name),
                LeakingStatus::NotLeaking => format!("{}↓ is not leaking and {}", next_name, reason),
                LeakingStatus::Leaking => {
                    format!("{}↓ is not leaking. Conflicts with {}", next_name, reason)
                }
            };
            statuses[index] = (LeakingStatus::NotLeaking, forced);
        }
    }

    if first_leaking_index + 1 < last_index {
        // Descending, so the previous LEAKING object is one with direct evidence
        for index in (first_leaking_index + 1..last_index).rev() {
            let previous_leaking = (first_leaking_index..index)
                .rev()
                .find(|i| statuses[*i].0 == LeakingStatus::Leaking)
                .unwrap_or(first_leaking_index);
            let previous_name = simple_names[previous_leaking];
            let (status, reason) = &statuses[index];
            let forced = match status {
                LeakingStatus::Unknown => format!("{}↑ is leaking", previous_name),
                LeakingStatus::Leaking => format!("{}↑ is leaking and {}", previous_name, reason),
                LeakingStatus::NotLeaking => {
                    return Err(AnalysisError::invalid_state(format!(
                        "object at index {} is not leaking but follows a leaking object",
                        index
                    )))
                }
            };
            statuses[index] = (LeakingStatus::Leaking, forced);
        }
    }

    Ok(statuses)
}
