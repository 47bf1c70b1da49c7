//! Leak groups
//!
//! Traces sharing a signature describe the same bug and are reported once.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::reference_reader::ReferencePattern;
use crate::shared::utils::sha256_hex;

use super::leak_trace::LeakTrace;

fn total_retained(traces: &[LeakTrace]) -> Option<u64> {
    traces
        .iter()
        .filter_map(LeakTrace::retained_heap_byte_size)
        .fold(None, |total, size| Some(total.unwrap_or(0) + size))
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

/// A leak caused by application code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationLeak {
    pub leak_traces: Vec<LeakTrace>,
}

impl ApplicationLeak {
    pub fn signature(&self) -> String {
        self.leak_traces
            .first()
            .map(LeakTrace::signature)
            .unwrap_or_default()
    }

    /// Leaking class of the first trace
    pub fn short_description(&self) -> String {
        self.leak_traces
            .first()
            .map(|trace| trace.leaking_object.class_name.clone())
            .unwrap_or_default()
    }

    pub fn total_retained_heap_byte_size(&self) -> Option<u64> {
        total_retained(&self.leak_traces)
    }
}

/// A leak caused by a library, matched by a known reference pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryLeak {
    pub pattern: ReferencePattern,
    pub description: String,
    pub leak_traces: Vec<LeakTrace>,
}

impl LibraryLeak {
    /// Group key: the pattern identifies the bug
    pub fn signature(&self) -> String {
        sha256_hex(&self.pattern.to_string())
    }

    pub fn short_description(&self) -> String {
        format!("{} {}", self.pattern, first_line(&self.description))
    }

    pub fn total_retained_heap_byte_size(&self) -> Option<u64> {
        total_retained(&self.leak_traces)
    }
}

fn write_traces(f: &mut fmt::Formatter<'_>, traces: &[LeakTrace]) -> fmt::Result {
    for trace in traces {
        writeln!(f)?;
        write!(f, "{}", trace)?;
    }
    Ok(())
}

fn write_header(f: &mut fmt::Formatter<'_>, traces: &[LeakTrace], retained: Option<u64>) -> fmt::Result {
    match retained {
        Some(bytes) => write!(f, "{} B retained by leaking objects", bytes)?,
        None => write!(f, "{} leak trace(s)", traces.len())?,
    }
    writeln!(f)
}

impl fmt::Display for ApplicationLeak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.short_description())?;
        write_header(f, &self.leak_traces, self.total_retained_heap_byte_size())?;
        writeln!(f, "Signature: {}", self.signature())?;
        write_traces(f, &self.leak_traces)
    }
}

impl fmt::Display for LibraryLeak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.short_description())?;
        write_header(f, &self.leak_traces, self.total_retained_heap_byte_size())?;
        writeln!(f, "Leak pattern: {}", self.pattern)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "Signature: {}", self.signature())?;
        write_traces(f, &self.leak_traces)
    }
}
