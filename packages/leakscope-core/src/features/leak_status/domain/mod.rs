//! Leak status domain model

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::heap_graph::{GraphResult, HeapGraph, HeapObject, ObjectId};

/// Resolved status of an object on a leak trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeakingStatus {
    NotLeaking,
    Leaking,
    Unknown,
}

impl LeakingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotLeaking => "NO",
            Self::Leaking => "YES",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for LeakingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence collected about one object, in insertion order without duplicates
#[derive(Debug, Clone)]
pub struct ObjectReporter {
    heap_object: HeapObject,
    labels: Vec<String>,
    leaking_reasons: Vec<String>,
    not_leaking_reasons: Vec<String>,
}

fn push_unique(set: &mut Vec<String>, value: String) {
    if !set.contains(&value) {
        set.push(value);
    }
}

impl ObjectReporter {
    pub fn new(heap_object: HeapObject) -> Self {
        Self {
            heap_object,
            labels: Vec::new(),
            leaking_reasons: Vec::new(),
            not_leaking_reasons: Vec::new(),
        }
    }

    pub fn heap_object(&self) -> &HeapObject {
        &self.heap_object
    }

    pub fn object_id(&self) -> ObjectId {
        self.heap_object.object_id()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn leaking_reasons(&self) -> &[String] {
        &self.leaking_reasons
    }

    pub fn not_leaking_reasons(&self) -> &[String] {
        &self.not_leaking_reasons
    }

    pub fn add_label(&mut self, label: impl Into<String>) {
        push_unique(&mut self.labels, label.into());
    }

    pub fn add_leaking_reason(&mut self, reason: impl Into<String>) {
        push_unique(&mut self.leaking_reasons, reason.into());
    }

    pub fn add_not_leaking_reason(&mut self, reason: impl Into<String>) {
        push_unique(&mut self.not_leaking_reasons, reason.into());
    }

    /// Whether the object is an instance of `class_name` or one of its subclasses
    pub fn is_instance_of(&self, graph: &dyn HeapGraph, class_name: &str) -> GraphResult<bool> {
        match &self.heap_object {
            HeapObject::Instance(instance) => graph.is_subclass_of(instance.class_id, class_name),
            _ => Ok(false),
        }
    }

    /// Class name without package, as used in status reasons
    pub fn simple_class_name(&self) -> &str {
        crate::shared::utils::last_segment(self.heap_object.class_name(), '.')
    }
}

/// An object after inspection and status resolution
#[derive(Debug, Clone)]
pub struct InspectedObject {
    pub heap_object: HeapObject,
    pub leaking_status: LeakingStatus,
    pub leaking_status_reason: String,
    pub labels: Vec<String>,
}
