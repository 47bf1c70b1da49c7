//! Leak traces
//!
//! A leak trace is the path from a GC root to a leaking object, with every
//! object annotated by its resolved status.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::heap_graph::{GcRootKind, HeapObject, ObjectId};
use crate::features::leak_status::LeakingStatus;
use crate::features::reference_reader::ReferenceLocationType;
use crate::shared::utils::{last_segment, sha256_hex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeakTraceObjectType {
    Class,
    Array,
    Instance,
}

impl LeakTraceObjectType {
    pub fn of(object: &HeapObject) -> Self {
        match object {
            HeapObject::Class(_) => Self::Class,
            HeapObject::ObjectArray(_) | HeapObject::PrimitiveArray(_) => Self::Array,
            HeapObject::Instance(_) => Self::Instance,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Array => "array",
            Self::Instance => "instance",
        }
    }
}

/// An object on a leak trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakTraceObject {
    pub object_id: ObjectId,
    pub object_type: LeakTraceObjectType,
    pub class_name: String,
    pub labels: Vec<String>,
    pub leaking_status: LeakingStatus,
    pub leaking_status_reason: String,
    /// Only computed for LEAKING and UNKNOWN objects
    pub retained_heap_byte_size: Option<u64>,
    pub retained_object_count: Option<u32>,
}

impl LeakTraceObject {
    pub fn class_simple_name(&self) -> &str {
        last_segment(&self.class_name, '.')
    }

    fn write_details(&self, f: &mut fmt::Formatter<'_>, prefix: &str) -> fmt::Result {
        let status = if self.leaking_status_reason.is_empty() {
            self.leaking_status.to_string()
        } else {
            format!("{} ({})", self.leaking_status, self.leaking_status_reason)
        };
        writeln!(f, "{}Leaking: {}", prefix, status)?;
        if let (Some(bytes), Some(count)) = (self.retained_heap_byte_size, self.retained_object_count) {
            writeln!(f, "{}Retaining {} B in {} objects", prefix, bytes, count)?;
        }
        for label in &self.labels {
            writeln!(f, "{}{}", prefix, label)?;
        }
        Ok(())
    }
}

impl fmt::Display for LeakTraceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.class_name, self.object_type.as_str())
    }
}

/// A reference from `origin_object` to the next object of the trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakTraceReference {
    pub origin_object: LeakTraceObject,
    pub reference_type: ReferenceLocationType,
    pub owning_class_name: String,
    pub reference_name: String,
}

impl LeakTraceReference {
    pub fn reference_display_name(&self) -> String {
        match self.reference_type {
            ReferenceLocationType::ArrayEntry => format!("[{}]", self.reference_name),
            ReferenceLocationType::StaticField | ReferenceLocationType::InstanceField => {
                self.reference_name.clone()
            }
            ReferenceLocationType::Local => "<Java Local>".to_string(),
        }
    }

    /// Display name with array indices collapsed, stable across dumps
    pub fn reference_generic_name(&self) -> String {
        match self.reference_type {
            ReferenceLocationType::ArrayEntry => "[x]".to_string(),
            ReferenceLocationType::StaticField | ReferenceLocationType::InstanceField => {
                self.reference_name.clone()
            }
            ReferenceLocationType::Local => "<Java Local>".to_string(),
        }
    }

    pub fn owning_class_simple_name(&self) -> &str {
        last_segment(&self.owning_class_name, '.')
    }
}

/// Shortest path from a GC root to a leaking object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakTrace {
    pub gc_root_type: GcRootKind,
    pub reference_path: Vec<LeakTraceReference>,
    pub leaking_object: LeakTraceObject,
}

impl LeakTrace {
    /// Stable key of the trace shape: root type, each reference, leaking class
    pub fn signature(&self) -> String {
        let mut shape = String::from(self.gc_root_type.as_str());
        for reference in &self.reference_path {
            shape.push('|');
            shape.push_str(&reference.origin_object.class_name);
            shape.push(' ');
            shape.push_str(reference.reference_type.as_str());
            shape.push(' ');
            shape.push_str(&reference.reference_generic_name());
        }
        shape.push('|');
        shape.push_str(&self.leaking_object.class_name);
        sha256_hex(&shape)
    }

    /// Whether the reference at `index` may be the cause of the leak
    ///
    /// References out of UNKNOWN objects are suspect, and so is the last
    /// reference out of a run of NOT_LEAKING objects.
    pub fn reference_path_element_is_suspect(&self, index: usize) -> bool {
        match self.reference_path[index].origin_object.leaking_status {
            LeakingStatus::Unknown => true,
            LeakingStatus::NotLeaking => {
                index == self.reference_path.len() - 1
                    || self.reference_path[index + 1].origin_object.leaking_status
                        != LeakingStatus::NotLeaking
            }
            LeakingStatus::Leaking => false,
        }
    }

    pub fn suspect_references(&self) -> Vec<&LeakTraceReference> {
        (0..self.reference_path.len())
            .filter(|index| self.reference_path_element_is_suspect(*index))
            .map(|index| &self.reference_path[index])
            .collect()
    }

    /// Largest retained size among the LEAKING objects of the trace
    pub fn retained_heap_byte_size(&self) -> Option<u64> {
        self.reference_path
            .iter()
            .map(|reference| &reference.origin_object)
            .chain(std::iter::once(&self.leaking_object))
            .filter(|object| object.leaking_status == LeakingStatus::Leaking)
            .filter_map(|object| object.retained_heap_byte_size)
            .max()
    }
}

impl fmt::Display for LeakTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "┬───")?;
        writeln!(f, "│ GC Root: {}", self.gc_root_type.description())?;
        writeln!(f, "│")?;
        for (index, reference) in self.reference_path.iter().enumerate() {
            writeln!(f, "├─ {}", reference.origin_object)?;
            reference.origin_object.write_details(f, "│    ")?;

            let is_static = reference.reference_type == ReferenceLocationType::StaticField;
            let separator = match reference.reference_type {
                ReferenceLocationType::StaticField | ReferenceLocationType::InstanceField => ".",
                _ => "",
            };
            let prefix = format!(
                "│    ↓{} {}{}",
                if is_static { " static" } else { "" },
                reference.owning_class_simple_name().trim_end_matches("[]"),
                separator
            );
            let name = reference.reference_display_name();
            writeln!(f, "{}{}", prefix, name)?;
            if self.reference_path_element_is_suspect(index) {
                let indent = " ".repeat(prefix.chars().count().saturating_sub(1));
                writeln!(f, "│{}{}", indent, "~".repeat(name.chars().count()))?;
            }
        }
        writeln!(f, "╰→ {}", self.leaking_object)?;
        self.leaking_object.write_details(f, "     ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn object(class_name: &str, status: LeakingStatus) -> LeakTraceObject {
        LeakTraceObject {
            object_id: 1,
            object_type: LeakTraceObjectType::Instance,
            class_name: class_name.to_string(),
            labels: Vec::new(),
            leaking_status: status,
            leaking_status_reason: String::new(),
            retained_heap_byte_size: None,
            retained_object_count: None,
        }
    }

    fn reference(origin: LeakTraceObject, kind: ReferenceLocationType, name: &str) -> LeakTraceReference {
        LeakTraceReference {
            owning_class_name: origin.class_name.clone(),
            origin_object: origin,
            reference_type: kind,
            reference_name: name.to_string(),
        }
    }

    fn trace(index_name: &str) -> LeakTrace {
        LeakTrace {
            gc_root_type: GcRootKind::StickyClass,
            reference_path: vec![
                reference(
                    object("com.example.Registry", LeakingStatus::NotLeaking),
                    ReferenceLocationType::StaticField,
                    "sListeners",
                ),
                reference(
                    object("java.lang.Object[]", LeakingStatus::Unknown),
                    ReferenceLocationType::ArrayEntry,
                    index_name,
                ),
            ],
            leaking_object: object("com.example.Activity", LeakingStatus::Leaking),
        }
    }

    #[test]
    fn test_signature_ignores_array_indices() {
        assert_eq!(trace("3").signature(), trace("7").signature());
        assert_eq!(trace("3").signature().len(), 64);

        let mut other = trace("3");
        other.leaking_object.class_name = "com.example.Fragment".to_string();
        assert_ne!(trace("3").signature(), other.signature());
    }

    #[test]
    fn test_suspect_references() {
        let trace = trace("0");
        assert!(trace.reference_path_element_is_suspect(0));
        assert!(trace.reference_path_element_is_suspect(1));

        let mut all_clean = trace.clone();
        all_clean.reference_path[1].origin_object.leaking_status = LeakingStatus::NotLeaking;
        assert!(!all_clean.reference_path_element_is_suspect(0));
        assert!(all_clean.reference_path_element_is_suspect(1));
    }

    #[test]
    fn test_retained_size_is_max_of_leaking_objects() {
        let mut trace = trace("0");
        trace.reference_path[1].origin_object.retained_heap_byte_size = Some(500);
        trace.leaking_object.retained_heap_byte_size = Some(100);
        assert_eq!(trace.retained_heap_byte_size(), Some(100));

        trace.reference_path[1].origin_object.leaking_status = LeakingStatus::Leaking;
        assert_eq!(trace.retained_heap_byte_size(), Some(500));
    }

    #[test]
    fn test_display_renders_root_references_and_leak() {
        let rendered = trace("2").to_string();
        assert!(rendered.contains("GC Root: System class"));
        assert!(rendered.contains("├─ com.example.Registry instance"));
        assert!(rendered.contains("↓ static Registry.sListeners"));
        assert!(rendered.contains("↓ Object[2]"));
        assert!(rendered.contains("╰→ com.example.Activity instance"));
        assert!(rendered.contains("~~~"));
    }
}
