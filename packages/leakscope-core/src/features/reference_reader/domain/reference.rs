//! Outgoing references

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::matchers::LibraryLeakReferenceMatcher;
use crate::features::heap_graph::ObjectId;

/// Where a reference is stored in its origin object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceLocationType {
    InstanceField,
    StaticField,
    Local,
    ArrayEntry,
}

impl ReferenceLocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstanceField => "INSTANCE_FIELD",
            Self::StaticField => "STATIC_FIELD",
            Self::Local => "LOCAL",
            Self::ArrayEntry => "ARRAY_ENTRY",
        }
    }
}

/// One outgoing edge of the reference graph
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub target_id: ObjectId,
    pub location_type: ReferenceLocationType,
    /// Field name, array index, or rendered collection key
    pub name: String,
    /// Class declaring the field, array class, or collection class
    pub owning_class_name: String,
    /// Produced by a collection reader rather than read from a real field
    pub is_virtual: bool,
    pub matched_library_leak: Option<Arc<LibraryLeakReferenceMatcher>>,
}

impl Reference {
    pub fn new(
        target_id: ObjectId,
        location_type: ReferenceLocationType,
        name: impl Into<String>,
        owning_class_name: impl Into<String>,
    ) -> Self {
        Self {
            target_id,
            location_type,
            name: name.into(),
            owning_class_name: owning_class_name.into(),
            is_virtual: false,
            matched_library_leak: None,
        }
    }

    pub fn into_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    pub fn is_library_leak(&self) -> bool {
        self.matched_library_leak.is_some()
    }
}
