//! Static field references of a class

use std::sync::Arc;

use super::apply_outcome;
use crate::features::heap_graph::HeapClass;
use crate::features::reference_reader::domain::{Reference, ReferenceLocationType, ReferenceMatchers};

/// Whether a static slot is runtime bookkeeping rather than a declared field
fn is_synthetic_static(name: &str) -> bool {
    name == "$staticOverhead" || name == "$classOverhead" || name.starts_with("$class$")
}

pub struct ClassReferenceReader {
    matchers: Arc<ReferenceMatchers>,
}

impl ClassReferenceReader {
    pub fn new(matchers: Arc<ReferenceMatchers>) -> Self {
        Self { matchers }
    }

    pub fn read(&self, class: &HeapClass) -> Vec<Reference> {
        class
            .static_fields
            .iter()
            .filter(|field| !is_synthetic_static(&field.name))
            .filter_map(|field| {
                let target_id = field.value.as_object_id()?;
                let reference = Reference::new(
                    target_id,
                    ReferenceLocationType::StaticField,
                    field.name.clone(),
                    class.name.clone(),
                );
                apply_outcome(
                    reference,
                    self.matchers.match_static_field(&class.name, &field.name),
                )
            })
            .collect()
    }
}
