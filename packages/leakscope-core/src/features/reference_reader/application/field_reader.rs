//! Instance field references
//!
//! Instance-field matchers apply to every subclass of the class they name, so
//! the merged matcher table is computed once per class and cached.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::apply_outcome;
use crate::features::heap_graph::{GraphResult, HeapGraph, HeapInstance, ObjectId};
use crate::features::reference_reader::domain::{
    MatchOutcome, Reference, ReferenceLocationType, ReferenceMatchers,
};

const JAVA_LANG_OBJECT: &str = "java.lang.Object";

type FieldMatchers = Arc<FxHashMap<String, MatchOutcome>>;

pub struct FieldInstanceReferenceReader {
    matchers: Arc<ReferenceMatchers>,
    matchers_by_class: FxHashMap<ObjectId, FieldMatchers>,
}

impl FieldInstanceReferenceReader {
    pub fn new(matchers: Arc<ReferenceMatchers>) -> Self {
        Self {
            matchers,
            matchers_by_class: FxHashMap::default(),
        }
    }

    fn field_matchers(&mut self, graph: &dyn HeapGraph, class_id: ObjectId) -> GraphResult<FieldMatchers> {
        if let Some(cached) = self.matchers_by_class.get(&class_id) {
            return Ok(Arc::clone(cached));
        }
        let mut merged: FxHashMap<String, MatchOutcome> = FxHashMap::default();
        for class in graph.class_hierarchy(class_id)? {
            if let Some(fields) = self.matchers.instance_fields_of(&class.name) {
                for (field_name, outcome) in fields {
                    merged
                        .entry(field_name.clone())
                        .or_insert_with(|| outcome.clone());
                }
            }
        }
        let merged = Arc::new(merged);
        self.matchers_by_class.insert(class_id, Arc::clone(&merged));
        Ok(merged)
    }

    pub fn read(&mut self, graph: &dyn HeapGraph, instance: &HeapInstance) -> GraphResult<Vec<Reference>> {
        let field_matchers = self.field_matchers(graph, instance.class_id)?;
        Ok(instance
            .fields
            .iter()
            .filter(|field| field.declaring_class != JAVA_LANG_OBJECT)
            .filter_map(|field| {
                let target_id = field.value.as_object_id()?;
                let reference = Reference::new(
                    target_id,
                    ReferenceLocationType::InstanceField,
                    field.name.clone(),
                    field.declaring_class.clone(),
                );
                apply_outcome(reference, field_matchers.get(&field.name))
            })
            .collect())
    }
}
