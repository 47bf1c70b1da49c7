//! Entries of object arrays

use crate::features::heap_graph::HeapObjectArray;
use crate::features::reference_reader::domain::{Reference, ReferenceLocationType};

pub struct ObjectArrayReferenceReader;

impl ObjectArrayReferenceReader {
    pub fn read(&self, array: &HeapObjectArray) -> Vec<Reference> {
        array
            .elements
            .iter()
            .enumerate()
            .filter_map(|(index, element)| {
                element.map(|target_id| {
                    Reference::new(
                        target_id,
                        ReferenceLocationType::ArrayEntry,
                        index.to_string(),
                        array.array_class_name.clone(),
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_entries_skipped_and_indices_kept() {
        let array = HeapObjectArray {
            object_id: 1,
            array_class_id: 2,
            array_class_name: "java.lang.Object[]".to_string(),
            elements: vec![None, Some(5), None, Some(6)],
        };
        let references = ObjectArrayReferenceReader.read(&array);
        let names: Vec<&str> = references.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["1", "3"]);
        assert!(references
            .iter()
            .all(|r| r.location_type == ReferenceLocationType::ArrayEntry));
    }
}
