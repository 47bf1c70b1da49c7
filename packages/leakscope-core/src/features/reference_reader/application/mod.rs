//! Reference Reader Application Layer - the reader chain

mod array_reader;
mod class_reader;
mod field_reader;
mod java_local_reader;
mod virtual_readers;

use std::sync::Arc;

use tracing::debug;

use crate::features::heap_graph::{GraphResult, HeapGraph, HeapObject};
use crate::features::reference_reader::domain::{MatchOutcome, Reference, ReferenceMatchers};
use crate::features::reference_reader::ports::ReferenceReader;

pub use array_reader::ObjectArrayReferenceReader;
pub use class_reader::ClassReferenceReader;
pub use field_reader::FieldInstanceReferenceReader;
pub use java_local_reader::{read_thread_name, JavaLocalReader};
pub use virtual_readers::{CollectionLayout, VirtualInstanceReader};

/// Apply a matcher verdict to a reference: drop it or tag it
pub(crate) fn apply_outcome(mut reference: Reference, outcome: Option<&MatchOutcome>) -> Option<Reference> {
    match outcome {
        Some(MatchOutcome::Ignored) => None,
        Some(MatchOutcome::LibraryLeak(matcher)) => {
            reference.matched_library_leak = Some(Arc::clone(matcher));
            Some(reference)
        }
        None => Some(reference),
    }
}

/// Dispatches each heap object to the readers that understand its layout
///
/// - classes: static fields
/// - object arrays: non-null entries
/// - primitive arrays: nothing
/// - instances: thread locals (for threads with frame roots), then the first
///   collection reader that recognizes the class, then raw fields
pub struct ReferenceReaderChain {
    matchers: Arc<ReferenceMatchers>,
    class_reader: ClassReferenceReader,
    array_reader: ObjectArrayReferenceReader,
    java_local_reader: JavaLocalReader,
    virtual_readers: Vec<VirtualInstanceReader>,
    field_reader: FieldInstanceReferenceReader,
}

impl ReferenceReaderChain {
    pub fn new(graph: &dyn HeapGraph, matchers: Arc<ReferenceMatchers>) -> GraphResult<Self> {
        let java_local_reader = JavaLocalReader::new(graph, Arc::clone(&matchers))?;
        let virtual_readers = VirtualInstanceReader::for_graph(graph)?;
        debug!(
            matchers = matchers.len(),
            collection_readers = virtual_readers.len(),
            threads_with_locals = java_local_reader.thread_count(),
            "Reference reader chain ready"
        );
        Ok(Self {
            class_reader: ClassReferenceReader::new(Arc::clone(&matchers)),
            array_reader: ObjectArrayReferenceReader,
            field_reader: FieldInstanceReferenceReader::new(Arc::clone(&matchers)),
            java_local_reader,
            virtual_readers,
            matchers,
        })
    }

    pub fn matchers(&self) -> &ReferenceMatchers {
        &self.matchers
    }

    pub fn java_local_reader(&self) -> &JavaLocalReader {
        &self.java_local_reader
    }
}

impl ReferenceReader for ReferenceReaderChain {
    fn read(&mut self, graph: &dyn HeapGraph, object: &HeapObject) -> GraphResult<Vec<Reference>> {
        match object {
            HeapObject::Class(class) => Ok(self.class_reader.read(class)),
            HeapObject::ObjectArray(array) => Ok(self.array_reader.read(array)),
            HeapObject::PrimitiveArray(_) => Ok(Vec::new()),
            HeapObject::Instance(instance) => {
                let mut references = self.java_local_reader.read(graph, instance)?;
                for reader in &mut self.virtual_readers {
                    if reader.matches(graph, instance)? {
                        references.extend(reader.read(graph, instance)?);
                        break;
                    }
                }
                references.extend(self.field_reader.read(graph, instance)?);
                Ok(references)
            }
        }
    }
}
