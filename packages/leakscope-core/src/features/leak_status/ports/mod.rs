//! Leak Status Ports

use crate::errors::Result;
use crate::features::heap_graph::HeapGraph;

use super::domain::ObjectReporter;

/// Attaches evidence about an object
///
/// Inspectors run in registration order and their effects accumulate. An
/// error aborts the whole analysis.
pub trait ObjectInspector {
    fn inspect(&self, graph: &dyn HeapGraph, reporter: &mut ObjectReporter) -> Result<()>;

    /// Name used in logs and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> ObjectInspector for F
where
    F: Fn(&dyn HeapGraph, &mut ObjectReporter) -> Result<()>,
{
    fn inspect(&self, graph: &dyn HeapGraph, reporter: &mut ObjectReporter) -> Result<()> {
        self(graph, reporter)
    }
}
