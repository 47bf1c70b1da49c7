//! Inspectors every analysis can use

use once_cell::sync::Lazy;
use regex::Regex;

use super::keyed_weak_reference::KeyedWeakReferenceInspector;
use crate::errors::Result;
use crate::features::heap_graph::{HeapGraph, HeapObject};
use crate::features::leak_status::domain::ObjectReporter;
use crate::features::leak_status::ports::ObjectInspector;
use crate::features::reference_reader::application::read_thread_name;

/// `Outer$1`, `Outer$Inner$12`
static ANONYMOUS_CLASS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.+\$\d+$").expect("anonymous class pattern is valid"));

/// Classes are loaded once and never collected with the leak
pub struct ClassInspector;

impl ObjectInspector for ClassInspector {
    fn inspect(&self, _graph: &dyn HeapGraph, reporter: &mut ObjectReporter) -> Result<()> {
        if matches!(reporter.heap_object(), HeapObject::Class(_)) {
            reporter.add_not_leaking_reason("a class is never leaking");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "class"
    }
}

pub struct ClassLoaderInspector;

impl ObjectInspector for ClassLoaderInspector {
    fn inspect(&self, graph: &dyn HeapGraph, reporter: &mut ObjectReporter) -> Result<()> {
        if reporter.is_instance_of(graph, "java.lang.ClassLoader")? {
            reporter.add_not_leaking_reason("A ClassLoader is never leaking");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "class_loader"
    }
}

/// Labels threads with their name
pub struct ThreadInspector;

impl ObjectInspector for ThreadInspector {
    fn inspect(&self, graph: &dyn HeapGraph, reporter: &mut ObjectReporter) -> Result<()> {
        if !reporter.is_instance_of(graph, "java.lang.Thread")? {
            return Ok(());
        }
        let name = match reporter.heap_object() {
            HeapObject::Instance(instance) => read_thread_name(graph, instance)?,
            _ => None,
        };
        if let Some(name) = name {
            reporter.add_label(format!("Thread name: '{}'", name));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "thread"
    }
}

/// Labels anonymous classes with what they extend
pub struct AnonymousClassInspector;

impl ObjectInspector for AnonymousClassInspector {
    fn inspect(&self, graph: &dyn HeapGraph, reporter: &mut ObjectReporter) -> Result<()> {
        let HeapObject::Instance(instance) = reporter.heap_object() else {
            return Ok(());
        };
        if !ANONYMOUS_CLASS_NAME.is_match(&instance.class_name) {
            return Ok(());
        }
        let superclass = graph
            .find_class(instance.class_id)?
            .and_then(|class| class.superclass_id)
            .map(|id| graph.find_class(id))
            .transpose()?
            .flatten()
            .map(|class| class.name.clone());
        let label = match superclass {
            Some(name) if name != "java.lang.Object" => format!("Anonymous subclass of {}", name),
            _ => "Anonymous class".to_string(),
        };
        reporter.add_label(label);
        Ok(())
    }

    fn name(&self) -> &str {
        "anonymous_class"
    }
}

/// The default inspector list, fresh for one analysis
pub fn default_object_inspectors() -> Vec<Box<dyn ObjectInspector>> {
    vec![
        Box::new(KeyedWeakReferenceInspector::new()),
        Box::new(ClassInspector),
        Box::new(ClassLoaderInspector),
        Box::new(ThreadInspector),
        Box::new(AnonymousClassInspector),
    ]
}
