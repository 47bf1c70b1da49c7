//! Grouping of leak traces by signature

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::features::analysis::domain::{ApplicationLeak, LeakTrace, LibraryLeak};
use crate::features::reference_reader::LibraryLeakReferenceMatcher;

/// Collects traces into groups, keeping first-seen order
#[derive(Default)]
pub struct LeakGrouper {
    application: Vec<ApplicationLeak>,
    application_index: FxHashMap<String, usize>,
    library: Vec<LibraryLeak>,
    library_index: FxHashMap<String, usize>,
}

impl LeakGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trace; `library_leak` is the first library-leak match of its path
    pub fn add(&mut self, trace: LeakTrace, library_leak: Option<&Arc<LibraryLeakReferenceMatcher>>) {
        match library_leak {
            Some(matcher) => {
                let group = LibraryLeak {
                    pattern: matcher.pattern.clone(),
                    description: matcher.description.clone(),
                    leak_traces: Vec::new(),
                };
                let signature = group.signature();
                let index = *self.library_index.entry(signature).or_insert_with(|| {
                    self.library.push(group);
                    self.library.len() - 1
                });
                self.library[index].leak_traces.push(trace);
            }
            None => {
                let signature = trace.signature();
                let index = *self.application_index.entry(signature).or_insert_with(|| {
                    self.application.push(ApplicationLeak {
                        leak_traces: Vec::new(),
                    });
                    self.application.len() - 1
                });
                self.application[index].leak_traces.push(trace);
            }
        }
    }

    pub fn finish(self) -> (Vec<ApplicationLeak>, Vec<LibraryLeak>) {
        (self.application, self.library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::analysis::domain::{LeakTraceObject, LeakTraceObjectType};
    use crate::features::heap_graph::GcRootKind;
    use crate::features::leak_status::LeakingStatus;
    use crate::features::reference_reader::ReferencePattern;

    fn trace(leaking_class: &str) -> LeakTrace {
        LeakTrace {
            gc_root_type: GcRootKind::StickyClass,
            reference_path: Vec::new(),
            leaking_object: LeakTraceObject {
                object_id: 7,
                object_type: LeakTraceObjectType::Instance,
                class_name: leaking_class.to_string(),
                labels: Vec::new(),
                leaking_status: LeakingStatus::Leaking,
                leaking_status_reason: "This is the leaking object".to_string(),
                retained_heap_byte_size: None,
                retained_object_count: None,
            },
        }
    }

    #[test]
    fn test_groups_by_signature_in_first_seen_order() {
        let matcher = Arc::new(LibraryLeakReferenceMatcher {
            pattern: ReferencePattern::static_field("android.text.TextLine", "sCached"),
            description: "TextLine cache".to_string(),
        });

        let mut grouper = LeakGrouper::new();
        grouper.add(trace("com.example.B"), None);
        grouper.add(trace("com.example.A"), None);
        grouper.add(trace("com.example.B"), None);
        grouper.add(trace("com.example.A"), Some(&matcher));
        grouper.add(trace("com.example.C"), Some(&matcher));

        let (application, library) = grouper.finish();
        assert_eq!(application.len(), 2);
        assert_eq!(application[0].short_description(), "com.example.B");
        assert_eq!(application[0].leak_traces.len(), 2);
        assert_eq!(library.len(), 1);
        assert_eq!(library[0].leak_traces.len(), 2);
    }
}
