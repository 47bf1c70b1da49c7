//! Reference matchers
//!
//! A matcher pairs a [`ReferencePattern`] with a verdict. [`ReferenceMatchers`]
//! compiles a list of matchers into lookup maps; when two matchers share a
//! pattern the first one registered wins.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Identifies one specific reference in the heap
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReferencePattern {
    /// Static field of a class
    StaticField { class_name: String, field_name: String },
    /// Instance field, applied to every subclass of `class_name`
    InstanceField { class_name: String, field_name: String },
    /// Local variable of a thread's stack frames
    JavaLocal { thread_name: String },
    /// JNI global root whose object is an instance of `class_name`
    NativeGlobalVariable { class_name: String },
}

impl ReferencePattern {
    pub fn static_field(class_name: &str, field_name: &str) -> Self {
        Self::StaticField {
            class_name: class_name.to_string(),
            field_name: field_name.to_string(),
        }
    }

    pub fn instance_field(class_name: &str, field_name: &str) -> Self {
        Self::InstanceField {
            class_name: class_name.to_string(),
            field_name: field_name.to_string(),
        }
    }

    pub fn java_local(thread_name: &str) -> Self {
        Self::JavaLocal {
            thread_name: thread_name.to_string(),
        }
    }

    pub fn native_global_variable(class_name: &str) -> Self {
        Self::NativeGlobalVariable {
            class_name: class_name.to_string(),
        }
    }
}

impl fmt::Display for ReferencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaticField {
                class_name,
                field_name,
            } => write!(f, "static {}#{}", class_name, field_name),
            Self::InstanceField {
                class_name,
                field_name,
            } => write!(f, "instance field {}#{}", class_name, field_name),
            Self::JavaLocal { thread_name } => {
                write!(f, "local variable on thread {}", thread_name)
            }
            Self::NativeGlobalVariable { class_name } => {
                write!(f, "native global variable referencing {}", class_name)
            }
        }
    }
}

/// A known leak caused by a library or framework rather than the application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryLeakReferenceMatcher {
    pub pattern: ReferencePattern,
    pub description: String,
}

/// Verdict for references matching a pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ReferenceMatcher {
    /// Never traversed
    Ignored { pattern: ReferencePattern },
    /// Traversed, but taints every path through it
    LibraryLeak(LibraryLeakReferenceMatcher),
}

impl ReferenceMatcher {
    pub fn ignored(pattern: ReferencePattern) -> Self {
        Self::Ignored { pattern }
    }

    pub fn library_leak(pattern: ReferencePattern, description: impl Into<String>) -> Self {
        Self::LibraryLeak(LibraryLeakReferenceMatcher {
            pattern,
            description: description.into(),
        })
    }

    pub fn pattern(&self) -> &ReferencePattern {
        match self {
            Self::Ignored { pattern } => pattern,
            Self::LibraryLeak(matcher) => &matcher.pattern,
        }
    }
}

/// Result of looking up a reference in [`ReferenceMatchers`]
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Ignored,
    LibraryLeak(Arc<LibraryLeakReferenceMatcher>),
}

impl MatchOutcome {
    fn from_matcher(matcher: &ReferenceMatcher) -> Self {
        match matcher {
            ReferenceMatcher::Ignored { .. } => Self::Ignored,
            ReferenceMatcher::LibraryLeak(leak) => Self::LibraryLeak(Arc::new(leak.clone())),
        }
    }
}

type FieldTable = FxHashMap<String, FxHashMap<String, MatchOutcome>>;

/// Matchers indexed by pattern shape
#[derive(Debug, Clone, Default)]
pub struct ReferenceMatchers {
    static_fields: FieldTable,
    instance_fields: FieldTable,
    java_locals: FxHashMap<String, MatchOutcome>,
    native_globals: FxHashMap<String, MatchOutcome>,
    len: usize,
}

impl ReferenceMatchers {
    pub fn new(matchers: &[ReferenceMatcher]) -> Self {
        let mut index = Self::default();
        for matcher in matchers {
            index.insert(matcher);
        }
        index
    }

    fn insert(&mut self, matcher: &ReferenceMatcher) {
        let outcome = MatchOutcome::from_matcher(matcher);
        let inserted = match matcher.pattern() {
            ReferencePattern::StaticField {
                class_name,
                field_name,
            } => insert_field(&mut self.static_fields, class_name, field_name, outcome),
            ReferencePattern::InstanceField {
                class_name,
                field_name,
            } => insert_field(&mut self.instance_fields, class_name, field_name, outcome),
            ReferencePattern::JavaLocal { thread_name } => {
                insert_unique(&mut self.java_locals, thread_name, outcome)
            }
            ReferencePattern::NativeGlobalVariable { class_name } => {
                insert_unique(&mut self.native_globals, class_name, outcome)
            }
        };
        if inserted {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn match_static_field(&self, class_name: &str, field_name: &str) -> Option<&MatchOutcome> {
        self.static_fields.get(class_name)?.get(field_name)
    }

    /// Instance-field matchers declared directly on `class_name`
    pub fn instance_fields_of(&self, class_name: &str) -> Option<&FxHashMap<String, MatchOutcome>> {
        self.instance_fields.get(class_name)
    }

    pub fn match_java_local(&self, thread_name: &str) -> Option<&MatchOutcome> {
        self.java_locals.get(thread_name)
    }

    pub fn match_native_global(&self, class_name: &str) -> Option<&MatchOutcome> {
        self.native_globals.get(class_name)
    }
}

fn insert_field(table: &mut FieldTable, class_name: &str, field_name: &str, outcome: MatchOutcome) -> bool {
    insert_unique(table.entry(class_name.to_string()).or_default(), field_name, outcome)
}

fn insert_unique(map: &mut FxHashMap<String, MatchOutcome>, key: &str, outcome: MatchOutcome) -> bool {
    if map.contains_key(key) {
        return false;
    }
    map.insert(key.to_string(), outcome);
    true
}
