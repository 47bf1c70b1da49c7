//! Reference reader domain model

mod matchers;
mod reference;

pub use matchers::{
    LibraryLeakReferenceMatcher, MatchOutcome, ReferenceMatcher, ReferenceMatchers,
    ReferencePattern,
};
pub use reference::{Reference, ReferenceLocationType};
