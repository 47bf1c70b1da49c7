//! Reference Reader - outgoing references of one heap object
//!
//! A [`ReferenceReaderChain`] dispatches each object to the readers that know
//! its layout: class statics, array entries, known collection internals and
//! finally raw instance fields. Every produced reference has already gone
//! through the [`ReferenceMatchers`] index: ignored references are dropped,
//! library-leak references carry their matcher.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{JavaLocalReader, ReferenceReaderChain};
pub use domain::{
    LibraryLeakReferenceMatcher, MatchOutcome, Reference, ReferenceLocationType, ReferenceMatcher,
    ReferenceMatchers, ReferencePattern,
};
pub use infrastructure::{android_reference_matchers, jdk_reference_matchers};
pub use ports::ReferenceReader;
