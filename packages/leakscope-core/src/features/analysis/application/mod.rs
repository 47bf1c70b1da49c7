//! Analysis Application Layer
//!
//! [`HeapAnalyzer`] sequences the phases; [`LeakGrouper`] turns resolved
//! paths into application and library leak groups.

mod heap_analyzer;
mod leak_grouper;

pub use heap_analyzer::HeapAnalyzer;
pub use leak_grouper::LeakGrouper;
