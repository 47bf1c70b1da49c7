//! Feature slices
//!
//! Data flows leaves-first:
//! heap_graph → reference_reader → path_finding → dominators → leak_status → analysis

pub mod analysis;
pub mod dominators;
pub mod heap_graph;
pub mod leak_status;
pub mod path_finding;
pub mod reference_reader;
