//! Path Finding - shortest retention paths from GC roots
//!
//! ```text
//! GC roots (by priority) ──► clean queue ────┐
//!                     └────► tainted queue ──┴─► dequeue (clean first)
//!                                                  │
//!                             ReferenceReaderChain ◄┘
//! ```
//!
//! Nodes of the search tree live in a [`PathNodeArena`]; children point at
//! their parent by index. The [`deduplicate_shortest_paths`] trie then
//! collapses paths with identical object sequences.

pub mod application;
pub mod domain;

pub use application::{deduplicate_shortest_paths, PathFinder};
pub use domain::{
    ChildNode, NodeIndex, PathFindingResults, PathNodeArena, ReferencePathNode, RootNode,
    ShortestPath,
};
