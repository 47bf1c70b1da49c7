//! Dominators - immediate dominators and retained sizes
//!
//! The path finder records every traversed edge into a
//! [`DominatorTreeBuilder`]. Once the traversal is over the builder solves the
//! dominance equations by iterating to a fixed point, so objects reachable
//! through several parents are attributed to their deepest common dominator.
//!
//! ## References
//! - Cooper, Harvey, Kennedy. "A Simple, Fast Dominance Algorithm" (2001)

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{NativeSizeMapper, ShallowSizeCalculator, TotalSizeCalculator};
pub use domain::{Dominator, DominatorStats, RetainedSize};
pub use infrastructure::{DominatorTree, DominatorTreeBuilder};
pub use ports::ObjectSizeCalculator;
