//! Dominator infrastructure

mod dominator_tree;

pub use dominator_tree::{DominatorTree, DominatorTreeBuilder};
