//! Path Finding Application Layer

mod path_finder;
mod shortest_path_trie;

pub use path_finder::PathFinder;
pub use shortest_path_trie::deduplicate_shortest_paths;
