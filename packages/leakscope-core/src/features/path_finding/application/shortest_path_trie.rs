//! Shortest-path deduplication
//!
//! Paths are inserted into a prefix trie keyed by object id. A path ends in a
//! leaf at its full length; a later path with the same sequence replaces the
//! earlier leaf. A path that runs through an existing leaf is dropped, since
//! it reaches its object through another leaking object already reported.
//! A path ending on an existing inner node replaces that whole subtree for
//! the same reason.

use rustc_hash::FxHashMap;

use crate::features::heap_graph::ObjectId;
use crate::features::path_finding::domain::ShortestPath;

enum TrieNode {
    Parent {
        children: Vec<usize>,
        index: FxHashMap<ObjectId, usize>,
    },
    Leaf(usize),
}

impl TrieNode {
    fn parent() -> Self {
        Self::Parent {
            children: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

struct ShortestPathTrie {
    nodes: Vec<TrieNode>,
}

impl ShortestPathTrie {
    fn new() -> Self {
        Self {
            nodes: vec![TrieNode::parent()],
        }
    }

    fn insert(&mut self, object_ids: &[ObjectId], path_index: usize) {
        let mut current = 0;
        for (depth, object_id) in object_ids.iter().enumerate() {
            let is_last = depth + 1 == object_ids.len();
            let existing = match &self.nodes[current] {
                TrieNode::Parent { index, .. } => index.get(object_id).copied(),
                TrieNode::Leaf(_) => return,
            };
            let next = match existing {
                Some(slot) if is_last => {
                    self.nodes[slot] = TrieNode::Leaf(path_index);
                    return;
                }
                Some(slot) => slot,
                None => {
                    let slot = self.nodes.len();
                    self.nodes.push(if is_last {
                        TrieNode::Leaf(path_index)
                    } else {
                        TrieNode::parent()
                    });
                    if let TrieNode::Parent { children, index } = &mut self.nodes[current] {
                        children.push(slot);
                        index.insert(*object_id, slot);
                    }
                    if is_last {
                        return;
                    }
                    slot
                }
            };
            if matches!(self.nodes[next], TrieNode::Leaf(_)) {
                return;
            }
            current = next;
        }
    }

    /// Path indices of every leaf, depth-first in insertion order
    fn leaves(&self) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![0];
        while let Some(slot) = stack.pop() {
            match &self.nodes[slot] {
                TrieNode::Leaf(path_index) => leaves.push(*path_index),
                TrieNode::Parent { children, .. } => stack.extend(children.iter().rev()),
            }
        }
        leaves
    }
}

/// Collapse paths with identical object sequences
///
/// Output order follows the trie: depth-first, children in insertion order.
pub fn deduplicate_shortest_paths(paths: Vec<ShortestPath>) -> Vec<ShortestPath> {
    let mut trie = ShortestPathTrie::new();
    for (path_index, path) in paths.iter().enumerate() {
        trie.insert(&path.object_ids(), path_index);
    }
    let mut slots: Vec<Option<ShortestPath>> = paths.into_iter().map(Some).collect();
    trie.leaves()
        .into_iter()
        .filter_map(|path_index| slots[path_index].take())
        .collect()
}
