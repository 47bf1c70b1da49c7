//! Path finding domain model

use std::sync::Arc;

use crate::features::dominators::DominatorTree;
use crate::features::heap_graph::{GcRoot, ObjectId};
use crate::features::reference_reader::{LibraryLeakReferenceMatcher, Reference};

/// Index of a node in a [`PathNodeArena`]
pub type NodeIndex = u32;

/// Start of a path: an object held by a GC root
#[derive(Debug, Clone, PartialEq)]
pub struct RootNode {
    pub object_id: ObjectId,
    pub gc_root: GcRoot,
    /// Set when the root itself matched a library-leak pattern
    pub library_leak: Option<Arc<LibraryLeakReferenceMatcher>>,
}

/// An object reached through `reference` from the node at `parent`
#[derive(Debug, Clone, PartialEq)]
pub struct ChildNode {
    pub object_id: ObjectId,
    pub parent: NodeIndex,
    pub reference: Reference,
}

/// Node of the breadth-first search tree
#[derive(Debug, Clone, PartialEq)]
pub enum ReferencePathNode {
    Root(RootNode),
    Child(ChildNode),
}

impl ReferencePathNode {
    pub fn object_id(&self) -> ObjectId {
        match self {
            Self::Root(root) => root.object_id,
            Self::Child(child) => child.object_id,
        }
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        match self {
            Self::Root(_) => None,
            Self::Child(child) => Some(child.parent),
        }
    }
}

/// Append-only storage for search-tree nodes
#[derive(Debug, Clone, Default)]
pub struct PathNodeArena {
    nodes: Vec<ReferencePathNode>,
}

impl PathNodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: ReferencePathNode) -> NodeIndex {
        let index = self.nodes.len() as NodeIndex;
        self.nodes.push(node);
        index
    }

    pub fn get(&self, index: NodeIndex) -> Option<&ReferencePathNode> {
        self.nodes.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Object ids from the root down to `index`
    pub fn object_ids(&self, index: NodeIndex) -> Vec<ObjectId> {
        let mut ids = Vec::new();
        let mut next = Some(index);
        while let Some(current) = next.and_then(|i| self.get(i)) {
            ids.push(current.object_id());
            next = current.parent();
        }
        ids.reverse();
        ids
    }

    /// Walk parents up to the root and materialize the path
    ///
    /// Returns `None` if the chain is broken, which only happens for an index
    /// that was not produced by this arena.
    pub fn shortest_path(&self, index: NodeIndex) -> Option<ShortestPath> {
        let mut children = Vec::new();
        let mut current = self.get(index)?;
        loop {
            match current {
                ReferencePathNode::Root(root) => {
                    children.reverse();
                    return Some(ShortestPath {
                        root: root.clone(),
                        children,
                    });
                }
                ReferencePathNode::Child(child) => {
                    children.push(child.clone());
                    current = self.get(child.parent)?;
                }
            }
        }
    }
}

/// Root plus the ordered children leading to a leaking object
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    pub root: RootNode,
    pub children: Vec<ChildNode>,
}

impl ShortestPath {
    pub fn leaking_object_id(&self) -> ObjectId {
        self.children
            .last()
            .map(|child| child.object_id)
            .unwrap_or(self.root.object_id)
    }

    /// Object ids from root to leaking object
    pub fn object_ids(&self) -> Vec<ObjectId> {
        std::iter::once(self.root.object_id)
            .chain(self.children.iter().map(|child| child.object_id))
            .collect()
    }

    /// The first library-leak matcher met walking down from the root
    pub fn first_library_leak(&self) -> Option<&Arc<LibraryLeakReferenceMatcher>> {
        self.root.library_leak.as_ref().or_else(|| {
            self.children
                .iter()
                .find_map(|child| child.reference.matched_library_leak.as_ref())
        })
    }
}

/// Output of a path finder run
#[derive(Debug)]
pub struct PathFindingResults {
    pub arena: PathNodeArena,
    /// One node per reachable leaking object, in discovery order
    pub paths_to_leaking_objects: Vec<NodeIndex>,
    /// Present only when retained sizes were requested
    pub dominator_tree: Option<DominatorTree>,
}

impl PathFindingResults {
    pub fn shortest_paths(&self) -> Vec<ShortestPath> {
        self.paths_to_leaking_objects
            .iter()
            .filter_map(|index| self.arena.shortest_path(*index))
            .collect()
    }
}
