//! Dominator Tree
//!
//! Nodes are numbered densely in discovery order, index 0 being the virtual
//! root that points at every GC root. Every immediate dominator is an
//! ancestor in the discovery tree, so `idom[i] < i` for all `i > 0`. That
//! ordering is what lets `intersect` walk two chains towards the root by
//! always advancing the larger index.
//!
//! Time: O(iterations × E), iterations is small on heap graphs
//! Space: O(V + E)

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::features::dominators::domain::{Dominator, DominatorStats, RetainedSize};
use crate::features::dominators::ports::ObjectSizeCalculator;
use crate::features::heap_graph::{GraphResult, HeapGraph, ObjectId};

const VIRTUAL_ROOT: u32 = 0;

/// Records discovery edges while the graph is traversed
#[derive(Debug, Clone)]
pub struct DominatorTreeBuilder {
    index_of: FxHashMap<ObjectId, u32>,
    /// Object id per index; slot 0 is unused
    ids: Vec<ObjectId>,
    /// Discovery parent per index
    parents: Vec<u32>,
    predecessors: Vec<Vec<u32>>,
    edge_count: usize,
}

impl Default for DominatorTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DominatorTreeBuilder {
    pub fn new() -> Self {
        Self {
            index_of: FxHashMap::default(),
            ids: vec![0],
            parents: vec![VIRTUAL_ROOT],
            predecessors: vec![Vec::new()],
            edge_count: 0,
        }
    }

    fn link(&mut self, from: u32, to: ObjectId) {
        let index = match self.index_of.get(&to) {
            Some(index) => *index,
            None => {
                let index = self.ids.len() as u32;
                self.index_of.insert(to, index);
                self.ids.push(to);
                self.parents.push(from);
                self.predecessors.push(Vec::new());
                index
            }
        };
        if index != VIRTUAL_ROOT && index != from {
            self.predecessors[index as usize].push(from);
            self.edge_count += 1;
        }
    }

    /// Record that a GC root keeps `object_id` alive
    pub fn add_root(&mut self, object_id: ObjectId) {
        self.link(VIRTUAL_ROOT, object_id);
    }

    /// Record an edge; `from` must already be known
    ///
    /// Returns false and ignores the edge when `from` was never recorded.
    pub fn add_edge(&mut self, from: ObjectId, to: ObjectId) -> bool {
        match self.index_of.get(&from) {
            Some(from_index) => {
                let from_index = *from_index;
                self.link(from_index, to);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, object_id: ObjectId) -> bool {
        self.index_of.contains_key(&object_id)
    }

    pub fn node_count(&self) -> usize {
        self.ids.len() - 1
    }

    /// Solve the dominance equations
    pub fn build(self) -> DominatorTree {
        let Self {
            index_of,
            ids,
            parents,
            predecessors,
            edge_count,
        } = self;

        let mut idom = parents;
        let mut iterations = 0;
        let mut changed = true;
        while changed {
            changed = false;
            iterations += 1;
            for node in 1..idom.len() {
                let mut candidate = idom[node];
                for &pred in &predecessors[node] {
                    candidate = intersect(&idom, candidate, pred);
                }
                if candidate != idom[node] {
                    idom[node] = candidate;
                    changed = true;
                }
            }
        }

        let stats = DominatorStats {
            node_count: ids.len() - 1,
            edge_count,
            iterations,
        };
        debug!(
            nodes = stats.node_count,
            edges = stats.edge_count,
            iterations = stats.iterations,
            "Dominator tree converged"
        );

        DominatorTree {
            index_of,
            ids,
            idom,
            stats,
        }
    }
}

/// Nearest common ancestor of `a` and `b` in the current dominator tree
fn intersect(idom: &[u32], mut a: u32, mut b: u32) -> u32 {
    while a != b {
        while a > b {
            a = idom[a as usize];
        }
        while b > a {
            b = idom[b as usize];
        }
    }
    a
}

/// Immediate dominators of every reachable object
#[derive(Debug, Clone)]
pub struct DominatorTree {
    index_of: FxHashMap<ObjectId, u32>,
    ids: Vec<ObjectId>,
    idom: Vec<u32>,
    stats: DominatorStats,
}

impl DominatorTree {
    pub fn stats(&self) -> &DominatorStats {
        &self.stats
    }

    pub fn immediate_dominator(&self, object_id: ObjectId) -> Dominator {
        match self.index_of.get(&object_id) {
            None => Dominator::Unreachable,
            Some(index) => match self.idom[*index as usize] {
                VIRTUAL_ROOT => Dominator::Root,
                dominator => Dominator::Object(self.ids[dominator as usize]),
            },
        }
    }

    /// All `(object, immediate dominator)` pairs in discovery order
    pub fn entries(&self) -> impl Iterator<Item = (ObjectId, Dominator)> + '_ {
        (1..self.ids.len()).map(move |index| {
            let dominator = match self.idom[index] {
                VIRTUAL_ROOT => Dominator::Root,
                d => Dominator::Object(self.ids[d as usize]),
            };
            (self.ids[index], dominator)
        })
    }

    /// Retained size of each requested object
    ///
    /// Only nodes dominated by a requested object are sized. Unreachable ids
    /// are absent from the result.
    pub fn compute_retained_sizes(
        &self,
        graph: &dyn HeapGraph,
        object_ids: &FxHashSet<ObjectId>,
        sizes: &mut dyn ObjectSizeCalculator,
    ) -> GraphResult<FxHashMap<ObjectId, RetainedSize>> {
        let node_count = self.ids.len();
        let mut in_scope = vec![false; node_count];
        for index in 1..node_count {
            in_scope[index] =
                object_ids.contains(&self.ids[index]) || in_scope[self.idom[index] as usize];
        }

        let mut retained = vec![RetainedSize::default(); node_count];
        for index in (1..node_count).rev() {
            if !in_scope[index] {
                continue;
            }
            let own = sizes.size_of(graph, self.ids[index])?;
            retained[index].add(RetainedSize {
                byte_size: own,
                object_count: 1,
            });
            let dominator = self.idom[index] as usize;
            if dominator != VIRTUAL_ROOT as usize && in_scope[dominator] {
                let subtree = retained[index];
                retained[dominator].add(subtree);
            }
        }

        Ok(object_ids
            .iter()
            .filter_map(|id| {
                self.index_of
                    .get(id)
                    .map(|index| (*id, retained[*index as usize]))
            })
            .collect())
    }
}
