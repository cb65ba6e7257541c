//! Dense node ids for task ids.
//!
//! The graph stores adjacency in plain vectors indexed by node id; this maps
//! the caller's string ids onto those indices and back.

use rustc_hash::FxHashMap;

/// Index of a task in the graph arena.
pub type NodeId = u32;

/// Task ids in insertion order plus a reverse lookup.
#[derive(Debug, Clone, Default)]
pub struct TaskIdInterner {
    ids: Vec<String>,
    lookup: FxHashMap<String, NodeId>,
}

impl TaskIdInterner {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            lookup: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Register a task id. `None` when the id is already registered.
    pub fn insert_new(&mut self, task_id: &str) -> Option<NodeId> {
        if self.lookup.contains_key(task_id) {
            return None;
        }
        let node = self.ids.len() as NodeId;
        self.lookup.insert(task_id.to_owned(), node);
        self.ids.push(task_id.to_owned());
        Some(node)
    }

    #[inline]
    pub fn get(&self, task_id: &str) -> Option<NodeId> {
        self.lookup.get(task_id).copied()
    }

    /// Task id of a node. Panics on a node this interner never issued.
    #[inline]
    pub fn resolve(&self, node: NodeId) -> &str {
        &self.ids[node as usize]
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
