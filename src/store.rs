//! Node persistence seam used by the status engine.
//!
//! The engine only needs three calls from whatever keeps the nodes: a lookup by
//! id, the immediate children of a node, and a partial write. [`Database`]
//! implements it over SQLite; [`MemoryStore`] keeps everything in a map keyed
//! by id plus a parent index.
//!
//! [`Database`]: crate::db::Database

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{CreateNodeInput, Node, NodeUpdate, StatusSource};

pub trait NodeStore {
    /// Look up a node by id.
    fn get_node(&self, id: Uuid) -> Result<Option<Node>>;

    /// Immediate children of `parent_id`, in no particular order.
    fn get_children(&self, parent_id: Uuid) -> Result<Vec<Node>>;

    /// Write the `Some` fields of `update`. Returns `false` if the node does not exist.
    fn update_node(&self, id: Uuid, update: NodeUpdate) -> Result<bool>;
}

impl<T: NodeStore + ?Sized> NodeStore for &T {
    fn get_node(&self, id: Uuid) -> Result<Option<Node>> {
        (**self).get_node(id)
    }

    fn get_children(&self, parent_id: Uuid) -> Result<Vec<Node>> {
        (**self).get_children(parent_id)
    }

    fn update_node(&self, id: Uuid, update: NodeUpdate) -> Result<bool> {
        (**self).update_node(id, update)
    }
}

/// Apply a partial write to an in-memory node.
pub(crate) fn apply_update(node: &mut Node, update: NodeUpdate) {
    let status = update.status.unwrap_or(node.status());
    let auto_status = update.auto_status.unwrap_or(node.is_auto());
    node.status_source = StatusSource::from_parts(status, auto_status);
    if let Some(is_critical) = update.is_critical {
        node.is_critical = is_critical;
    }
    if let Some(confirmed) = update.confirmed {
        node.confirmed = confirmed;
    }
    node.updated_at = Utc::now();
}

#[derive(Default)]
struct MemoryInner {
    nodes: HashMap<Uuid, Node>,
    children: HashMap<Uuid, Vec<Uuid>>,
}

/// Node store backed by a `HashMap` keyed by id and a parent-id index.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node as-is, indexing it under its parent.
    pub fn insert(&self, node: Node) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        if let Some(parent_id) = node.parent_id {
            let siblings = inner.children.entry(parent_id).or_default();
            if !siblings.contains(&node.id) {
                siblings.push(node.id);
            }
        }
        inner.nodes.insert(node.id, node);
    }

    /// Create a node the same way the SQLite store does: the parent must exist
    /// and `path`/`depth` are derived from it.
    pub fn create_node(&self, workspace_id: Uuid, input: CreateNodeInput) -> Result<Node> {
        let parent = match input.parent_id {
            Some(parent_id) => Some(
                self.get_node(parent_id)?
                    .ok_or_else(|| anyhow::anyhow!("Parent node not found"))?,
            ),
            None => None,
        };
        let node = Node::new(workspace_id, parent.as_ref(), input);
        self.insert(node.clone());
        Ok(node)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("store lock poisoned").nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NodeStore for MemoryStore {
    fn get_node(&self, id: Uuid) -> Result<Option<Node>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.nodes.get(&id).cloned())
    }

    fn get_children(&self, parent_id: Uuid) -> Result<Vec<Node>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let children = inner
            .children
            .get(&parent_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.nodes.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(children)
    }

    fn update_node(&self, id: Uuid, update: NodeUpdate) -> Result<bool> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        match inner.nodes.get_mut(&id) {
            Some(node) => {
                apply_update(node, update);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
