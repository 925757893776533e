use std::collections::HashSet;

use uuid::Uuid;

use super::{aggregate, progress, ChildStatus};
use crate::error::{PlanError, Result};
use crate::models::{NodeStatus, NodeUpdate, Progress};
use crate::store::NodeStore;

/// Applies status and criticality edits and re-derives ancestor statuses.
///
/// Every operation starts at one node and then climbs `parent_id` links,
/// recomputing each derived ancestor from its immediate children. The climb
/// stops at the root, at a missing node, at a node with no children, or at the
/// first pinned ancestor; nothing above a pinned node is touched.
///
/// # Consistency
/// Each step is an independent read followed by a write, with no transaction
/// around the walk. Two edits racing on overlapping chains can interleave and
/// leave an intermediate ancestor stale until a later edit walks through it
/// again. A store failure part-way up leaves the lower ancestors updated and
/// the rest untouched; the error is returned as-is.
pub struct StatusEngine<S> {
    store: S,
}

impl<S: NodeStore> StatusEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Manually set a node's status, pin it, and re-derive its ancestors.
    ///
    /// The node's parent is always recomputed unless the parent itself is pinned.
    pub fn update_status_with_propagation(&self, node_id: Uuid, status: NodeStatus) -> Result<()> {
        self.store.update_node(node_id, NodeUpdate::pin(status))?;

        let Some(node) = self.store.get_node(node_id)? else {
            return Ok(());
        };
        tracing::debug!(node = %node_id, %status, "pinned node status");

        match node.parent_id {
            Some(parent_id) => self.propagate_upward(parent_id),
            None => Ok(()),
        }
    }

    /// Unpin a node and immediately re-derive it (and, from there, its ancestors).
    pub fn enable_auto_status(&self, node_id: Uuid) -> Result<()> {
        self.store
            .update_node(node_id, NodeUpdate::auto_status(true))?;
        self.propagate_upward(node_id)
    }

    /// Flip whether a node counts toward its parent's status, then re-derive
    /// the parent. The node's own status is unchanged.
    pub fn toggle_critical(&self, node_id: Uuid) -> Result<()> {
        let Some(node) = self.store.get_node(node_id)? else {
            return Ok(());
        };

        self.store
            .update_node(node_id, NodeUpdate::critical(!node.is_critical))?;
        tracing::debug!(node = %node_id, is_critical = !node.is_critical, "toggled critical flag");

        match node.parent_id {
            Some(parent_id) => self.propagate_upward(parent_id),
            None => Ok(()),
        }
    }

    /// Completion counts over a node's immediate critical children.
    pub fn get_progress(&self, node_id: Uuid) -> Result<Progress> {
        let children = self.store.get_children(node_id)?;
        Ok(progress(&children))
    }

    /// Re-derive `node_id` from its children and continue up the parent chain.
    ///
    /// The edit operations call this themselves. Call it directly after
    /// changing a node's set of children some other way, such as deleting a
    /// child.
    pub fn propagate_upward(&self, node_id: Uuid) -> Result<()> {
        let mut visited = HashSet::new();
        let mut current = Some(node_id);

        while let Some(id) = current {
            if !visited.insert(id) {
                tracing::warn!(node = %id, "cycle in parent chain, aborting propagation");
                return Err(PlanError::CycleDetected(id));
            }

            let Some(node) = self.store.get_node(id)? else {
                tracing::debug!(node = %id, "node not found, stopping propagation");
                return Ok(());
            };

            if !node.is_auto() {
                tracing::debug!(node = %id, "node is pinned, stopping propagation");
                return Ok(());
            }

            let children = self.store.get_children(id)?;
            if children.is_empty() {
                return Ok(());
            }

            let summary: Vec<ChildStatus> = children.iter().map(ChildStatus::from).collect();
            let status = aggregate(&summary);
            self.store.update_node(id, NodeUpdate::derived(status))?;
            tracing::debug!(node = %id, from = %node.status(), to = %status, "derived status");

            current = node.parent_id;
        }

        Ok(())
    }
}
