//! Persisting externally generated plans as ghost nodes.
//!
//! A scaffold is a proposed tree produced outside this crate (typically by a
//! language model). The project root is created as a regular, confirmed node;
//! everything beneath it is `ai_suggested` and unconfirmed until someone
//! accepts it with [`confirm_node`].

use anyhow::Result;
use uuid::Uuid;

use crate::db::Database;
use crate::models::*;

/// Confidence assigned to a suggested node at `depth` (the project root is depth 0).
pub fn confidence_for_depth(depth: u32) -> f64 {
    let confidence = 0.95 - 0.05 * f64::from(depth);
    (confidence * 100.0).round().max(50.0) / 100.0
}

/// Create the project root and every proposed node beneath it.
///
/// Only a failure to create the project root is an error. A proposed node
/// that cannot be created is skipped along with its subtree, and the rest of
/// the plan is still written.
pub fn create_scaffold(
    db: &Database,
    workspace_id: Uuid,
    input: ScaffoldInput,
) -> Result<ScaffoldResult> {
    build_scaffold(input, |node| db.create_node(workspace_id, node))
}

fn build_scaffold<F>(input: ScaffoldInput, mut create: F) -> Result<ScaffoldResult>
where
    F: FnMut(CreateNodeInput) -> Result<Node>,
{
    let project = create(CreateNodeInput {
        node_type: Some(NodeType::Project),
        name: input.project_name,
        description: input.summary,
        ..CreateNodeInput::default()
    })?;

    let mut created_node_ids = Vec::new();
    for proposed in &input.nodes {
        create_proposed_recursive(&mut create, &project, proposed, &mut created_node_ids);
    }

    tracing::info!(
        project = %project.id,
        ghost_nodes = created_node_ids.len(),
        "created scaffold"
    );

    Ok(ScaffoldResult {
        project,
        created_node_ids,
    })
}

fn create_proposed_recursive<F>(
    create: &mut F,
    parent: &Node,
    proposed: &ProposedNode,
    created_ids: &mut Vec<Uuid>,
) where
    F: FnMut(CreateNodeInput) -> Result<Node>,
{
    let result = create(CreateNodeInput {
        parent_id: Some(parent.id),
        node_type: proposed.node_type,
        name: proposed.name.clone(),
        description: proposed.description.clone(),
        is_critical: Some(proposed.is_critical),
        ai_suggested: true,
        ai_confidence: Some(confidence_for_depth(parent.depth + 1)),
        ..CreateNodeInput::default()
    });

    let node = match result {
        Ok(node) => node,
        Err(e) => {
            tracing::warn!(
                parent = %parent.id,
                name = %proposed.name,
                error = %e,
                "skipping proposed node"
            );
            return;
        }
    };

    created_ids.push(node.id);

    for child in &proposed.children {
        create_proposed_recursive(create, &node, child, created_ids);
    }
}

/// Accept a ghost node. Returns the updated node, or `None` if it does not exist.
pub fn confirm_node(db: &Database, id: Uuid) -> Result<Option<Node>> {
    if !db.update_node(id, NodeUpdate::confirmed(true))? {
        return Ok(None);
    }
    db.get_node(id)
}
