use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::db::Database;
use crate::error::PlanError;
use crate::models::*;
use crate::scaffold;
use crate::status::StatusEngine;

type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
///
/// Validation errors raised by the store (missing workspace or parent, parent
/// in another workspace) are returned as-is with a BAD_REQUEST status.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    let msg = e.to_string();

    if msg.contains("not found") || msg.contains("different workspace") {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn plan_error(e: PlanError) -> (StatusCode, String) {
    match e {
        PlanError::CycleDetected(_) => {
            tracing::error!("{}", e);
            (StatusCode::CONFLICT, e.to_string())
        }
        PlanError::Store(e) => internal_error(e),
    }
}

fn node_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Node not found".to_string())
}

fn require_node(db: &Database, id: Uuid) -> ApiResult<Node> {
    db.get_node(id)
        .map_err(internal_error)?
        .ok_or_else(node_not_found)
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Workspaces
// ============================================================

pub async fn list_workspaces(State(db): State<Database>) -> ApiResult<Json<Vec<Workspace>>> {
    db.get_all_workspaces().map(Json).map_err(internal_error)
}

pub async fn get_workspace(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Workspace>> {
    db.get_workspace(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Workspace not found".to_string()))
}

pub async fn create_workspace(
    State(db): State<Database>,
    Json(input): Json<CreateWorkspaceInput>,
) -> ApiResult<(StatusCode, Json<Workspace>)> {
    db.create_workspace(input)
        .map(|w| (StatusCode::CREATED, Json(w)))
        .map_err(internal_error)
}

pub async fn update_workspace(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateWorkspaceInput>,
) -> ApiResult<Json<Workspace>> {
    db.update_workspace(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Workspace not found".to_string()))
}

pub async fn delete_workspace(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if db.delete_workspace(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Workspace not found".to_string()))
    }
}

pub async fn list_workspace_nodes(
    State(db): State<Database>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Node>>> {
    db.get_nodes_by_workspace(workspace_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn list_root_nodes(
    State(db): State<Database>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Node>>> {
    db.get_root_nodes(workspace_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_node_tree(
    State(db): State<Database>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<Vec<NodeTreeNode>>> {
    db.get_node_tree(workspace_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_node(
    State(db): State<Database>,
    Path(workspace_id): Path<Uuid>,
    Json(input): Json<CreateNodeInput>,
) -> ApiResult<(StatusCode, Json<Node>)> {
    db.create_node(workspace_id, input)
        .map(|n| (StatusCode::CREATED, Json(n)))
        .map_err(internal_error)
}

/// Persist an externally generated plan as unconfirmed nodes under a new project.
pub async fn create_scaffold(
    State(db): State<Database>,
    Path(workspace_id): Path<Uuid>,
    Json(input): Json<ScaffoldInput>,
) -> ApiResult<(StatusCode, Json<ScaffoldResult>)> {
    db.get_workspace(workspace_id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Workspace not found".to_string()))?;

    scaffold::create_scaffold(&db, workspace_id, input)
        .map(|r| (StatusCode::CREATED, Json(r)))
        .map_err(internal_error)
}

// ============================================================
// Nodes
// ============================================================

pub async fn get_node(State(db): State<Database>, Path(id): Path<Uuid>) -> ApiResult<Json<Node>> {
    require_node(&db, id).map(Json)
}

pub async fn update_node(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateNodeInput>,
) -> ApiResult<Json<Node>> {
    db.update_node_details(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(node_not_found)
}

/// Delete a node and its subtree, then re-derive the former parent's chain.
pub async fn delete_node(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let node = require_node(&db, id)?;

    if !db.delete_node(id).map_err(internal_error)? {
        return Err(node_not_found());
    }

    if let Some(parent_id) = node.parent_id {
        StatusEngine::new(&db)
            .propagate_upward(parent_id)
            .map_err(plan_error)?;
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_children(
    State(db): State<Database>,
    Path(parent_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Node>>> {
    db.get_children(parent_id).map(Json).map_err(internal_error)
}

/// Manual status edit: pins the node and re-derives its ancestors.
pub async fn set_node_status(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<SetStatusInput>,
) -> ApiResult<Json<Node>> {
    require_node(&db, id)?;

    StatusEngine::new(&db)
        .update_status_with_propagation(id, input.status)
        .map_err(plan_error)?;

    require_node(&db, id).map(Json)
}

pub async fn enable_auto_status(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Node>> {
    require_node(&db, id)?;

    StatusEngine::new(&db)
        .enable_auto_status(id)
        .map_err(plan_error)?;

    require_node(&db, id).map(Json)
}

pub async fn toggle_critical(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Node>> {
    require_node(&db, id)?;

    StatusEngine::new(&db)
        .toggle_critical(id)
        .map_err(plan_error)?;

    require_node(&db, id).map(Json)
}

pub async fn get_progress(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Progress>> {
    require_node(&db, id)?;

    StatusEngine::new(&db)
        .get_progress(id)
        .map(Json)
        .map_err(plan_error)
}

pub async fn confirm_node(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Node>> {
    scaffold::confirm_node(&db, id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(node_not_found)
}
