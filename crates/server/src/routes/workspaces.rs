//! Workspace membership endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::CurrentCaller;
use crate::{db::Workspace, error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct CreateWorkspaceResponse {
    pub workspace_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: String,
    /// Grant access to a single doc instead of the whole workspace
    #[serde(default)]
    pub doc_id: Option<String>,
}

/// Create a workspace owned by the caller
/// POST /workspaces
pub async fn create_workspace(
    State(state): State<AppState>,
    caller: CurrentCaller,
) -> Result<Json<CreateWorkspaceResponse>, AppError> {
    let owner_id = caller.require_user()?;

    let workspace = Workspace {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        created_at: None,
    };
    state.db.create_workspace(&workspace).await?;
    tracing::info!("Workspace {} created by {}", workspace.id, owner_id);

    Ok(Json(CreateWorkspaceResponse {
        workspace_id: workspace.id,
    }))
}

/// Add a member to a workspace, or grant access to one of its docs
/// POST /workspaces/:workspace_id/members
pub async fn add_member(
    State(state): State<AppState>,
    caller: CurrentCaller,
    Path(workspace_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = caller.require_user()?;

    // Verify user owns the workspace
    let workspace = state
        .db
        .get_workspace(&workspace_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Workspace not found".to_string()))?;
    if workspace.owner_id != user_id {
        return Err(AppError::Forbidden(
            "Only the workspace owner can add members".to_string(),
        ));
    }

    match &req.doc_id {
        Some(doc_id) => {
            state.db.grant_doc_access(&workspace_id, doc_id, &req.user_id).await?;
            tracing::info!("Granted {} access to doc {} in {}", req.user_id, doc_id, workspace_id);
        }
        None => {
            state.db.add_workspace_member(&workspace_id, &req.user_id).await?;
            tracing::info!("Added {} to workspace {}", req.user_id, workspace_id);
        }
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
