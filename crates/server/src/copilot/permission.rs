use async_trait::async_trait;

use super::error::CopilotError;
use super::traits::PermissionChecker;
use crate::db::Database;

/// Workspace membership and per-doc grants backed by the database
#[derive(Clone)]
pub struct PermissionService {
    db: Database,
}

impl PermissionService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PermissionChecker for PermissionService {
    async fn check_workspace(&self, workspace_id: &str, user_id: &str) -> Result<(), CopilotError> {
        if self.db.is_workspace_member(workspace_id, user_id).await? {
            return Ok(());
        }
        Err(CopilotError::Forbidden(format!(
            "You do not have permission to access workspace {}",
            workspace_id
        )))
    }

    async fn check_doc(&self, workspace_id: &str, doc_id: &str, user_id: &str) -> Result<(), CopilotError> {
        if self.db.is_workspace_member(workspace_id, user_id).await?
            || self.db.has_doc_grant(workspace_id, doc_id, user_id).await?
        {
            return Ok(());
        }
        Err(CopilotError::Forbidden(format!(
            "You do not have permission to access doc {} in workspace {}",
            doc_id, workspace_id
        )))
    }
}
