use shared::{AppendMessageInput, ChatMessage, CopilotHistories, CopilotInfo, CreateChatSessionInput};
use std::sync::Arc;

use super::error::CopilotError;
use super::traits::{FeatureFlags, LockService, PermissionChecker, QuotaProvider, SessionStore};
use super::types::{Caller, HistoryOptions, QuotaSnapshot, SessionFilter};
use crate::db::ChatSession;

/// Lock key serializing session creation for one user in one workspace
fn session_lock_key(caller: &Caller, workspace_id: &str) -> String {
    format!("session:{}:{}", caller.owner_id(), workspace_id)
}

/// Copilot operations: session creation gated by login, lock and quota, plus
/// the read side (quota, session lists, histories).
#[derive(Clone)]
pub struct CopilotService {
    permissions: Arc<dyn PermissionChecker>,
    quota: Arc<dyn QuotaProvider>,
    mutex: Arc<dyn LockService>,
    sessions: Arc<dyn SessionStore>,
    flags: Arc<dyn FeatureFlags>,
}

impl CopilotService {
    pub fn new(
        permissions: Arc<dyn PermissionChecker>,
        quota: Arc<dyn QuotaProvider>,
        mutex: Arc<dyn LockService>,
        sessions: Arc<dyn SessionStore>,
        flags: Arc<dyn FeatureFlags>,
    ) -> Self {
        Self {
            permissions,
            quota,
            mutex,
            sessions,
            flags,
        }
    }

    fn ensure_allowed(&self, caller: &Caller) -> Result<(), CopilotError> {
        if matches!(caller, Caller::Anonymous) && !self.flags.copilot_anonymous_access_enabled() {
            return Err(CopilotError::LoginRequired);
        }
        Ok(())
    }

    // Members only; anonymous callers need the flag
    async fn ensure_workspace_access(&self, workspace_id: &str, caller: &Caller) -> Result<(), CopilotError> {
        match caller {
            Caller::Authenticated { user_id } => self.permissions.check_workspace(workspace_id, user_id).await,
            Caller::Anonymous => self.ensure_allowed(caller),
        }
    }

    /// Copilot entry for a workspace
    pub async fn copilot(&self, workspace_id: &str, caller: &Caller) -> Result<CopilotInfo, CopilotError> {
        self.ensure_workspace_access(workspace_id, caller).await?;
        Ok(CopilotInfo {
            workspace_id: workspace_id.to_string(),
        })
    }

    /// Action usage of the caller on a doc. Anonymous callers always see zero usage.
    pub async fn quota(&self, workspace_id: &str, doc_id: &str, caller: &Caller) -> Result<QuotaSnapshot, CopilotError> {
        self.ensure_workspace_access(workspace_id, caller).await?;
        match caller {
            Caller::Authenticated { user_id } => self.user_quota(user_id, workspace_id, doc_id).await,
            Caller::Anonymous => Ok(QuotaSnapshot { limit: None, used: 0 }),
        }
    }

    // Action sessions and user-authored chat messages both count against the action limit
    async fn user_quota(&self, user_id: &str, workspace_id: &str, doc_id: &str) -> Result<QuotaSnapshot, CopilotError> {
        let profile = self.quota.get_user_quota(user_id).await?;

        let filter = SessionFilter {
            doc_id: Some(doc_id.to_string()),
            action: Some(true),
        };
        let actions = self.sessions.count_sessions(user_id, workspace_id, &filter).await?;
        let chats: u64 = self
            .sessions
            .list_histories(user_id, workspace_id, Some(doc_id), &HistoryOptions::default())
            .await?
            .iter()
            .map(|history| history.user_message_count() as u64)
            .sum();
        tracing::debug!(
            "Quota for {} in {}/{}: {} actions + {} chats (plan: {})",
            user_id,
            workspace_id,
            doc_id,
            actions,
            chats,
            profile.plan
        );

        Ok(QuotaSnapshot {
            limit: profile.copilot_action_limit,
            used: actions + chats,
        })
    }

    /// Chat session ids of the caller in a workspace
    pub async fn chats(&self, workspace_id: &str, caller: &Caller) -> Result<Vec<String>, CopilotError> {
        self.ensure_workspace_access(workspace_id, caller).await?;
        let ids = self
            .sessions
            .list_sessions(caller.owner_id(), workspace_id, &SessionFilter::default())
            .await?;
        Ok(ids)
    }

    /// Action session ids of the caller in a workspace
    pub async fn actions(&self, workspace_id: &str, caller: &Caller) -> Result<Vec<String>, CopilotError> {
        self.ensure_workspace_access(workspace_id, caller).await?;
        let ids = self
            .sessions
            .list_sessions(caller.owner_id(), workspace_id, &SessionFilter::actions())
            .await?;
        Ok(ids)
    }

    pub async fn histories(
        &self,
        workspace_id: &str,
        doc_id: Option<&str>,
        options: &HistoryOptions,
        caller: &Caller,
    ) -> Result<Vec<CopilotHistories>, CopilotError> {
        match (caller, doc_id) {
            (Caller::Authenticated { user_id }, Some(doc_id)) => {
                self.permissions.check_doc(workspace_id, doc_id, user_id).await?;
            }
            (Caller::Authenticated { user_id }, None) => {
                self.permissions.check_workspace(workspace_id, user_id).await?;
            }
            (Caller::Anonymous, _) => self.ensure_allowed(caller)?,
        }

        let histories = self
            .sessions
            .list_histories(caller.owner_id(), workspace_id, doc_id, options)
            .await?;
        Ok(histories)
    }

    /// Create a chat session.
    ///
    /// Runs login check, per-(user, workspace) lock, quota check and insert in
    /// that order. The quota check and the insert happen under the lock so two
    /// concurrent requests cannot both pass the limit. The lock is released when
    /// `_lock` drops, on every return path and on cancellation.
    pub async fn create_session(&self, input: &CreateChatSessionInput, caller: &Caller) -> Result<ChatSession, CopilotError> {
        self.ensure_allowed(caller)?;

        let key = session_lock_key(caller, &input.workspace_id);
        let Some(_lock) = self.mutex.acquire(&key).await else {
            tracing::warn!("Could not acquire session lock {}", key);
            return Err(CopilotError::Busy);
        };

        if let (true, Caller::Authenticated { user_id }) = (input.action, caller) {
            let quota = self.user_quota(user_id, &input.workspace_id, &input.doc_id).await?;
            if quota.is_exhausted() {
                tracing::info!(
                    "User {} reached the action limit in workspace {} ({}/{:?})",
                    user_id,
                    input.workspace_id,
                    quota.used,
                    quota.limit
                );
                return Err(CopilotError::QuotaExceeded);
            }
        }

        let session = self.sessions.create(input, caller.owner_id()).await?;
        tracing::info!(
            "Chat session created: {} (workspace: {}, doc: {}, action: {})",
            session.id,
            session.workspace_id,
            session.doc_id,
            session.action
        );
        Ok(session)
    }

    /// Append a message to a session owned by the caller
    pub async fn append_message(
        &self,
        session_id: &str,
        input: AppendMessageInput,
        caller: &Caller,
    ) -> Result<(), CopilotError> {
        self.ensure_allowed(caller)?;

        let session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or(CopilotError::SessionNotFound)?;
        if session.user_id != caller.owner_id() {
            return Err(CopilotError::Forbidden(
                "You can only write to your own sessions".to_string(),
            ));
        }

        let message = ChatMessage {
            role: input.role,
            content: input.content,
            attachments: input.attachments,
            created_at: None,
        };
        self.sessions.append_message(session_id, &message).await?;
        Ok(())
    }
}
