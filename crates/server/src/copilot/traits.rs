//! Collaborators the copilot service depends on.

use anyhow::Result;
use async_trait::async_trait;
use shared::{ChatMessage, CopilotHistories, CreateChatSessionInput};
use std::fmt;

use super::error::CopilotError;
use super::types::{HistoryOptions, QuotaProfile, SessionFilter};
use crate::db::ChatSession;

#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn check_workspace(&self, workspace_id: &str, user_id: &str) -> Result<(), CopilotError>;

    async fn check_doc(&self, workspace_id: &str, doc_id: &str, user_id: &str) -> Result<(), CopilotError>;
}

#[async_trait]
pub trait QuotaProvider: Send + Sync {
    async fn get_user_quota(&self, user_id: &str) -> Result<QuotaProfile>;
}

/// Persistence for chat sessions and their messages.
/// `user_id` is the session owner; anonymous sessions use an empty owner.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn count_sessions(&self, user_id: &str, workspace_id: &str, filter: &SessionFilter) -> Result<u64>;

    async fn list_sessions(&self, user_id: &str, workspace_id: &str, filter: &SessionFilter) -> Result<Vec<String>>;

    async fn list_histories(
        &self,
        user_id: &str,
        workspace_id: &str,
        doc_id: Option<&str>,
        options: &HistoryOptions,
    ) -> Result<Vec<CopilotHistories>>;

    async fn create(&self, input: &CreateChatSessionInput, user_id: &str) -> Result<ChatSession>;

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>>;

    async fn append_message(&self, session_id: &str, message: &ChatMessage) -> Result<()>;
}

#[async_trait]
pub trait LockService: Send + Sync {
    /// Returns `None` when the lock could not be obtained in time
    async fn acquire(&self, key: &str) -> Option<LockGuard>;
}

pub trait FeatureFlags: Send + Sync {
    fn copilot_anonymous_access_enabled(&self) -> bool;
}

/// Held lock. Released exactly once, when the guard is dropped.
pub struct LockGuard {
    key: String,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockGuard {
    pub fn new(key: impl Into<String>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            key: key.into(),
            release: Some(Box::new(release)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
            tracing::debug!("Lock released: {}", self.key());
        }
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").field("key", &self.key).finish()
    }
}
