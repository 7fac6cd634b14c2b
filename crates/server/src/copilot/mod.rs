//! Copilot chat sessions: creation gated by login, lock and quota.

mod error;
mod mutex;
mod permission;
mod quota;
mod service;
mod session;
mod traits;
mod types;

use std::sync::Arc;

use crate::config::CopilotConfig;
use crate::db::Database;
use mutex::MutexService;
use permission::PermissionService;
use quota::QuotaService;
use session::ChatSessionService;
use traits::FeatureFlags;

pub use error::CopilotError;
pub use service::CopilotService;
pub use types::{Caller, HistoryOptions};

impl FeatureFlags for CopilotConfig {
    fn copilot_anonymous_access_enabled(&self) -> bool {
        self.anonymous_access
    }
}

impl CopilotService {
    /// Wire the service to the database-backed collaborators
    pub fn from_config(db: Database, config: &CopilotConfig) -> Self {
        Self::new(
            Arc::new(PermissionService::new(db.clone())),
            Arc::new(QuotaService::new(db.clone(), config.default_action_limit)),
            Arc::new(MutexService::new(&config.lock)),
            Arc::new(ChatSessionService::new(db)),
            Arc::new(config.clone()),
        )
    }
}
