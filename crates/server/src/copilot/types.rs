use shared::{CopilotQuota, QueryChatHistoriesInput};

/// Identity behind a copilot request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Authenticated { user_id: String },
    Anonymous,
}

impl Caller {
    pub fn user(user_id: impl Into<String>) -> Self {
        Caller::Authenticated {
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Caller::Authenticated { user_id } => Some(user_id),
            Caller::Anonymous => None,
        }
    }

    /// Owner id recorded on sessions; anonymous sessions are stored with an empty owner
    pub fn owner_id(&self) -> &str {
        self.user_id().unwrap_or_default()
    }
}

/// Usage of the action limit at the time it was computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    /// `None` when the user has no action limit
    pub limit: Option<u64>,
    pub used: u64,
}

impl QuotaSnapshot {
    pub fn is_exhausted(&self) -> bool {
        matches!(self.limit, Some(limit) if self.used >= limit)
    }
}

impl From<QuotaSnapshot> for CopilotQuota {
    fn from(snapshot: QuotaSnapshot) -> Self {
        CopilotQuota {
            limit: snapshot.limit,
            used: snapshot.used,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaProfile {
    pub plan: String,
    pub copilot_action_limit: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub doc_id: Option<String>,
    pub action: Option<bool>,
}

impl SessionFilter {
    pub fn actions() -> Self {
        Self {
            doc_id: None,
            action: Some(true),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryOptions {
    pub action: Option<bool>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    pub session_id: Option<String>,
}

impl From<&QueryChatHistoriesInput> for HistoryOptions {
    fn from(input: &QueryChatHistoriesInput) -> Self {
        Self {
            action: input.action,
            limit: input.limit,
            skip: input.skip,
            session_id: input.session_id.clone(),
        }
    }
}
