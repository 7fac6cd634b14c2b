use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Workspace {
    pub id: String,
    pub owner_id: String,
    pub created_at: Option<String>,
}

/// Per-user quota profile. A NULL limit means unlimited actions.
#[derive(Debug, Clone, FromRow)]
pub struct UserQuota {
    pub user_id: String,
    pub plan: String,
    pub copilot_action_limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ChatSession {
    pub id: String,
    pub workspace_id: String,
    pub doc_id: String,
    /// Empty for sessions created anonymously
    pub user_id: String,
    pub action: bool,
    pub model: String,
    pub prompt_name: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    /// JSON array of attachment URLs
    pub attachments: String,
    pub created_at: Option<String>,
}
