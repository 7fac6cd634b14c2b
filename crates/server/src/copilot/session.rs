use anyhow::Result;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use shared::{ChatMessage, CopilotHistories, CreateChatSessionInput, MessageRole};
use uuid::Uuid;

use super::traits::SessionStore;
use super::types::{HistoryOptions, SessionFilter};
use crate::db::{self, ChatSession, Database, SessionQuery};

/// Chat sessions and messages persisted in SQLite
#[derive(Clone)]
pub struct ChatSessionService {
    db: Database,
}

impl ChatSessionService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn query(user_id: &str, workspace_id: &str, filter: &SessionFilter) -> SessionQuery {
        let mut query = SessionQuery::new(user_id, workspace_id);
        query.doc_id = filter.doc_id.clone();
        query.action = filter.action;
        query
    }

    fn to_message(row: db::ChatMessage) -> Option<ChatMessage> {
        let Some(role) = MessageRole::parse(&row.role) else {
            tracing::warn!("Skipping message {} with unknown role {}", row.id, row.role);
            return None;
        };
        let attachments: Vec<String> = serde_json::from_str(&row.attachments).unwrap_or_else(|e| {
            tracing::warn!("Invalid attachments on message {}: {}", row.id, e);
            Vec::new()
        });
        Some(ChatMessage {
            role,
            content: row.content,
            attachments,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl SessionStore for ChatSessionService {
    async fn count_sessions(&self, user_id: &str, workspace_id: &str, filter: &SessionFilter) -> Result<u64> {
        let count = self
            .db
            .count_chat_sessions(&Self::query(user_id, workspace_id, filter))
            .await?;
        Ok(u64::try_from(count)?)
    }

    async fn list_sessions(&self, user_id: &str, workspace_id: &str, filter: &SessionFilter) -> Result<Vec<String>> {
        let sessions = self
            .db
            .list_chat_sessions(&Self::query(user_id, workspace_id, filter))
            .await?;
        Ok(sessions.into_iter().map(|s| s.id).collect())
    }

    async fn list_histories(
        &self,
        user_id: &str,
        workspace_id: &str,
        doc_id: Option<&str>,
        options: &HistoryOptions,
    ) -> Result<Vec<CopilotHistories>> {
        let mut query = SessionQuery::new(user_id, workspace_id);
        query.doc_id = doc_id.map(str::to_string);
        query.action = options.action;
        query.session_id = options.session_id.clone();
        query.limit = options.limit;
        query.skip = options.skip;

        let sessions = self.db.list_chat_sessions(&query).await?;
        let mut histories = Vec::with_capacity(sessions.len());
        for session in sessions {
            let messages = self
                .db
                .get_messages_for_session(&session.id)
                .await?
                .into_iter()
                .filter_map(Self::to_message)
                .collect();
            histories.push(CopilotHistories {
                session_id: session.id,
                action: session.action,
                messages,
            });
        }
        Ok(histories)
    }

    async fn create(&self, input: &CreateChatSessionInput, user_id: &str) -> Result<ChatSession> {
        let session = ChatSession {
            id: Uuid::new_v4().to_string(),
            workspace_id: input.workspace_id.clone(),
            doc_id: input.doc_id.clone(),
            user_id: user_id.to_string(),
            action: input.action,
            model: input.model.as_str().to_string(),
            prompt_name: input.prompt_name.clone(),
            created_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        };
        self.db.create_chat_session(&session).await?;
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>> {
        self.db.get_chat_session(session_id).await
    }

    async fn append_message(&self, session_id: &str, message: &ChatMessage) -> Result<()> {
        let row = db::ChatMessage {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            attachments: serde_json::to_string(&message.attachments)?,
            created_at: Some(
                message
                    .created_at
                    .clone()
                    .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
            ),
        };
        self.db.save_chat_message(&row).await
    }
}
