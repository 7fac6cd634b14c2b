use serde::{Deserialize, Serialize};

// ============================================================================
// Chat messages
// ============================================================================

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    Assistant,
    User,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::Assistant => "assistant",
            MessageRole::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "system" => Some(MessageRole::System),
            "assistant" => Some(MessageRole::Assistant),
            "user" => Some(MessageRole::User),
            _ => None,
        }
    }
}

/// A single message inside a chat session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Request body for appending a message to a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendMessageInput {
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

// ============================================================================
// Histories
// ============================================================================

/// A session together with its messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopilotHistories {
    pub session_id: String,
    pub action: bool,
    pub messages: Vec<ChatMessage>,
}

impl CopilotHistories {
    /// Number of messages written by the user
    pub fn user_message_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count()
    }
}

/// Query options for listing histories
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryChatHistoriesInput {
    #[serde(default)]
    pub doc_id: Option<String>,
    #[serde(default)]
    pub action: Option<bool>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub skip: Option<u32>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_use_lowercase_names() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        assert_eq!(MessageRole::parse("user"), Some(MessageRole::User));
        assert_eq!(MessageRole::parse("tool"), None);
    }

    #[test]
    fn counts_only_user_messages() {
        let history = CopilotHistories {
            session_id: "s1".to_string(),
            action: false,
            messages: vec![
                ChatMessage {
                    role: MessageRole::System,
                    content: "be brief".to_string(),
                    attachments: vec![],
                    created_at: None,
                },
                ChatMessage {
                    role: MessageRole::User,
                    content: "hi".to_string(),
                    attachments: vec![],
                    created_at: None,
                },
                ChatMessage {
                    role: MessageRole::Assistant,
                    content: "hello".to_string(),
                    attachments: vec![],
                    created_at: None,
                },
                ChatMessage {
                    role: MessageRole::User,
                    content: "summarize".to_string(),
                    attachments: vec![],
                    created_at: None,
                },
            ],
        };
        assert_eq!(history.user_message_count(), 2);
    }
}
