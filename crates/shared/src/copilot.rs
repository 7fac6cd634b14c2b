use serde::{Deserialize, Serialize};

// ============================================================================
// Models
// ============================================================================

/// Models a session may be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailableModel {
    #[serde(rename = "gpt-4-vision-preview")]
    Gpt4VisionPreview,
    #[serde(rename = "gpt-4-turbo-preview")]
    Gpt4TurboPreview,
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[serde(rename = "text-embedding-3-large")]
    TextEmbedding3Large,
    #[serde(rename = "text-embedding-3-small")]
    TextEmbedding3Small,
    #[serde(rename = "text-embedding-ada-002")]
    TextEmbeddingAda002,
    #[serde(rename = "text-moderation-latest")]
    TextModerationLatest,
    #[serde(rename = "text-moderation-stable")]
    TextModerationStable,
    #[serde(rename = "dall-e-3")]
    DallE3,
}

impl AvailableModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailableModel::Gpt4VisionPreview => "gpt-4-vision-preview",
            AvailableModel::Gpt4TurboPreview => "gpt-4-turbo-preview",
            AvailableModel::Gpt35Turbo => "gpt-3.5-turbo",
            AvailableModel::TextEmbedding3Large => "text-embedding-3-large",
            AvailableModel::TextEmbedding3Small => "text-embedding-3-small",
            AvailableModel::TextEmbeddingAda002 => "text-embedding-ada-002",
            AvailableModel::TextModerationLatest => "text-moderation-latest",
            AvailableModel::TextModerationStable => "text-moderation-stable",
            AvailableModel::DallE3 => "dall-e-3",
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// Request body for creating a chat session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatSessionInput {
    pub workspace_id: String,
    pub doc_id: String,
    /// Action sessions are billed against the copilot action limit
    pub action: bool,
    pub model: AvailableModel,
    pub prompt_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatSessionResponse {
    pub session_id: String,
}

/// Copilot entry point for a workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopilotInfo {
    pub workspace_id: String,
}

/// Usage of the copilot action limit. `limit` is absent when unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopilotQuota {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    pub used: u64,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
