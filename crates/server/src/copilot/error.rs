use thiserror::Error;

#[derive(Debug, Error)]
pub enum CopilotError {
    #[error("Login required")]
    LoginRequired,

    #[error("{0}")]
    Forbidden(String),

    #[error("Chat session not found")]
    SessionNotFound,

    #[error("Server is busy")]
    Busy,

    #[error("You have reached the limit of actions in this workspace, please upgrade your plan.")]
    QuotaExceeded,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
