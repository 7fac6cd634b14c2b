//! Copilot endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::{
    AppendMessageInput, CopilotHistories, CopilotInfo, CopilotQuota, CreateChatSessionInput,
    CreateChatSessionResponse, QueryChatHistoriesInput,
};

use super::auth::CurrentCaller;
use crate::{copilot::HistoryOptions, error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct QuotaParams {
    pub doc_id: String,
}

/// GET /copilot/workspaces/:workspace_id
pub async fn copilot(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(workspace_id): Path<String>,
) -> Result<Json<CopilotInfo>, AppError> {
    let info = state.copilot.copilot(&workspace_id, &caller).await?;
    Ok(Json(info))
}

/// GET /copilot/workspaces/:workspace_id/quota?doc_id=
pub async fn quota(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(workspace_id): Path<String>,
    Query(params): Query<QuotaParams>,
) -> Result<Json<CopilotQuota>, AppError> {
    let quota = state
        .copilot
        .quota(&workspace_id, &params.doc_id, &caller)
        .await?;
    Ok(Json(quota.into()))
}

/// GET /copilot/workspaces/:workspace_id/chats
pub async fn chats(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(workspace_id): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.copilot.chats(&workspace_id, &caller).await?))
}

/// GET /copilot/workspaces/:workspace_id/actions
pub async fn actions(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(workspace_id): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.copilot.actions(&workspace_id, &caller).await?))
}

/// GET /copilot/workspaces/:workspace_id/histories
pub async fn histories(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(workspace_id): Path<String>,
    Query(query): Query<QueryChatHistoriesInput>,
) -> Result<Json<Vec<CopilotHistories>>, AppError> {
    let options = HistoryOptions::from(&query);
    let histories = state
        .copilot
        .histories(&workspace_id, query.doc_id.as_deref(), &options, &caller)
        .await?;
    Ok(Json(histories))
}

/// Create a chat session
/// POST /copilot/sessions
pub async fn create_session(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Json(req): Json<CreateChatSessionInput>,
) -> Result<Json<CreateChatSessionResponse>, AppError> {
    let session = state.copilot.create_session(&req, &caller).await?;
    Ok(Json(CreateChatSessionResponse {
        session_id: session.id,
    }))
}

/// POST /copilot/sessions/:session_id/messages
pub async fn append_message(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(session_id): Path<String>,
    Json(req): Json<AppendMessageInput>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .copilot
        .append_message(&session_id, req, &caller)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use crate::db::{UserQuota, Workspace};
    use crate::routes::test_support::{app, send, token_for};
    use crate::state::AppState;
    use axum::http::StatusCode;
    use serde_json::json;

    async fn create_workspace(state: &AppState, workspace_id: &str, owner_id: &str) {
        state
            .db
            .create_workspace(&Workspace {
                id: workspace_id.to_string(),
                owner_id: owner_id.to_string(),
                created_at: None,
            })
            .await
            .unwrap();
    }

    fn session_body(action: bool) -> serde_json::Value {
        json!({
            "workspace_id": "ws",
            "doc_id": "doc",
            "action": action,
            "model": "gpt-4-turbo-preview",
            "prompt_name": "summary",
        })
    }

    #[tokio::test]
    async fn anonymous_creation_needs_the_flag() {
        let (router, _state) = app(|_| {}).await;
        let (status, body) = send(&router, "POST", "/copilot/sessions", None, Some(session_body(false))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Login required");

        let (router, _state) = app(|config| config.copilot.anonymous_access = true).await;
        let (status, body) = send(&router, "POST", "/copilot/sessions", None, Some(session_body(false))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["session_id"].is_string());
    }

    #[tokio::test]
    async fn action_limit_returns_payment_required() {
        let (app, state) = app(|_| {}).await;
        create_workspace(&state, "ws", "alice").await;
        state
            .db
            .set_user_quota(&UserQuota {
                user_id: "alice".to_string(),
                plan: "free".to_string(),
                copilot_action_limit: Some(1),
            })
            .await
            .unwrap();
        let token = token_for(&state, "alice");

        let (status, _) = send(&app, "POST", "/copilot/sessions", Some(&token), Some(session_body(true))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, quota) = send(&app, "GET", "/copilot/workspaces/ws/quota?doc_id=doc", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quota, json!({ "limit": 1, "used": 1 }));

        let (status, body) = send(&app, "POST", "/copilot/sessions", Some(&token), Some(session_body(true))).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert!(body["error"].as_str().unwrap().contains("reached the limit"));

        // Plain chats are not metered
        let (status, _) = send(&app, "POST", "/copilot/sessions", Some(&token), Some(session_body(false))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, chats) = send(&app, "GET", "/copilot/workspaces/ws/chats", Some(&token), None).await;
        let (_, actions) = send(&app, "GET", "/copilot/workspaces/ws/actions", Some(&token), None).await;
        assert_eq!(chats.as_array().unwrap().len(), 2);
        assert_eq!(actions.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn histories_include_appended_messages() {
        let (app, state) = app(|_| {}).await;
        create_workspace(&state, "ws", "alice").await;
        let alice = token_for(&state, "alice");
        let bob = token_for(&state, "bob");

        let (_, created) = send(&app, "POST", "/copilot/sessions", Some(&alice), Some(session_body(false))).await;
        let session_id = created["session_id"].as_str().unwrap().to_string();
        let uri = format!("/copilot/sessions/{}/messages", session_id);

        let message = json!({ "role": "user", "content": "what is this doc about?" });
        let (status, _) = send(&app, "POST", &uri, Some(&alice), Some(message.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "POST", &uri, Some(&bob), Some(message)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, histories) = send(
            &app,
            "GET",
            "/copilot/workspaces/ws/histories?doc_id=doc&action=false",
            Some(&alice),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(histories[0]["session_id"], session_id.as_str());
        assert_eq!(histories[0]["messages"][0]["role"], "user");

        let (status, _) = send(&app, "GET", "/copilot/workspaces/ws/histories", Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn workspace_reads_are_forbidden_to_non_members() {
        let (app, state) = app(|_| {}).await;
        create_workspace(&state, "ws", "alice").await;
        let bob = token_for(&state, "bob");

        for uri in [
            "/copilot/workspaces/ws",
            "/copilot/workspaces/ws/quota?doc_id=doc",
            "/copilot/workspaces/ws/chats",
            "/copilot/workspaces/ws/actions",
        ] {
            let (status, _) = send(&app, "GET", uri, Some(&bob), None).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        }

        // Creating a session is not gated on membership
        let (status, _) = send(&app, "POST", "/copilot/sessions", Some(&bob), Some(session_body(true))).await;
        assert_eq!(status, StatusCode::OK);
    }
}
