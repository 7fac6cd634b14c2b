use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod auth;
mod copilot;
mod health;
mod workspaces;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth routes
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        // Workspaces
        .route("/workspaces", post(workspaces::create_workspace))
        .route("/workspaces/:workspace_id/members", post(workspaces::add_member))
        // Copilot
        .route("/copilot/workspaces/:workspace_id", get(copilot::copilot))
        .route("/copilot/workspaces/:workspace_id/quota", get(copilot::quota))
        .route("/copilot/workspaces/:workspace_id/chats", get(copilot::chats))
        .route("/copilot/workspaces/:workspace_id/actions", get(copilot::actions))
        .route("/copilot/workspaces/:workspace_id/histories", get(copilot::histories))
        .route("/copilot/sessions", post(copilot::create_session))
        .route("/copilot/sessions/:session_id/messages", post(copilot::append_message))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
