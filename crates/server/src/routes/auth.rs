use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{copilot::Caller, db::User, error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: usize,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    // Check if user already exists
    if state.db.get_user_by_email(&req.email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }

    if req.password.len() < 6 {
        return Err(AppError::BadRequest("Password must be at least 6 characters".to_string()));
    }

    // Hash password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .to_string();

    // Create user
    let user_id = Uuid::new_v4().to_string();
    let user = User {
        id: user_id.clone(),
        email: req.email,
        password_hash,
        created_at: None,
    };
    state.db.create_user(&user).await?;
    tracing::info!("User registered: {}", user_id);

    // Generate token
    let token = generate_token(&user_id, &state.config.auth)?;

    Ok(Json(AuthResponse { token, user_id }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    // Find user
    let user = state
        .db
        .get_user_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::AuthError("Invalid email or password".to_string()))?;

    // Generate token
    let token = generate_token(&user.id, &state.config.auth)?;

    Ok(Json(AuthResponse {
        token,
        user_id: user.id,
    }))
}

pub(crate) fn generate_token(user_id: &str, auth_config: &crate::config::AuthConfig) -> Result<String, AppError> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(auth_config.token_expiry_hours as i64))
        .ok_or_else(|| AppError::Internal("Failed to calculate expiration".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(auth_config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
        &jsonwebtoken::Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::AuthError(e.to_string()))
}

/// Caller identity from an optional bearer token.
///
/// No `Authorization` header means an anonymous caller; a header that is not a
/// valid bearer token is rejected.
pub struct CurrentCaller(pub Caller);

impl CurrentCaller {
    /// User id of a logged-in caller, or an auth error
    pub fn require_user(&self) -> Result<&str, AppError> {
        self.0
            .user_id()
            .ok_or_else(|| AppError::AuthError("Login required".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(CurrentCaller(Caller::Anonymous));
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::AuthError("Missing or invalid Authorization header".to_string()))?;

        let claims = verify_token(bearer.token(), &state.config.auth.jwt_secret)?;
        Ok(CurrentCaller(Caller::user(claims.sub)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{app, send};
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn issued_tokens_verify_with_the_same_secret() {
        let config = crate::config::AuthConfig {
            jwt_secret: "secret".to_string(),
            token_expiry_hours: 1,
        };
        let token = generate_token("alice", &config).unwrap();

        assert_eq!(verify_token(&token, "secret").unwrap().sub, "alice");
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[tokio::test]
    async fn register_then_login() {
        let (app, _state) = app(|_| {}).await;
        let credentials = json!({ "email": "alice@example.com", "password": "hunter22" });

        let (status, registered) = send(&app, "POST", "/auth/register", None, Some(credentials.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "POST", "/auth/register", None, Some(credentials.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, logged_in) = send(&app, "POST", "/auth/login", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(logged_in["user_id"], registered["user_id"]);

        let wrong = json!({ "email": "alice@example.com", "password": "wrong-password" });
        let (status, _) = send(&app, "POST", "/auth/login", None, Some(wrong)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_bearer_token_is_rejected() {
        let (app, _state) = app(|config| config.copilot.anonymous_access = true).await;

        let (status, _) = send(&app, "GET", "/copilot/workspaces/ws", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/copilot/workspaces/ws", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
