//! Authentication service routes
//!
//! Thin HTTP glue over the core: validation and JSON mapping live here,
//! all authentication decisions live in the resolver and repositories.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use crate::authcode::cookie_value;
use crate::models::NewUser;
use crate::password::{hash_password, verify_password};
use crate::repositories::{CreateUserError, default_session_ttl};
use crate::resolver::bearer_token;

const SESSION_COOKIE: &str = "session";

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Response for user registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for user login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Response for the current-user endpoint
#[derive(Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/user/register", post(register))
        .route("/api/user/login", post(login))
        .route("/api/user/logout", post(logout))
        .route("/api/user/me", get(me))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse + std::fmt::Debug, AuthError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AuthError::Validation(
            "username and password are required".to_string(),
        ));
    }

    info!("Registration attempt for user: {}", payload.username);

    // proactive duplicate check; the unique constraint on users.username
    // still backstops the race between concurrent registrations
    if state
        .users
        .find_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(AuthError::Conflict);
    }

    let new_user = NewUser {
        username: payload.username,
        password_hash: hash_password(&payload.password),
    };

    let user = state.users.create(&new_user).await.map_err(|e| match e {
        CreateUserError::DuplicateUsername => AuthError::Conflict,
        CreateUserError::Database(e) => AuthError::Internal(e.into()),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id: user.id }),
    ))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse + std::fmt::Debug, AuthError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AuthError::Validation(
            "username and password are required".to_string(),
        ));
    }

    info!("Login attempt for user: {}", payload.username);

    // unknown user and wrong password collapse into the same 401
    let user = state
        .users
        .find_by_username(&payload.username)
        .await?
        .filter(|user| verify_password(&payload.password, &user.password_hash))
        .ok_or(AuthError::Unauthorized)?;

    let session = state
        .sessions
        .create(user.id, default_session_ttl())
        .await
        .map_err(AuthError::Internal)?;

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session.token
    );

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token: session.token,
            user_id: user.id,
            expires_at: session.expires_at,
        }),
    ))
}

/// Logout endpoint
///
/// Destroys the caller's session if one is presented (bearer header or
/// session cookie) and clears the cookie. Always succeeds: logging out
/// without a live session is not an error.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    if let Some(token) = session_token(&headers) {
        state
            .sessions
            .destroy(&token)
            .await
            .map_err(AuthError::Internal)?;
    }

    let clear_cookie = format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, clear_cookie)],
        Json(serde_json::json!({"success": true})),
    ))
}

/// Current-user endpoint
///
/// Unauthenticated callers get 401 with `{"user": null}` rather than the
/// error envelope, which is what existing clients parse.
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AuthError> {
    let Some(identity) = state
        .resolver
        .resolve_session(&headers)
        .await
        .map_err(AuthError::Internal)?
    else {
        return Ok(no_user_response());
    };

    let Some(user) = state.users.find_by_id(identity.user_id).await? else {
        return Ok(no_user_response());
    };

    Ok(Json(MeResponse {
        id: user.id,
        username: user.username,
        role: user.role,
        created_at: user.created_at,
    })
    .into_response())
}

fn no_user_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"user": null})),
    )
        .into_response()
}

/// The session token presented by the caller: bearer header first, then
/// the session cookie set at login
fn session_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers)
        .map(str::to_string)
        .or_else(|| cookie_value(headers, SESSION_COOKIE))
}

/// Custom error type for authentication endpoints
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("user already exists")]
    Conflict,

    #[error("invalid credentials")]
    Unauthorized,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            AuthError::Conflict => (StatusCode::CONFLICT, self.to_string()),
            // one generic message for every failed factor
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
