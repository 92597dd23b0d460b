/// User endpoints
///
/// - `POST /api/users/` - Register (public)
/// - `GET /api/users/` - List every user (admin)

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use eventhub_shared::{
    auth::{context::AuthContext, jwt},
    directory::Registration,
    models::User,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Register request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Register response
///
/// Carries a token pair so a new client can call authenticated endpoints
/// straight away.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,

    /// Access token (60 minutes)
    pub access: String,

    /// Refresh token (1 day)
    pub refresh: String,
}

/// Public view of a user; the password hash never leaves the server
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

/// Register a new regular user
///
/// # Endpoint
///
/// ```text
/// POST /api/users/
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "secret"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Username already exists
/// - `422 Unprocessable Entity`: Rejected input (strict registration only)
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let user = state
        .directory
        .register(Registration {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;

    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            access: tokens.access,
            refresh: tokens.refresh,
        }),
    ))
}

/// List every user
///
/// # Errors
///
/// - `401 Unauthorized`: No valid token
/// - `403 Forbidden`: Caller is not an admin
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state.directory.list_all(&auth).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}
