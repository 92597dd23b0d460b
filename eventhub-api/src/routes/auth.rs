/// Token endpoints
///
/// # Endpoints
///
/// - `POST /api/token/` - Exchange username and password for a token pair
/// - `POST /api/token/refresh/` - Exchange a refresh token for a new access token

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use eventhub_shared::auth::jwt::{self, TokenPair};
use serde::{Deserialize, Serialize};

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (60 minutes)
    pub access: String,
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/token/
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "secret"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "access": "eyJ...",
///   "refresh": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown username or wrong password
pub async fn obtain_token(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    let user = state
        .directory
        .authenticate(&req.username, &req.password)
        .await?;

    let pair = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    tracing::debug!(user_id = %user.id, "Issued token pair");
    Ok(Json(pair))
}

/// Token refresh endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token, or an access token
///   passed where a refresh token is expected
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access = jwt::refresh_access_token(&req.refresh, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access }))
}
