/// Event endpoints
///
/// - `GET /api/events/` - Upcoming events (public)
/// - `POST /api/events/` - Create an event (admin)
/// - `GET /api/events/my/` - Events the caller signed up for
/// - `POST /api/event/:id/` - Sign the caller up

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use eventhub_shared::{
    auth::{authorization::require_role, context::AuthContext},
    models::{Event, Role},
};
use serde::{Deserialize, Serialize};

/// Event as returned to clients
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: i64,
    pub name: String,
    pub meeting_time: DateTime<Utc>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            meeting_time: event.meeting_time,
        }
    }
}

/// Create event request
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,

    /// RFC 3339 timestamp
    pub meeting_time: DateTime<Utc>,
}

/// Signup response
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub detail: String,
    pub event_id: i64,

    /// False when the caller was already signed up
    pub newly_added: bool,
}

/// Upcoming events, soonest first
pub async fn list_events(State(state): State<AppState>) -> ApiResult<Json<Vec<EventResponse>>> {
    let events = state.catalog.list_upcoming().await?;

    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

/// Create an event
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `422 Unprocessable Entity`: Blank name
pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<EventResponse>)> {
    require_role(&auth, Role::Admin)?;

    let event = state.catalog.create_event(req.name, req.meeting_time).await?;

    Ok((StatusCode::CREATED, Json(event.into())))
}

/// Events the caller signed up for, past ones included
pub async fn my_events(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<EventResponse>>> {
    let events = state.catalog.list_mine(auth.user_id).await?;

    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

/// Sign the caller up for a future event
///
/// Signing up twice succeeds both times.
///
/// # Errors
///
/// - `404 Not Found`: No such event, or the event is not in the future
pub async fn signup(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<SignupResponse>> {
    let event_id: i64 = id
        .parse()
        .map_err(|_| ApiError::NotFound(format!("Event {} not found", id)))?;

    let outcome = state.catalog.signup(event_id, auth.user_id).await?;

    let detail = if outcome.newly_added {
        "Signed up for event"
    } else {
        "Already signed up for event"
    };

    Ok(Json(SignupResponse {
        detail: detail.to_string(),
        event_id: outcome.event.id,
        newly_added: outcome.newly_added,
    }))
}
