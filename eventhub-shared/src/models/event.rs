/// Event model
///
/// An event has a fixed meeting time and a signup set of users (see
/// `event_signups`). Whether an event is "future" is computed against the
/// clock at query time and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scheduled event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    /// Event ID (BIGSERIAL)
    pub id: i64,

    /// Display name
    pub name: String,

    /// When the event takes place
    pub meeting_time: DateTime<Utc>,

    /// When the event was created
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// True if the meeting time is strictly after `now`
    pub fn is_future_at(&self, now: DateTime<Utc>) -> bool {
        self.meeting_time > now
    }
}

/// Input for creating a new event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEvent {
    pub name: String,
    pub meeting_time: DateTime<Utc>,
}
