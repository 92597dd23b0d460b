/// Event Catalog and Signup Ledger
///
/// [`EventCatalog`] owns the two time-gated rules:
///
/// 1. Listing shows only future events (`meeting_time > now`).
/// 2. Signup is allowed only for future events. A past event is reported as
///    [`CatalogError::NotFound`], exactly like a missing one, so callers
///    cannot tell the two apart.
///
/// [`SignupLedger`] is the many-to-many relation between users and events. It
/// is not its own store: it reads and writes through the same
/// [`EventRepository`] as the catalog.
///
/// # Example
///
/// ```
/// use eventhub_shared::catalog::EventCatalog;
/// use eventhub_shared::repository::{InMemoryRepository, UserRepository};
/// use eventhub_shared::models::CreateUser;
/// use chrono::{Duration, Utc};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = Arc::new(InMemoryRepository::new());
/// let user = repo
///     .create_user(CreateUser {
///         username: "user".to_string(),
///         email: "user@example.com".to_string(),
///         password_hash: "hash".to_string(),
///         is_admin: false,
///     })
///     .await?;
///
/// let catalog = EventCatalog::new(repo.clone());
/// let event = catalog
///     .create_event("Future Event", Utc::now() + Duration::days(1))
///     .await?;
///
/// catalog.signup(event.id, user.id).await?;
/// assert_eq!(catalog.list_mine(user.id).await?.len(), 1);
/// # Ok(())
/// # }
/// ```

use crate::models::{CreateEvent, Event, User};
use crate::repository::{EventRepository, RepositoryError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Error type for catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Event does not exist, or is not in the future
    #[error("Event {0} not found")]
    NotFound(i64),

    /// Event input rejected
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result of a successful signup
#[derive(Debug, Clone)]
pub struct SignupOutcome {
    pub event: Event,

    /// False when the user was already in the signup set
    pub newly_added: bool,
}

/// Event listing and signup rules
#[derive(Clone)]
pub struct EventCatalog {
    events: Arc<dyn EventRepository>,
}

impl EventCatalog {
    pub fn new(events: Arc<dyn EventRepository>) -> Self {
        Self { events }
    }

    /// Signup relation over the same storage
    pub fn ledger(&self) -> SignupLedger {
        SignupLedger::new(self.events.clone())
    }

    /// Future events, soonest first
    pub async fn list_upcoming(&self) -> Result<Vec<Event>, CatalogError> {
        self.list_upcoming_at(Utc::now()).await
    }

    /// Future events relative to `now`
    pub async fn list_upcoming_at(&self, now: DateTime<Utc>) -> Result<Vec<Event>, CatalogError> {
        Ok(self.events.list_events_after(now).await?)
    }

    /// Signs a user up for a future event
    ///
    /// Repeating the call is a no-op that still succeeds.
    pub async fn signup(&self, event_id: i64, user_id: Uuid) -> Result<SignupOutcome, CatalogError> {
        self.signup_at(event_id, user_id, Utc::now()).await
    }

    /// [`EventCatalog::signup`] evaluated at `now`
    pub async fn signup_at(
        &self,
        event_id: i64,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<SignupOutcome, CatalogError> {
        let event = self
            .events
            .find_event_by_id(event_id)
            .await?
            .filter(|event| event.is_future_at(now))
            .ok_or(CatalogError::NotFound(event_id))?;

        let newly_added = self.ledger().add(event.id, user_id).await?;

        if newly_added {
            info!(event_id, user_id = %user_id, "User signed up for event");
        } else {
            debug!(event_id, user_id = %user_id, "User already signed up for event");
        }

        Ok(SignupOutcome { event, newly_added })
    }

    /// Every event the user signed up for, past ones included
    pub async fn list_mine(&self, user_id: Uuid) -> Result<Vec<Event>, CatalogError> {
        Ok(self.ledger().events_for(user_id).await?)
    }

    /// Creates an event; the name must not be blank
    pub async fn create_event(
        &self,
        name: impl Into<String>,
        meeting_time: DateTime<Utc>,
    ) -> Result<Event, CatalogError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CatalogError::InvalidEvent(
                "Event name must not be blank".to_string(),
            ));
        }

        let event = self
            .events
            .create_event(CreateEvent { name, meeting_time })
            .await?;

        info!(event_id = event.id, meeting_time = %event.meeting_time, "Event created");
        Ok(event)
    }
}

/// Users-to-events relation
#[derive(Clone)]
pub struct SignupLedger {
    events: Arc<dyn EventRepository>,
}

impl SignupLedger {
    pub fn new(events: Arc<dyn EventRepository>) -> Self {
        Self { events }
    }

    /// Membership test
    pub async fn contains(&self, event_id: i64, user_id: Uuid) -> Result<bool, RepositoryError> {
        self.events.is_signed_up(event_id, user_id).await
    }

    /// Idempotent set-insert; true if the membership is new
    pub async fn add(&self, event_id: i64, user_id: Uuid) -> Result<bool, RepositoryError> {
        self.events.add_signup(event_id, user_id).await
    }

    /// Reverse lookup: events containing the user
    pub async fn events_for(&self, user_id: Uuid) -> Result<Vec<Event>, RepositoryError> {
        self.events.list_events_for_user(user_id).await
    }

    /// The event's signup set
    pub async fn members(&self, event_id: i64) -> Result<Vec<User>, RepositoryError> {
        self.events.list_signed_up_users(event_id).await
    }
}
