/// Persistence interface
///
/// Every component receives its storage as an explicit `Arc<dyn …>` handle
/// instead of reaching for a global database connection. Two implementations
/// are provided:
///
/// - [`PgRepository`]: PostgreSQL via sqlx, used by the binaries
/// - [`InMemoryRepository`]: lock-guarded maps, used by tests and demos
///
/// # Signup uniqueness
///
/// [`EventRepository::add_signup`] is an idempotent set-insert. Implementations
/// must guarantee that concurrent calls for the same `(event, user)` pair leave
/// exactly one membership row. The Postgres implementation relies on the
/// composite primary key of `event_signups` with `ON CONFLICT DO NOTHING`.
///
/// # Example
///
/// ```
/// use eventhub_shared::repository::{EventRepository, InMemoryRepository};
/// use eventhub_shared::models::CreateEvent;
/// use chrono::{Duration, Utc};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = InMemoryRepository::new();
/// let event = repo
///     .create_event(CreateEvent {
///         name: "Rust meetup".to_string(),
///         meeting_time: Utc::now() + Duration::days(1),
///     })
///     .await?;
/// assert_eq!(repo.count_signups(event.id).await?, 0);
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

use crate::models::{CreateEvent, CreateUser, Event, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A uniqueness constraint was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A referenced row does not exist
    #[error("Missing reference: {0}")]
    MissingReference(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository result type alias
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// User Directory storage
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user; fails with `Conflict` if the username is taken
    async fn create_user(&self, data: CreateUser) -> RepositoryResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;

    /// All users, oldest first
    async fn list_users(&self) -> RepositoryResult<Vec<User>>;

    async fn count_users(&self) -> RepositoryResult<i64>;
}

/// Event Catalog and Signup Ledger storage
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create_event(&self, data: CreateEvent) -> RepositoryResult<Event>;

    async fn find_event_by_id(&self, id: i64) -> RepositoryResult<Option<Event>>;

    /// Events with `meeting_time > now`, ascending by meeting time
    async fn list_events_after(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Event>>;

    /// Events with `from <= meeting_time < to`, ascending by meeting time
    async fn list_events_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Event>>;

    /// Adds the user to the event's signup set
    ///
    /// Returns `true` if a membership row was inserted and `false` if the user
    /// was already signed up. Never produces a duplicate.
    async fn add_signup(&self, event_id: i64, user_id: Uuid) -> RepositoryResult<bool>;

    async fn is_signed_up(&self, event_id: i64, user_id: Uuid) -> RepositoryResult<bool>;

    /// Events the user signed up for, with no time filter
    async fn list_events_for_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Event>>;

    /// Users in the event's signup set
    async fn list_signed_up_users(&self, event_id: i64) -> RepositoryResult<Vec<User>>;

    async fn count_signups(&self, event_id: i64) -> RepositoryResult<i64>;
}

/// Storage liveness probe for health checks
#[async_trait]
pub trait StorageHealth: Send + Sync {
    async fn ping(&self) -> RepositoryResult<()>;
}

/// Everything a process needs from storage
pub trait Repository: UserRepository + EventRepository + StorageHealth {}

impl<T> Repository for T where T: UserRepository + EventRepository + StorageHealth {}
