/// PostgreSQL repository
///
/// Thin sqlx implementation of the repository traits. Constraint violations
/// are translated into [`RepositoryError`] variants so callers never inspect
/// driver errors.
///
/// # Example
///
/// ```no_run
/// use eventhub_shared::db::pool::{create_pool, DatabaseConfig};
/// use eventhub_shared::repository::{PgRepository, UserRepository};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(&DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
///
/// let repo = PgRepository::new(pool);
/// println!("{} users", repo.count_users().await?);
/// # Ok(())
/// # }
/// ```

use super::{
    EventRepository, RepositoryError, RepositoryResult, StorageHealth, UserRepository,
};
use crate::models::{CreateEvent, CreateUser, Event, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::error::ErrorKind;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password_hash, is_admin, created_at";
const EVENT_COLUMNS: &str = "id, name, meeting_time, created_at";

/// Repository backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps constraint violations onto repository errors
fn map_write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.kind() {
            ErrorKind::UniqueViolation => {
                let constraint = db_err.constraint().unwrap_or("unique constraint");
                if constraint.contains("username") {
                    return RepositoryError::Conflict("Username already exists".to_string());
                }
                return RepositoryError::Conflict(format!("Constraint violation: {}", constraint));
            }
            ErrorKind::ForeignKeyViolation => {
                let constraint = db_err.constraint().unwrap_or("foreign key");
                return RepositoryError::MissingReference(constraint.to_string());
            }
            _ => {}
        }
    }
    RepositoryError::Database(err)
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn create_user(&self, data: CreateUser) -> RepositoryResult<User> {
        let query = format!(
            "INSERT INTO users (id, username, email, password_hash, is_admin) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(data.username)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.is_admin)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn find_user_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self) -> RepositoryResult<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, username ASC");
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn count_users(&self) -> RepositoryResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl EventRepository for PgRepository {
    async fn create_event(&self, data: CreateEvent) -> RepositoryResult<Event> {
        let query = format!(
            "INSERT INTO events (name, meeting_time) VALUES ($1, $2) RETURNING {EVENT_COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(data.name)
            .bind(data.meeting_time)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn find_event_by_id(&self, id: i64) -> RepositoryResult<Option<Event>> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let event = sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn list_events_after(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Event>> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE meeting_time > $1 ORDER BY meeting_time ASC, id ASC"
        );
        let events = sqlx::query_as::<_, Event>(&query)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn list_events_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Event>> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE meeting_time >= $1 AND meeting_time < $2 \
             ORDER BY meeting_time ASC, id ASC"
        );
        let events = sqlx::query_as::<_, Event>(&query)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn add_signup(&self, event_id: i64, user_id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO event_signups (event_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (event_id, user_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn is_signed_up(&self, event_id: i64, user_id: Uuid) -> RepositoryResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM event_signups WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_events_for_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT e.id, e.name, e.meeting_time, e.created_at
            FROM events e
            JOIN event_signups s ON s.event_id = e.id
            WHERE s.user_id = $1
            ORDER BY e.meeting_time ASC, e.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn list_signed_up_users(&self, event_id: i64) -> RepositoryResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.is_admin, u.created_at
            FROM users u
            JOIN event_signups s ON s.user_id = u.id
            WHERE s.event_id = $1
            ORDER BY s.created_at ASC, u.username ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn count_signups(&self, event_id: i64) -> RepositoryResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM event_signups WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

#[async_trait]
impl StorageHealth for PgRepository {
    async fn ping(&self) -> RepositoryResult<()> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }
}
