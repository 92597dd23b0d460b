/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a health check
/// - `migrations`: embedded sqlx migrations
///
/// Queries live in [`crate::repository::PgRepository`].

pub mod migrations;
pub mod pool;
