/// User Directory
///
/// Registration, credential checks, admin-only listing and admin
/// provisioning over a [`UserRepository`].
///
/// # Registration policy
///
/// By default registration is lenient: an empty username, a malformed email or
/// a two-character password are all accepted and the account is created. This
/// matches the behaviour clients already depend on. Deployments that want
/// server-side validation opt into [`RegistrationPolicy::Strict`], which
/// applies `validator` rules and rejects bad input with
/// [`DirectoryError::Invalid`]. Username uniqueness is enforced under both
/// policies.

use crate::auth::authorization::{require_role, HasRole};
use crate::auth::password::{self, PasswordError};
use crate::models::{CreateUser, Role, User};
use crate::repository::{RepositoryError, UserRepository};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// How registration input is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationPolicy {
    /// Accept any input; only username uniqueness is checked
    #[default]
    Lenient,

    /// Validate username, email and password before creating the account
    Strict,
}

/// Registration input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error type for directory operations
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Username already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rejected by strict registration
    #[error("Invalid registration: {} field errors", .0.len())]
    Invalid(Vec<FieldError>),

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Requester lacks the admin role
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for DirectoryError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => DirectoryError::Conflict(msg),
            other => DirectoryError::Repository(other),
        }
    }
}

/// Outcome of admin provisioning
#[derive(Debug, Clone)]
pub enum Provisioned {
    Created(User),

    /// A user with that username already existed and was left unchanged
    Existing(User),
}

/// Account management
#[derive(Clone)]
pub struct UserDirectory {
    users: Arc<dyn UserRepository>,
    policy: RegistrationPolicy,
}

impl UserDirectory {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self::with_policy(users, RegistrationPolicy::default())
    }

    pub fn with_policy(users: Arc<dyn UserRepository>, policy: RegistrationPolicy) -> Self {
        Self { users, policy }
    }

    /// Creates a regular user
    pub async fn register(&self, registration: Registration) -> Result<User, DirectoryError> {
        if self.policy == RegistrationPolicy::Strict {
            registration.validate().map_err(|e| {
                DirectoryError::Invalid(
                    e.field_errors()
                        .iter()
                        .flat_map(|(field, errors)| {
                            errors.iter().map(move |error| FieldError {
                                field: field.to_string(),
                                message: error
                                    .message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| "Validation failed".to_string()),
                            })
                        })
                        .collect(),
                )
            })?;
        }

        let user = self
            .create(registration.username, registration.email, &registration.password, false)
            .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Checks a username/password pair
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, DirectoryError> {
        let user = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or(DirectoryError::InvalidCredentials)?;

        if !password::verify_password(password, &user.password_hash)? {
            warn!(username = %username, "Failed login attempt");
            return Err(DirectoryError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Every user; admin only
    pub async fn list_all<R: HasRole + ?Sized>(&self, requester: &R) -> Result<Vec<User>, DirectoryError> {
        require_role(requester, Role::Admin)
            .map_err(|e| DirectoryError::Forbidden(e.to_string()))?;

        Ok(self.users.list_users().await?)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<User>, DirectoryError> {
        Ok(self.users.find_user_by_id(id).await?)
    }

    /// Ensures an admin account with `username` exists
    pub async fn provision_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Provisioned, DirectoryError> {
        if let Some(existing) = self.users.find_user_by_username(username).await? {
            if !existing.is_admin {
                warn!(username = %username, "Provisioning skipped: user exists without admin role");
            }
            return Ok(Provisioned::Existing(existing));
        }

        let user = self
            .create(username.to_string(), email.to_string(), password, true)
            .await?;

        info!(user_id = %user.id, username = %user.username, "Admin user provisioned");
        Ok(Provisioned::Created(user))
    }

    async fn create(
        &self,
        username: String,
        email: String,
        password: &str,
        is_admin: bool,
    ) -> Result<User, DirectoryError> {
        let password_hash = password::hash_password(password)?;

        Ok(self
            .users
            .create_user(CreateUser {
                username,
                email,
                password_hash,
                is_admin,
            })
            .await?)
    }
}
