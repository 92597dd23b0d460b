/// Request identity
///
/// The API's authentication layer validates the bearer token, loads the user
/// and stores an [`AuthContext`] in the request extensions. Handlers extract
/// it with `Extension<AuthContext>`.

use crate::models::{Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,

    /// Role as currently stored, not as of token issuance
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: Uuid, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self::new(user.id, user.username.clone(), user.role())
    }
}
