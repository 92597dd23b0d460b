/// Role checks
///
/// Admin vs regular is a capability question answered by [`has_role`], not a
/// type hierarchy. Anything that knows its role (a stored [`User`] or a
/// request's [`AuthContext`]) implements [`HasRole`].
///
/// # Example
///
/// ```
/// use eventhub_shared::auth::authorization::{has_role, require_role};
/// use eventhub_shared::auth::context::AuthContext;
/// use eventhub_shared::models::Role;
/// use uuid::Uuid;
///
/// let ctx = AuthContext::new(Uuid::new_v4(), "user", Role::Regular);
/// assert!(!has_role(&ctx, Role::Admin));
/// assert!(require_role(&ctx, Role::Regular).is_ok());
/// ```

use super::context::AuthContext;
use crate::models::{Role, User};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Subject lacks the required role
    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole { required: Role, actual: Role },
}

/// Something that acts with a role
pub trait HasRole {
    fn role(&self) -> Role;
}

impl HasRole for User {
    fn role(&self) -> Role {
        User::role(self)
    }
}

impl HasRole for AuthContext {
    fn role(&self) -> Role {
        self.role
    }
}

/// True if `subject` holds `role`
///
/// Admins hold every role; regular users hold only `Regular`.
pub fn has_role<S: HasRole + ?Sized>(subject: &S, role: Role) -> bool {
    match (subject.role(), role) {
        (Role::Admin, _) => true,
        (Role::Regular, Role::Regular) => true,
        (Role::Regular, Role::Admin) => false,
    }
}

/// Fails with [`AuthzError::InsufficientRole`] unless `subject` holds `role`
pub fn require_role<S: HasRole + ?Sized>(subject: &S, role: Role) -> Result<(), AuthzError> {
    if has_role(subject, role) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            required: role,
            actual: subject.role(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_admin_holds_every_role() {
        let admin = AuthContext::new(Uuid::new_v4(), "admin", Role::Admin);
        assert!(has_role(&admin, Role::Admin));
        assert!(has_role(&admin, Role::Regular));
    }

    #[test]
    fn test_regular_user_is_not_admin() {
        let user = AuthContext::new(Uuid::new_v4(), "user", Role::Regular);
        assert!(has_role(&user, Role::Regular));
        assert!(matches!(
            require_role(&user, Role::Admin),
            Err(AuthzError::InsufficientRole {
                required: Role::Admin,
                actual: Role::Regular
            })
        ));
    }
}
