/// Authentication and authorization
///
/// - `jwt`: access/refresh token issuance and validation
/// - `password`: Argon2id hashing
/// - `authorization`: `has_role` capability checks
/// - `context`: the authenticated caller attached to a request

pub mod authorization;
pub mod context;
pub mod jwt;
pub mod password;

pub use authorization::{has_role, require_role, AuthzError, HasRole};
pub use context::AuthContext;
