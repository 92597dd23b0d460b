/// Domain models
///
/// - `user`: accounts and roles
/// - `event`: scheduled events
///
/// Persistence lives behind the traits in [`crate::repository`].

pub mod event;
pub mod user;

pub use event::{CreateEvent, Event};
pub use user::{CreateUser, Role, User};
