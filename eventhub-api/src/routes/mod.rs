/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Token obtain and refresh
/// - `users`: Registration and admin user listing
/// - `events`: Event listing, creation and signup

pub mod auth;
pub mod events;
pub mod health;
pub mod users;
