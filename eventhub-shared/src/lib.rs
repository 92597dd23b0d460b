//! # EventHub Shared Library
//!
//! Domain core used by both the API server and the reminder worker.
//!
//! ## Module Organization
//!
//! - `models`: users and events
//! - `repository`: storage traits with Postgres and in-memory implementations
//! - `catalog`: event listing, signup rules and the signup ledger
//! - `directory`: registration, login checks and admin-only user listing
//! - `auth`: JWT, password hashing, role checks
//! - `db`: connection pool and migrations
//! - `telemetry`: tracing setup

pub mod auth;
pub mod catalog;
pub mod db;
pub mod directory;
pub mod models;
pub mod repository;
pub mod telemetry;

