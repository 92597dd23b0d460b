/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An in-memory storage backend
/// - Seeded admin, regular user and events
/// - JWT token generation
/// - A request helper that returns status and JSON body

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use eventhub_api::app::{build_router, AppState};
use eventhub_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use eventhub_shared::auth::jwt::issue_token_pair;
use eventhub_shared::directory::{Provisioned, Registration, RegistrationPolicy};
use eventhub_shared::models::{CreateEvent, Event, User};
use eventhub_shared::repository::{EventRepository, InMemoryRepository};
use serde_json::Value;
use std::sync::Arc;
use tower::Service as _;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing all necessary resources
pub struct TestContext {
    pub repo: Arc<InMemoryRepository>,
    pub app: axum::Router,
    pub admin: User,
    pub user: User,
    pub admin_token: String,
    pub user_token: String,
    pub future_event: Event,
    pub past_event: Event,
}

pub fn test_config(policy: RegistrationPolicy) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            registration_policy: policy,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
        },
        admin: None,
    }
}

impl TestContext {
    /// Lenient registration, one admin, one regular user, one past and one
    /// future event
    pub async fn new() -> Self {
        Self::with_policy(RegistrationPolicy::Lenient).await
    }

    pub async fn with_policy(policy: RegistrationPolicy) -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let state = AppState::new(repo.clone(), test_config(policy));

        let admin = match state
            .directory
            .provision_admin("admin", "admin@example.com", "admin1")
            .await
            .unwrap()
        {
            Provisioned::Created(user) => user,
            Provisioned::Existing(user) => user,
        };

        let user = state
            .directory
            .register(Registration {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "alice-password".to_string(),
            })
            .await
            .unwrap();

        let future_event = repo
            .create_event(CreateEvent {
                name: "Rust meetup".to_string(),
                meeting_time: Utc::now() + Duration::days(3),
            })
            .await
            .unwrap();

        let past_event = repo
            .create_event(CreateEvent {
                name: "Last year's meetup".to_string(),
                meeting_time: Utc::now() - Duration::days(3),
            })
            .await
            .unwrap();

        let admin_token = issue_token_pair(admin.id, TEST_JWT_SECRET).unwrap().access;
        let user_token = issue_token_pair(user.id, TEST_JWT_SECRET).unwrap().access;

        let app = build_router(state);

        TestContext {
            repo,
            app,
            admin,
            user,
            admin_token,
            user_token,
            future_event,
            past_event,
        }
    }

    /// Sends a request and returns status plus parsed JSON body
    ///
    /// An empty or non-JSON body comes back as `Value::Null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }
}
