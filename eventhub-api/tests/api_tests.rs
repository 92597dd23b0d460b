/// HTTP-level tests against the full router over in-memory storage
mod common;

use axum::http::StatusCode;
use common::{TestContext, TEST_JWT_SECRET};
use eventhub_shared::auth::jwt::{issue_token_pair, validate_access_token};
use eventhub_shared::directory::RegistrationPolicy;
use eventhub_shared::models::CreateEvent;
use eventhub_shared::repository::{EventRepository, UserRepository};
use serde_json::{json, Value};
use uuid::Uuid;

fn event_ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_reports_connected_storage() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "connected");
}

#[tokio::test]
async fn test_list_events_is_public_and_future_only() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send("GET", "/api/events/", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(event_ids(&body), vec![ctx.future_event.id]);
    assert_eq!(body[0]["name"], "Rust meetup");
}

#[tokio::test]
async fn test_list_events_orders_by_meeting_time() {
    let ctx = TestContext::new().await;
    let sooner = ctx
        .repo
        .create_event(CreateEvent {
            name: "Tomorrow".to_string(),
            meeting_time: chrono::Utc::now() + chrono::Duration::days(1),
        })
        .await
        .unwrap();

    let (_, body) = ctx.send("GET", "/api/events/", None, None).await;

    assert_eq!(event_ids(&body), vec![sooner.id, ctx.future_event.id]);
}

#[tokio::test]
async fn test_signup_for_future_event() {
    let ctx = TestContext::new().await;
    let uri = format!("/api/event/{}/", ctx.future_event.id);

    let (status, body) = ctx.send("POST", &uri, Some(&ctx.user_token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event_id"], ctx.future_event.id);
    assert_eq!(body["newly_added"], true);
    assert!(ctx
        .repo
        .is_signed_up(ctx.future_event.id, ctx.user.id)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_signup_twice_is_idempotent() {
    let ctx = TestContext::new().await;
    let uri = format!("/api/event/{}/", ctx.future_event.id);

    let (first, _) = ctx.send("POST", &uri, Some(&ctx.user_token), None).await;
    let (second, body) = ctx.send("POST", &uri, Some(&ctx.user_token), None).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body["newly_added"], false);
    assert_eq!(ctx.repo.count_signups(ctx.future_event.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_signup_for_past_event_is_not_found() {
    let ctx = TestContext::new().await;
    let uri = format!("/api/event/{}/", ctx.past_event.id);

    let (status, body) = ctx.send("POST", &uri, Some(&ctx.user_token), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert!(!ctx
        .repo
        .is_signed_up(ctx.past_event.id, ctx.user.id)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_signup_for_missing_event_is_not_found() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .send("POST", "/api/event/9999/", Some(&ctx.user_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send("POST", "/api/event/not-a-number/", Some(&ctx.user_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signup_requires_authentication() {
    let ctx = TestContext::new().await;
    let uri = format!("/api/event/{}/", ctx.future_event.id);

    let (status, body) = ctx.send("POST", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx.send("POST", &uri, Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_deleted_user_is_rejected() {
    let ctx = TestContext::new().await;
    let ghost = issue_token_pair(Uuid::new_v4(), TEST_JWT_SECRET).unwrap();

    let (status, _) = ctx
        .send("GET", "/api/events/my/", Some(&ghost.access), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let ctx = TestContext::new().await;
    let pair = issue_token_pair(ctx.user.id, TEST_JWT_SECRET).unwrap();

    let (status, _) = ctx
        .send("GET", "/api/events/my/", Some(&pair.refresh), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_my_events_includes_past_signups() {
    let ctx = TestContext::new().await;
    ctx.repo
        .add_signup(ctx.past_event.id, ctx.user.id)
        .await
        .unwrap();
    let uri = format!("/api/event/{}/", ctx.future_event.id);
    ctx.send("POST", &uri, Some(&ctx.user_token), None).await;

    let (status, body) = ctx
        .send("GET", "/api/events/my/", Some(&ctx.user_token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let mut ids = event_ids(&body);
    ids.sort();
    let mut expected = vec![ctx.future_event.id, ctx.past_event.id];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_my_events_is_empty_for_new_user() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send("GET", "/api/events/my/", Some(&ctx.admin_token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_list_users_admin_only() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send("GET", "/api/users/", Some(&ctx.admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert!(body[0].get("password_hash").is_none());

    let (status, body) = ctx
        .send("GET", "/api/users/", Some(&ctx.user_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = ctx.send("GET", "/api/users/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_returns_tokens() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send(
            "POST",
            "/api/users/",
            None,
            Some(json!({
                "username": "bob",
                "email": "bob@example.com",
                "password": "hunter22"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "bob");
    assert!(body.get("password").is_none());

    let claims = validate_access_token(body["access"].as_str().unwrap(), TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub.to_string(), body["id"].as_str().unwrap());

    let (status, _) = ctx
        .send("GET", "/api/events/my/", body["access"].as_str(), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_accepts_loose_input_by_default() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .send(
            "POST",
            "/api/users/",
            None,
            Some(json!({ "username": "", "email": "", "password": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = ctx
        .send(
            "POST",
            "/api/users/",
            None,
            Some(json!({ "username": "carol", "email": "not-an-email", "password": "12" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(ctx.repo.count_users().await.unwrap(), 4);
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send(
            "POST",
            "/api/users/",
            None,
            Some(json!({
                "username": "alice",
                "email": "other@example.com",
                "password": "whatever1"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(ctx.repo.count_users().await.unwrap(), 2);
}

#[tokio::test]
async fn test_strict_registration_rejects_bad_input() {
    let ctx = TestContext::with_policy(RegistrationPolicy::Strict).await;

    let (status, body) = ctx
        .send(
            "POST",
            "/api/users/",
            None,
            Some(json!({ "username": "dave", "email": "nope", "password": "12" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    let mut fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    fields.sort();
    assert_eq!(fields, vec!["email", "password"]);
}

#[tokio::test]
async fn test_obtain_and_refresh_token() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send(
            "POST",
            "/api/token/",
            None,
            Some(json!({ "username": "alice", "password": "alice-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let refresh = body["refresh"].as_str().unwrap().to_string();
    assert!(body["access"].is_string());

    let (status, body) = ctx
        .send(
            "POST",
            "/api/token/refresh/",
            None,
            Some(json!({ "refresh": refresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let claims = validate_access_token(body["access"].as_str().unwrap(), TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub, ctx.user.id);
}

#[tokio::test]
async fn test_obtain_token_wrong_password() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .send(
            "POST",
            "/api/token/",
            None,
            Some(json!({ "username": "alice", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .send(
            "POST",
            "/api/token/",
            None,
            Some(json!({ "username": "nobody", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .send(
            "POST",
            "/api/token/refresh/",
            None,
            Some(json!({ "refresh": ctx.user_token })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_creates_event() {
    let ctx = TestContext::new().await;
    let meeting_time = chrono::Utc::now() + chrono::Duration::days(10);

    let (status, body) = ctx
        .send(
            "POST",
            "/api/events/",
            Some(&ctx.admin_token),
            Some(json!({ "name": "Conference", "meeting_time": meeting_time })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Conference");

    let (_, listed) = ctx.send("GET", "/api/events/", None, None).await;
    assert!(event_ids(&listed).contains(&body["id"].as_i64().unwrap()));
}

#[tokio::test]
async fn test_create_event_requires_admin() {
    let ctx = TestContext::new().await;
    let payload = json!({ "name": "Party", "meeting_time": chrono::Utc::now() + chrono::Duration::days(1) });

    let (status, _) = ctx
        .send("POST", "/api/events/", Some(&ctx.user_token), Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send("POST", "/api/events/", None, Some(payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_event_rejects_blank_name() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send(
            "POST",
            "/api/events/",
            Some(&ctx.admin_token),
            Some(json!({ "name": "  ", "meeting_time": chrono::Utc::now() })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "name");
}
