use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use muse_api::AppStateInner;
use muse_chat::identity::TokenKeys;
use muse_db::Database;
use muse_gateway::Dispatcher;

fn app() -> Router {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let state = Arc::new(AppStateInner::new(
        db,
        TokenKeys::from_secret("integration-test-secret"),
        Dispatcher::new(),
    ));
    muse_api::router(state)
}

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Registers an account and returns `(id, token)`.
async fn register(app: &Router, artist: bool, name: &str, email: &str) -> (i64, String) {
    let (uri, body) = if artist {
        (
            "/auth/artist/register",
            json!({"name": name, "email": email, "address": "Bandung", "password": "password123"}),
        )
    } else {
        ("/auth/register", json!({"name": name, "email": email, "password": "password123"}))
    };

    let (status, json) = call(app, Method::POST, uri, None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    (
        json["data"]["participant"]["id"].as_i64().unwrap(),
        json["data"]["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn user_and_artist_exchange_messages() {
    let app = app();
    let (user_id, user_token) = register(&app, false, "Rina", "rina@example.com").await;
    let (artist_id, artist_token) = register(&app, true, "Maya Glam", "maya@example.com").await;

    let (status, json) = call(
        &app,
        Method::POST,
        &format!("/user/conversations/artist/{artist_id}/messages"),
        Some(&user_token),
        Some(json!({"message": "Hi, are you free on Saturday?"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["is_read"], false);
    assert_eq!(json["data"]["sender"], json!({"kind": "user", "id": user_id}));

    // The user wrote first and got no answer yet: nothing in the user's inbox.
    let (_, json) = call(&app, Method::GET, "/user/conversations", Some(&user_token), None).await;
    assert_eq!(json["data"]["conversations"].as_array().unwrap().len(), 0);

    let (status, json) = call(&app, Method::GET, "/artist/conversations", Some(&artist_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let conversations = json["data"]["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["counterpart"]["display_name"], "Rina");
    assert_eq!(conversations[0]["unread_count"], 1);
    assert_eq!(json["data"]["unread_total"], 1);

    let thread_uri = format!("/artist/conversations/user/{user_id}");
    let (status, json) = call(&app, Method::GET, &thread_uri, Some(&artist_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["meta"]["total_messages"], 1);
    assert_eq!(json["data"]["meta"]["unread_count"], 1);
    let first = &json["data"]["messages"][0];
    assert_eq!(first["message"], "Hi, are you free on Saturday?");
    assert_eq!(first["is_me"], false);
    assert_eq!(first["sender_data"]["display_name"], "Rina");
    assert_eq!(first["receiver_data"]["display_name"], "Maya Glam");

    let (_, json) = call(&app, Method::GET, "/artist/conversations", Some(&artist_token), None).await;
    assert_eq!(json["data"]["unread_total"], 0);

    let (status, json) = call(
        &app,
        Method::POST,
        &format!("/artist/conversations/user/{user_id}/messages"),
        Some(&artist_token),
        Some(json!({"message": "Yes, I am!"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");

    let unread_uri = format!("/user/conversations/artist/{artist_id}/unread");
    let (_, json) = call(&app, Method::GET, &unread_uri, Some(&user_token), None).await;
    assert_eq!(json["data"]["unread"], 1);

    let read_uri = format!("/user/conversations/artist/{artist_id}/read");
    let (status, json) = call(&app, Method::POST, &read_uri, Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["updated"], 1);

    let (_, json) = call(&app, Method::POST, &read_uri, Some(&user_token), None).await;
    assert_eq!(json["data"]["updated"], 0);
}

#[tokio::test]
async fn missing_or_foreign_token_is_unauthorized() {
    let app = app();
    let (_, user_token) = register(&app, false, "Rina", "rina@example.com").await;

    let (status, json) = call(&app, Method::GET, "/user/conversations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);
    assert!(json["data"].is_null());

    let (status, _) = call(&app, Method::GET, "/artist/conversations", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/user/conversations", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_counterpart_is_not_found() {
    let app = app();
    let (_, token) = register(&app, false, "Rina", "rina@example.com").await;

    let (status, _) = call(&app, Method::GET, "/user/conversations/artist/999", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, "/user/conversations/admin/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_counterpart_id_is_unprocessable() {
    let app = app();
    let (_, token) = register(&app, false, "Rina", "rina@example.com").await;

    let (status, json) = call(&app, Method::GET, "/user/conversations/artist/abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["success"], false);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_with_one_email_conflict() {
    let app = app();
    let body = json!({"name": "Rina", "email": "rina@example.com", "password": "password123"});

    let attempts: Vec<_> = (0..16)
        .map(|_| {
            let app = app.clone();
            let body = body.clone();
            tokio::spawn(async move { call(&app, Method::POST, "/auth/register", None, Some(body)).await.0 })
        })
        .collect();

    let mut statuses = Vec::new();
    for attempt in attempts {
        statuses.push(attempt.await.unwrap());
    }

    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    let conflicts = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
    assert_eq!(created, 1, "{statuses:?}");
    assert_eq!(conflicts, 15, "{statuses:?}");
}

#[tokio::test]
async fn invalid_bodies_are_unprocessable() {
    let app = app();
    let (user_id, token) = register(&app, false, "Rina", "rina@example.com").await;
    let (artist_id, _) = register(&app, true, "Maya Glam", "maya@example.com").await;
    let uri = format!("/user/conversations/artist/{artist_id}/messages");

    let (status, _) = call(&app, Method::POST, &uri, Some(&token), Some(json!({"message": "   "}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let long = "x".repeat(1001);
    let (status, _) = call(&app, Method::POST, &uri, Some(&token), Some(json!({"message": long}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(&app, Method::POST, &uri, Some(&token), Some(json!({"body": "hi"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let self_uri = format!("/user/conversations/user/{user_id}/messages");
    let (status, json) = call(&app, Method::POST, &self_uri, Some(&token), Some(json!({"message": "me"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn registration_and_login_rules() {
    let app = app();
    register(&app, false, "Rina", "rina@example.com").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"name": "Rina Two", "email": "RINA@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"name": "Dewi", "email": "dewi@example.com", "password": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, json) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "rina@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["name"], "Rina");

    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "rina@example.com", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Same credentials, but no artist account exists for them.
    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/artist/login",
        None,
        Some(json!({"email": "rina@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
