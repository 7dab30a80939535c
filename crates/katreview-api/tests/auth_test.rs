//! Auth API integration tests.
//!
//! Run with: `cargo test -p katreview-api --test auth_test`
//! Requires Docker for testcontainers (Postgres).

mod helpers;

use helpers::auth::register_test_user;
use helpers::{api_path, setup_test_app, setup_test_app_with};
use serde_json::{json, Value};

#[tokio::test]
async fn test_register_login_and_me() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, Some("kat")).await;

    let response = client
        .post(&api_path("/auth/login"))
        .json(&json!({ "username": "kat", "password": user.password }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["role"], "admin");
    assert!(body["data"]["user"]["lastLogin"].is_string());
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let me: Value = client
        .get(&api_path("/auth/me"))
        .add_header("Authorization", format!("Bearer {}", token))
        .await
        .json();
    assert_eq!(me["data"]["user"]["username"], "kat");
    assert_eq!(me["data"]["user"]["email"], "kat@katreview.vn");
    assert!(me["data"].get("token").is_none());

    let response = client
        .get(&api_path("/auth/verify"))
        .add_header("Authorization", user.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = setup_test_app().await;
    let client = app.client();
    register_test_user(client, Some("kat")).await;

    for (username, password) in [("kat", "wrong-password"), ("nobody", "mat-khau-123")] {
        let response = client
            .post(&api_path("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .await;
        assert_eq!(response.status_code(), 401);
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn test_register_validation_and_duplicates() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client
        .post(&api_path("/auth/register"))
        .json(&json!({ "username": "kat", "email": "kat@katreview.vn", "password": "123" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = client
        .post(&api_path("/auth/register"))
        .json(&json!({ "username": "kat", "email": "not-an-email", "password": "mat-khau-123" }))
        .await;
    assert_eq!(response.status_code(), 400);

    register_test_user(client, Some("kat")).await;
    let response = client
        .post(&api_path("/auth/register"))
        .json(&json!({ "username": "kat", "email": "other@katreview.vn", "password": "mat-khau-123" }))
        .await;
    assert_eq!(response.status_code(), 409);
}

#[tokio::test]
async fn test_registration_can_be_disabled() {
    let app = setup_test_app_with(|config| config.base.allow_registration = false).await;

    let response = app
        .client()
        .post(&api_path("/auth/register"))
        .json(&json!({ "username": "kat", "email": "kat@katreview.vn", "password": "mat-khau-123" }))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_protected_routes_need_a_valid_token() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client.get(&api_path("/auth/me")).await;
    assert_eq!(response.status_code(), 401);

    let response = client
        .get(&api_path("/auth/verify"))
        .add_header("Authorization", "Bearer abc.def.ghi")
        .await;
    assert_eq!(response.status_code(), 401);
}
