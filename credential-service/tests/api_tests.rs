mod common;

use chrono::Duration;
use chrono::Utc;
use common::TestApp;
use common::TEST_BODY_LIMIT;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/health")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::spawn().await;

    let body = app.register("nicola@example.com", "pass_word!", "Nicola").await;

    assert!(body["token"].is_string());
    assert!(body["user"]["id"].is_i64());
    assert_eq!(body["user"]["email"], "nicola@example.com");
    assert_eq!(body["user"]["name"], "Nicola");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_token_opens_profile() {
    let app = TestApp::spawn().await;
    let body = app.register("nicola@example.com", "pass_word!", "Nicola").await;
    let token = body["token"].as_str().unwrap();

    let response = app
        .get_authenticated("/api/profile", token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let profile: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(profile["user_id"], body["user"]["id"]);
    assert_eq!(profile["email"], "nicola@example.com");
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::spawn().await;
    app.register("nicola@example.com", "pass_word!", "Nicola").await;

    let response = app
        .post("/register")
        .json(&json!({
            "email": "nicola@example.com",
            "password": "other_pass!",
            "name": "Someone"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "email already exists");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = TestApp::spawn().await;

    let cases = [
        (
            json!({ "email": "", "password": "pass_word!", "name": "Nicola" }),
            "missing required fields",
        ),
        (
            json!({ "password": "pass_word!", "name": "Nicola" }),
            "missing required fields",
        ),
        (
            json!({ "email": "a@b.com", "password": "pass_word!", "name": "N" }),
            "name must be at least 2 characters long",
        ),
        (
            json!({ "email": "a@b.com", "password": "short", "name": "Nicola" }),
            "password must be at least 8 characters long",
        ),
    ];

    for (payload, message) in cases {
        let response = app
            .post("/register")
            .json(&payload)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", payload);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["error"], message);
    }
}

#[tokio::test]
async fn test_register_invalid_email() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/register")
        .json(&json!({
            "email": "not-an-email",
            "password": "pass_word!",
            "name": "Nicola"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("invalid email"));
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/register")
        .header("Content-Type", "application/json")
        .body("{\"email\": ")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "invalid request body");
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let app = TestApp::spawn().await;
    let padding = "x".repeat(TEST_BODY_LIMIT * 2);

    let response = app
        .post("/register")
        .json(&json!({
            "email": "nicola@example.com",
            "password": "pass_word!",
            "name": padding
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "request body too large");
}

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::spawn().await;
    let registered = app.register("nicola@example.com", "pass_word!", "Nicola").await;

    let response = app.login("nicola@example.com", "pass_word!").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["user"], registered["user"]);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::spawn().await;
    app.register("nicola@example.com", "pass_word!", "Nicola").await;

    let wrong_password = app.login("nicola@example.com", "wrong_pass!").await;
    let unknown_email = app.login("nobody@example.com", "pass_word!").await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let wrong_password: serde_json::Value = wrong_password.json().await.unwrap();
    let unknown_email: serde_json::Value = unknown_email.json().await.unwrap();
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["error"], "invalid credentials");
}

#[tokio::test]
async fn test_profile_requires_header() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/api/profile")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "missing authorization header");
}

#[tokio::test]
async fn test_profile_rejects_invalid_tokens() {
    let app = TestApp::spawn().await;
    let expired = app
        .authenticator
        .issue_token_at(1, "nicola@example.com", Utc::now() - Duration::hours(73))
        .unwrap();

    for token in ["garbage", expired.as_str()] {
        let response = app
            .get_authenticated("/api/profile", token)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["error"], "invalid token");
    }
}

#[tokio::test]
async fn test_change_password_flow() {
    let app = TestApp::spawn().await;
    let body = app.register("nicola@example.com", "pass_word!", "Nicola").await;
    let token = body["token"].as_str().unwrap();

    let response = app
        .post_authenticated("/api/change-password", token)
        .json(&json!({
            "old_password": "pass_word!",
            "new_password": "new_pass_word!"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let changed: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(changed["message"], "password updated successfully");

    let old = app.login("nicola@example.com", "pass_word!").await;
    let new = app.login("nicola@example.com", "new_pass_word!").await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(new.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_change_password_wrong_old_password() {
    let app = TestApp::spawn().await;
    let body = app.register("nicola@example.com", "pass_word!", "Nicola").await;
    let token = body["token"].as_str().unwrap();

    let response = app
        .post_authenticated("/api/change-password", token)
        .json(&json!({
            "old_password": "not_my_pass",
            "new_password": "new_pass_word!"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "invalid old password");
}

#[tokio::test]
async fn test_change_password_validation() {
    let app = TestApp::spawn().await;
    let body = app.register("nicola@example.com", "pass_word!", "Nicola").await;
    let token = body["token"].as_str().unwrap();

    let cases = [
        (
            json!({ "old_password": "pass_word!", "new_password": "" }),
            "missing required fields",
        ),
        (
            json!({ "old_password": "pass_word!", "new_password": "short" }),
            "new password must be at least 8 characters long",
        ),
        (
            json!({ "old_password": "pass_word!", "new_password": "pass_word!" }),
            "new password must differ from the old password",
        ),
    ];

    for (payload, message) in cases {
        let response = app
            .post_authenticated("/api/change-password", token)
            .json(&payload)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["error"], message);
    }
}

#[tokio::test]
async fn test_change_password_for_unknown_account() {
    let app = TestApp::spawn().await;
    let token = app
        .authenticator
        .issue_token(i64::MAX, "ghost@example.com")
        .unwrap();

    let response = app
        .post_authenticated("/api/change-password", &token)
        .json(&json!({
            "old_password": "pass_word!",
            "new_password": "new_pass_word!"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
