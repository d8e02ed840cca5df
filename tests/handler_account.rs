mod common;

use account_shortener::domain::repositories::UserRepository;
use axum::http::StatusCode;
use common::TestApp;
use serde_json::{Value, json};

async fn sign_in(app: &TestApp, email: &str, password: &str) -> axum_test::TestResponse {
    app.server
        .post("/api/user/sign")
        .json(&json!({ "email": email, "password": password }))
        .await
}

#[tokio::test]
async fn test_signup_complete_and_sign_in() {
    let mut app = TestApp::new();

    let response = app
        .server
        .post("/api/user/signup")
        .json(&json!({ "email": "Alice@Example.com", "password": "secret1" }))
        .await;
    response.assert_status_ok();
    response.assert_text("Registration request accepted");

    let code = app.mailed_code("alice@example.com");
    assert_eq!(code.len(), 6);

    let response = app
        .server
        .post("/api/user/signup/complete")
        .json(&json!({ "email": "alice@example.com", "code": code }))
        .await;
    response.assert_status_ok();
    response.assert_text("Registered successfully");

    let response = sign_in(&app, "alice@example.com", "secret1").await;
    response.assert_status_ok();
    let token = response.json::<Value>()["token"].as_str().unwrap().to_string();

    let response = app
        .server
        .get("/api/user/auth-check")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({ "email": "alice@example.com", "type": "local" }));
}

#[tokio::test]
async fn test_signup_does_not_create_user_before_completion() {
    let mut app = TestApp::new();

    app.server
        .post("/api/user/signup")
        .json(&json!({ "email": "alice@example.com", "password": "secret1" }))
        .await
        .assert_status_ok();
    app.mailed_code("alice@example.com");

    assert!(
        app.store
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .is_none()
    );
    sign_in(&app, "alice@example.com", "secret1")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_code_keeps_stage() {
    let mut app = TestApp::new();

    app.server
        .post("/api/user/signup")
        .json(&json!({ "email": "alice@example.com", "password": "secret1" }))
        .await
        .assert_status_ok();
    let code = app.mailed_code("alice@example.com");
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let response = app
        .server
        .post("/api/user/signup/complete")
        .json(&json!({ "email": "alice@example.com", "code": wrong }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["details"]["reason"],
        "code_mismatch"
    );

    app.server
        .post("/api/user/signup/complete")
        .json(&json!({ "email": "alice@example.com", "code": code }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_stage_is_consumed_by_completion() {
    let mut app = TestApp::new();

    app.server
        .post("/api/user/signup")
        .json(&json!({ "email": "alice@example.com", "password": "secret1" }))
        .await
        .assert_status_ok();
    let code = app.mailed_code("alice@example.com");

    let complete = json!({ "email": "alice@example.com", "code": code });
    app.server
        .post("/api/user/signup/complete")
        .json(&complete)
        .await
        .assert_status_ok();

    let response = app.server.post("/api/user/signup/complete").json(&complete).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["details"]["reason"],
        "stage_not_found"
    );
}

#[tokio::test]
async fn test_complete_without_signup() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/user/signup/complete")
        .json(&json!({ "email": "nobody@example.com", "code": "123456" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["details"]["reason"],
        "stage_not_found"
    );

    let response = app
        .server
        .post("/api/user/signup/complete")
        .json(&json!({ "email": "nobody@example.com", "code": "12ab" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["details"]["reason"],
        "invalid_code"
    );
}

#[tokio::test]
async fn test_signup_validation() {
    let app = TestApp::new();

    for (email, password, reason) in [
        ("not-an-email", "secret1", "invalid_email"),
        ("alice@example.com", "short", "invalid_password"),
        ("alice@example.com", "a-password-way-too-long", "invalid_password"),
    ] {
        let response = app
            .server
            .post("/api/user/signup")
            .json(&json!({ "email": email, "password": password }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"]["details"]["reason"],
            reason,
            "email: {email}, password: {password}"
        );
    }
}

#[tokio::test]
async fn test_signup_for_existing_account_conflicts() {
    let app = TestApp::new();
    app.user_with_token("alice@example.com").await;

    let response = app
        .server
        .post("/api/user/signup")
        .json(&json!({ "email": "alice@example.com", "password": "secret1" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>()["error"]["details"]["reason"],
        "already_registered"
    );
}

#[tokio::test]
async fn test_bypass_accepts_any_code() {
    let app = TestApp::bypass();

    let response = app
        .server
        .post("/api/user/signup")
        .json(&json!({ "email": "alice@example.com", "password": "secret1" }))
        .await;
    response.assert_status_ok();
    response.assert_text("Registration request accepted (without email verification)");

    app.server
        .post("/api/user/signup/complete")
        .json(&json!({ "email": "alice@example.com", "code": "999999" }))
        .await
        .assert_status_ok();

    sign_in(&app, "alice@example.com", "secret1")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_sign_in_failures_look_alike() {
    let app = TestApp::bypass();

    app.server
        .post("/api/user/signup")
        .json(&json!({ "email": "alice@example.com", "password": "secret1" }))
        .await
        .assert_status_ok();
    app.server
        .post("/api/user/signup/complete")
        .json(&json!({ "email": "alice@example.com", "code": "000000" }))
        .await
        .assert_status_ok();
    app.user_with_token("fed@example.com").await;

    for (email, password) in [
        ("alice@example.com", "wrong-pw"),
        ("nobody@example.com", "secret1"),
        ("fed@example.com", "secret1"),
    ] {
        let response = sign_in(&app, email, password).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let json = response.json::<Value>();
        assert_eq!(json["error"]["code"], "authentication_error");
        assert_eq!(json["error"]["message"], "Invalid email or password");
    }
}

#[tokio::test]
async fn test_delete_account_revokes_token_and_urls() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("alice@example.com").await;
    let code = app.shorten(&token, "https://example.com/").await;
    assert_eq!(app.server.get(&format!("/{code}")).await.status_code(), 301);

    app.server
        .delete("/api/user")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert_eq!(app.server.get(&format!("/{code}")).await.status_code(), 404);
    app.server
        .get("/api/user/auth-check")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_check_requires_token() {
    let app = TestApp::new();

    app.server
        .get("/api/user/auth-check")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
