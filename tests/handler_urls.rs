mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::Value;

#[tokio::test]
async fn test_list_returns_own_urls_newest_first() {
    let app = TestApp::new();
    let (_, alice) = app.user_with_token("alice@example.com").await;
    let (_, bob) = app.user_with_token("bob@example.com").await;

    let first = app.shorten(&alice, "https://example.com/1").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = app.shorten(&alice, "https://example.com/2").await;
    app.shorten(&bob, "https://example.com/bob").await;

    let response = app
        .server
        .get("/api/user/urls")
        .authorization_bearer(&alice)
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["total"], 2);

    let urls = json["urls"].as_array().unwrap();
    assert_eq!(urls.len(), 2);
    assert_eq!(urls[0]["shorten_code"], second);
    assert_eq!(urls[0]["origin_url"], "https://example.com/2");
    assert_eq!(urls[1]["shorten_code"], first);
    assert_eq!(urls[1]["resolution_count"], 0);
    assert!(urls[1]["short_url"].as_str().unwrap().ends_with(&first));
}

#[tokio::test]
async fn test_list_pagination() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("alice@example.com").await;

    for i in 0..3 {
        app.shorten(&token, &format!("https://example.com/{i}")).await;
    }

    let response = app
        .server
        .get("/api/user/urls")
        .add_query_param("offset", 1)
        .add_query_param("limit", 1)
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["total"], 3);
    assert_eq!(json["urls"].as_array().unwrap().len(), 1);

    let response = app
        .server
        .get("/api/user/urls")
        .add_query_param("offset", 10)
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_empty_is_not_found() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("alice@example.com").await;

    let response = app
        .server
        .get("/api/user/urls")
        .authorization_bearer(&token)
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_own_url() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("alice@example.com").await;
    let code = app.shorten(&token, "https://example.com/").await;

    app.server
        .delete(&format!("/api/user/urls/{code}"))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .delete(&format!("/api/user/urls/{code}"))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_foreign_url_is_not_found() {
    let app = TestApp::new();
    let (_, alice) = app.user_with_token("alice@example.com").await;
    let (_, bob) = app.user_with_token("bob@example.com").await;
    let code = app.shorten(&alice, "https://example.com/").await;

    app.server
        .delete(&format!("/api/user/urls/{code}"))
        .authorization_bearer(&bob)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Still resolves for everyone.
    assert_eq!(app.server.get(&format!("/{code}")).await.status_code(), 301);
}

#[tokio::test]
async fn test_list_counts_include_unflushed_resolutions() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("alice@example.com").await;
    let code = app.shorten(&token, "https://example.com/").await;

    for _ in 0..2 {
        app.server.get(&format!("/{code}")).await;
    }

    let response = app
        .server
        .get("/api/user/urls")
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["urls"][0]["resolution_count"], 2);
}
