mod common;

use account_shortener::domain::repositories::UrlRepository;
use account_shortener::infrastructure::cache::CacheService;
use common::TestApp;

#[tokio::test]
async fn test_redirect_success() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("alice@example.com").await;
    let code = app.shorten(&token, "https://example.com/target").await;

    let response = app.server.get(&format!("/{code}")).await;

    assert_eq!(response.status_code(), 301);
    assert_eq!(response.header("location"), "https://example.com/target");
}

#[tokio::test]
async fn test_redirect_not_found() {
    let app = TestApp::new();

    let response = app.server.get("/doesnotexist").await;

    assert_eq!(response.status_code(), 404);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_redirect_populates_cache_and_counts() {
    let mut app = TestApp::new();
    let (_, token) = app.user_with_token("alice@example.com").await;
    let code = app.shorten(&token, "https://example.com/").await;

    for _ in 0..3 {
        assert_eq!(app.server.get(&format!("/{code}")).await.status_code(), 301);
    }

    assert_eq!(
        app.cache.get(&format!("resolved-url:{code}")).await.unwrap(),
        Some("https://example.com/".to_string())
    );
    assert_eq!(
        app.cache.get(&format!("resolution-count:{code}")).await.unwrap(),
        Some("3".to_string())
    );

    let mut last = 0;
    while let Ok(event) = app.resolution_rx.try_recv() {
        assert_eq!(event.short_code, code);
        last = event.observed_count;
    }
    assert_eq!(last, 3);
}

#[tokio::test]
async fn test_deleted_code_stops_resolving_even_when_cached() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("alice@example.com").await;
    let code = app.shorten(&token, "https://example.com/").await;

    assert_eq!(app.server.get(&format!("/{code}")).await.status_code(), 301);

    app.server
        .delete(&format!("/api/user/urls/{code}"))
        .authorization_bearer(&token)
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    assert_eq!(app.server.get(&format!("/{code}")).await.status_code(), 404);
}

#[tokio::test]
async fn test_not_found_is_not_cached() {
    let app = TestApp::new();

    assert_eq!(app.server.get("/abc123").await.status_code(), 404);
    assert_eq!(app.cache.get("resolved-url:abc123").await.unwrap(), None);
    assert_eq!(app.cache.get("resolution-count:abc123").await.unwrap(), None);
}

#[tokio::test]
async fn test_count_endpoint_reflects_cached_counter() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("alice@example.com").await;
    let code = app.shorten(&token, "https://example.com/counted").await;

    app.server.get(&format!("/{code}")).await;
    app.server.get(&format!("/{code}")).await;

    let response = app
        .server
        .get(&format!("/api/shortener/{code}/count"))
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["shorten_code"], code);
    assert_eq!(json["resolution_count"], 2);
}

#[tokio::test]
async fn test_counter_continues_from_stored_count_when_cache_is_empty() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("alice@example.com").await;
    let code = app.shorten(&token, "https://example.com/flushed").await;

    // Earlier resolutions were flushed to the store, then the cache lost its counter.
    app.store.record_resolution_count(&code, 5).await.unwrap();
    assert_eq!(
        app.cache
            .get(&format!("resolution-count:{code}"))
            .await
            .unwrap(),
        None
    );

    for _ in 0..3 {
        assert_eq!(app.server.get(&format!("/{code}")).await.status_code(), 301);
    }

    let response = app
        .server
        .get(&format!("/api/shortener/{code}/count"))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.json::<serde_json::Value>()["resolution_count"], 8);

    let response = app
        .server
        .get("/api/user/urls")
        .authorization_bearer(&token)
        .await;
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["urls"][0]["resolution_count"], 8);
}
