#![allow(dead_code)]

use account_shortener::application::services::Verification;
use account_shortener::config::Config;
use account_shortener::domain::entities::{NewUser, User};
use account_shortener::domain::repositories::UserRepository;
use account_shortener::domain::resolution_event::ResolutionEvent;
use account_shortener::infrastructure::cache::MemoryCache;
use account_shortener::infrastructure::mail::EmailMessage;
use account_shortener::infrastructure::persistence::MemoryStore;
use account_shortener::routes::build_router;
use account_shortener::state::AppState;
use account_shortener::utils::code_generator::RandomCodeGenerator;
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::Layer;

pub const BASE_URL: &str = "http://sho.rt:8080";

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        redis_url: None,
        listen_addr: "127.0.0.1:0".to_string(),
        base_url: BASE_URL.to_string(),
        log_level: "info".to_string(),
        log_format: "text".to_string(),
        jwt_key: "test-jwt-key".to_string(),
        behind_proxy: false,
        cache_ttl_seconds: 3600,
        cache_health_interval_seconds: 5,
        resolution_queue_capacity: 1000,
        email: None,
        db_max_connections: 1,
        db_connect_timeout: 1,
    }
}

/// A full router over the in-memory store and cache.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub mail_rx: Option<mpsc::UnboundedReceiver<EmailMessage>>,
    pub resolution_rx: mpsc::Receiver<ResolutionEvent>,
}

impl TestApp {
    /// Registrations require the mailed code, which lands in `mail_rx`.
    pub fn new() -> Self {
        let (mail_tx, mail_rx) = mpsc::unbounded_channel();
        Self::build(Verification::Email(mail_tx), Some(mail_rx))
    }

    /// Registrations complete with any six-digit code.
    pub fn bypass() -> Self {
        Self::build(Verification::Bypass, None)
    }

    fn build(
        verification: Verification,
        mail_rx: Option<mpsc::UnboundedReceiver<EmailMessage>>,
    ) -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let (resolution_tx, resolution_rx) = mpsc::channel(config.resolution_queue_capacity);

        let state = AppState::new(
            &config,
            store.clone(),
            store.clone(),
            cache.clone(),
            Arc::new(RandomCodeGenerator::new()),
            verification,
            resolution_tx,
        )
        .unwrap();

        let app = build_router(state.clone(), &config)
            .unwrap()
            .layer(MockConnectInfoLayer);

        Self {
            server: TestServer::new(app).unwrap(),
            state,
            store,
            cache,
            mail_rx,
            resolution_rx,
        }
    }

    /// Creates a federated account directly in the store and signs a token for it.
    pub async fn user_with_token(&self, email: &str) -> (User, String) {
        let user = self
            .store
            .create_user(NewUser::federated(email.to_string()))
            .await
            .unwrap();
        let token = self.state.auth_service.issue_token(&user).unwrap();
        (user, token)
    }

    /// Shortens `url` as the token's owner and returns the short code.
    pub async fn shorten(&self, token: &str, url: &str) -> String {
        let response = self
            .server
            .post("/api/shortener")
            .authorization_bearer(token)
            .json(&serde_json::json!({ "url": url }))
            .await;
        response.assert_status_ok();

        response.json::<serde_json::Value>()["shorten_code"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Takes the most recent verification code mailed to `email`.
    pub fn mailed_code(&mut self, email: &str) -> String {
        let rx = self.mail_rx.as_mut().expect("app built without mail");
        let message = rx.try_recv().expect("no verification email queued");
        assert_eq!(message.to, email);

        message
            .body
            .chars()
            .filter(char::is_ascii_digit)
            .collect()
    }
}
