//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`      - Short URL redirect (public)
//! - `GET  /health`      - Health check: store, cache, resolution queue (public)
//! - `/api/user/signup*`, `/api/user/sign` - Account routes (public, strict rate limit)
//! - `/api/*`            - Everything else requires a Bearer session token
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **CORS** - Only the service's own origin, with credentials
//! - **Rate limiting** - Per-IP token bucket (configurable for proxy deployments)
//! - **Authentication** - Bearer session token
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::config::Config;
use crate::state::AppState;
use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Router, middleware};
use std::time::Duration;
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

const CORS_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Builds all routes and middleware, without path normalization.
///
/// # Errors
///
/// Returns an error if `BASE_URL` cannot be turned into a CORS origin.
pub fn build_router(state: AppState, config: &Config) -> Result<Router> {
    let behind_proxy = config.behind_proxy;

    let protected = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer))
        .layer(rate_limit::layer(behind_proxy));

    let account = api::routes::account_routes().layer(rate_limit::secure_layer(behind_proxy));

    let public = Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .layer(rate_limit::layer(behind_proxy));

    let router = Router::new()
        .merge(public)
        .nest("/api", protected.merge(account))
        .with_state(state)
        .layer(cors_layer(&config.base_url)?)
        .layer(tracing::layer());

    Ok(router)
}

/// Constructs the application router with all routes and middleware.
///
/// Trailing slashes are trimmed before routing, so `/api/shortener/` and
/// `/api/shortener` are the same endpoint.
pub fn app_router(state: AppState, config: &Config) -> Result<NormalizePath<Router>> {
    Ok(NormalizePathLayer::trim_trailing_slash().layer(build_router(state, config)?))
}

fn cors_layer(base_url: &str) -> Result<CorsLayer> {
    let origin = url::Url::parse(base_url)
        .with_context(|| format!("BASE_URL is not a valid URL: '{}'", base_url))?
        .origin()
        .ascii_serialization();
    let origin = HeaderValue::from_str(&origin)
        .with_context(|| format!("BASE_URL origin is not a valid header value: '{}'", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::ORIGIN, header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE))
}
