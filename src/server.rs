//! HTTP server initialization and runtime setup.
//!
//! Handles store and cache selection, background tasks, and the Axum server
//! lifecycle.

use crate::application::services::Verification;
use crate::config::Config;
use crate::domain::repositories::{UrlRepository, UserRepository};
use crate::domain::resolution_worker::run_resolution_worker;
use crate::infrastructure::cache::monitor::run_cache_monitor;
use crate::infrastructure::cache::{CacheService, MemoryCache, RedisCache};
use crate::infrastructure::mail::{SmtpProvider, run_mail_dispatcher};
use crate::infrastructure::persistence::{MemoryStore, PgUrlRepository, PgUserRepository};
use crate::routes::app_router;
use crate::state::AppState;
use crate::utils::code_generator::RandomCodeGenerator;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL pool and migrations (or the in-memory store)
/// - Redis cache (or the in-memory cache) and its liveness monitor
/// - Mail dispatcher (or verification bypass)
/// - Resolution worker
/// - Axum HTTP server with graceful shutdown on Ctrl+C / SIGTERM
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Redis is configured but unreachable
/// - SMTP settings are invalid
/// - Server bind fails
pub async fn run(config: Config) -> Result<()> {
    let (users, urls) = connect_store(&config).await?;
    let cache = connect_cache(&config).await?;

    tokio::spawn(run_cache_monitor(
        cache.clone(),
        config.cache_health_interval(),
    ));

    let verification = match &config.email {
        Some(email) => {
            let provider = SmtpProvider::new(
                &email.host,
                email.port,
                email.username.clone(),
                email.password.clone(),
                &email.from,
            )
            .context("Invalid SMTP configuration")?;

            let (mail_tx, mail_rx) = mpsc::unbounded_channel();
            tokio::spawn(run_mail_dispatcher(
                mail_rx,
                Arc::new(provider),
                Duration::from_secs(email.send_timeout_seconds),
            ));
            tracing::info!("Mail dispatcher started ({}:{})", email.host, email.port);

            Verification::Email(mail_tx)
        }
        None => Verification::Bypass,
    };

    let (resolution_tx, resolution_rx) = mpsc::channel(config.resolution_queue_capacity);
    tokio::spawn(run_resolution_worker(
        resolution_rx,
        urls.clone(),
        cache.clone(),
    ));
    tracing::info!("Resolution worker started");

    let state = AppState::new(
        &config,
        users,
        urls,
        cache,
        Arc::new(RandomCodeGenerator::new()),
        verification,
        resolution_tx,
    )?;

    let app = app_router(state, &config)?;

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn connect_store(
    config: &Config,
) -> Result<(Arc<dyn UserRepository>, Arc<dyn UrlRepository>)> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("No database configured, records are kept in memory only");
        let store = Arc::new(MemoryStore::new());
        return Ok((store.clone(), store));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let pool = Arc::new(pool);
    Ok((
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgUrlRepository::new(pool)),
    ))
}

async fn connect_cache(config: &Config) -> Result<Arc<dyn CacheService>> {
    match &config.redis_url {
        Some(redis_url) => {
            let redis = RedisCache::connect(redis_url)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Cache enabled (Redis)");
            Ok(Arc::new(redis))
        }
        None => {
            tracing::info!("Cache in process memory");
            Ok(Arc::new(MemoryCache::new()))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
