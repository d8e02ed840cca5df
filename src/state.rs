//! Shared application state injected into all handlers.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{
    AuthService, RegistrationService, ResolutionService, UrlService, Verification,
};
use crate::config::Config;
use crate::domain::repositories::{UrlRepository, UserRepository};
use crate::domain::resolution_event::ResolutionEvent;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::CodeGenerator;

/// Services and backends shared by every request.
///
/// Services are instantiated over trait objects so the same state type
/// carries either the PostgreSQL or the in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub url_service: Arc<UrlService<dyn UrlRepository>>,
    pub resolution_service: Arc<ResolutionService<dyn UrlRepository>>,
    pub registration_service: Arc<RegistrationService<dyn UserRepository>>,
    pub auth_service: Arc<AuthService<dyn UserRepository>>,
    pub users: Arc<dyn UserRepository>,
    pub urls: Arc<dyn UrlRepository>,
    pub cache: Arc<dyn CacheService>,
}

impl AppState {
    /// Wires the services over the given backends.
    ///
    /// # Errors
    ///
    /// Returns an error if `BASE_URL` has no host.
    pub fn new(
        config: &Config,
        users: Arc<dyn UserRepository>,
        urls: Arc<dyn UrlRepository>,
        cache: Arc<dyn CacheService>,
        generator: Arc<dyn CodeGenerator>,
        verification: Verification,
        resolution_tx: mpsc::Sender<ResolutionEvent>,
    ) -> anyhow::Result<Self> {
        let url_service = UrlService::new(
            urls.clone(),
            cache.clone(),
            generator,
            config.own_domain()?,
            config.base_url.clone(),
        );
        let resolution_service =
            ResolutionService::new(urls.clone(), cache.clone(), config.cache_ttl(), resolution_tx);
        let registration_service =
            RegistrationService::new(users.clone(), cache.clone(), verification);
        let auth_service = AuthService::new(users.clone(), &config.jwt_key);

        Ok(Self {
            url_service: Arc::new(url_service),
            resolution_service: Arc::new(resolution_service),
            registration_service: Arc::new(registration_service),
            auth_service: Arc::new(auth_service),
            users,
            urls,
            cache,
        })
    }
}
