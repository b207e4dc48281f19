//! Application wiring: configuration, storage, API client and session.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::config::{ClientConfig, ConfigError};
use crate::monitor::{ExpiryEffects, MonitorHandle, SessionExpiryMonitor};
use crate::nav::{guard, AccessDecision, Route};
use crate::session::{AuthSession, SessionError};
use crate::storage::{SqliteStorage, Storage, StorageError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// State shared by every screen, constructed once at startup.
///
/// Storage is not exposed; screens change the session only through `session`.
#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub api: ApiClient,
    pub session: Arc<AuthSession>,
}

impl AppState {
    /// Read the environment, open durable storage and hydrate the session.
    pub async fn from_env() -> Result<Self, AppError> {
        Self::bootstrap(ClientConfig::from_env()?).await
    }

    /// Open SQLite storage at the configured path (or the OS data dir).
    pub async fn bootstrap(config: ClientConfig) -> Result<Self, AppError> {
        let storage = match &config.storage_path {
            Some(path) => SqliteStorage::open(path),
            None => SqliteStorage::open_default()?,
        };
        Self::with_storage(config, Arc::new(storage)).await
    }

    pub async fn with_storage(config: ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, AppError> {
        let api = ApiClient::new(&config, storage.clone())?;
        let session = Arc::new(AuthSession::new(api.clone(), storage));
        session.hydrate().await?;

        tracing::info!(
            api_url = %config.api_url,
            authenticated = session.is_authenticated(),
            "client state initialized"
        );

        Ok(Self {
            config,
            api,
            session,
        })
    }

    /// Mount the expiry monitor for this session.
    pub fn start_expiry_monitor(&self, effects: Arc<dyn ExpiryEffects>) -> MonitorHandle {
        SessionExpiryMonitor::new(self.session.clone(), effects).start()
    }

    /// Access decision for `route` given the current session.
    pub fn navigate(&self, route: &Route) -> AccessDecision {
        if self.session.is_loading() {
            // Nothing is decided until hydration finishes.
            return AccessDecision::Allow;
        }
        guard(route, self.session.capabilities().as_ref())
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("api", &self.api)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
