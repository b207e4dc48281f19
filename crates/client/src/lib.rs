//! `casedesk-client`
//!
//! **Responsibility:** everything the case-management screens consume.
//!
//! This crate provides:
//! - Durable session storage (SQLite, or in-memory)
//! - The auth session store and its role-derived capability flags
//! - Thin async wrappers over the REST API, one group per resource
//! - The session-expiry monitor (countdown warning, forced logout)
//! - Routes with access guards, and record reconciliation helpers
//!
//! Rendering is left to the embedding shell; it plugs in through
//! [`monitor::ExpiryEffects`].

pub mod api;
pub mod app;
pub mod config;
pub mod monitor;
pub mod nav;
pub mod reconcile;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ApiError, ApiResponse};
pub use app::{AppError, AppState};
pub use config::{ClientConfig, ConfigError, FeatureFlags};
pub use monitor::{Clock, ExpiryEffects, MonitorHandle, SessionExpiryMonitor, SystemClock};
pub use nav::{guard, AccessDecision, Route};
pub use reconcile::{documents_for_client, workflows_for_client, ClientLinked, MatchStrategy};
pub use session::{AuthSession, SessionError};
pub use storage::{MemoryStorage, SqliteStorage, Storage, StorageError, StorageKey};
