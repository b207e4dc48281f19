//! `casedesk-auth` — identity, capability flags and token expiry (no IO).
//!
//! This crate is intentionally decoupled from HTTP, storage and timers: the
//! client crate feeds it tokens and clock readings and executes what it decides.

pub mod authorize;
pub mod claims;
pub mod expiry;
pub mod roles;
pub mod user;

pub use authorize::{authorize, AuthzError, Capability};
pub use claims::{decode_claims, remaining_ms, token_expiry, TokenClaims, TokenDecodeError, TokenExpiry};
pub use expiry::{evaluate, ExpiryAction, ExpiryPhase, ExpiryTracker, POLL_INTERVAL_MS, WARNING_THRESHOLD_MS};
pub use roles::{Capabilities, Role};
pub use user::{
    AttorneyRegistration, AuthGrant, ClientRegistration, LoginRequest, PasswordChange,
    ProfileUpdate, User,
};
