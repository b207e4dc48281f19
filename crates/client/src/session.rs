//! The auth session store.
//!
//! One `AuthSession` per process, shared by `Arc`. It is the only writer of the
//! durable `token`/`user`/`companyId` entries; API wrappers and the expiry
//! monitor only read them. Lifecycle: `hydrate` → `login`/`update` → `logout`
//! or `expire`.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use casedesk_auth::{
    authorize, AttorneyRegistration, AuthGrant, AuthzError, Capabilities, Capability,
    ClientRegistration, LoginRequest, ProfileUpdate, User,
};

use crate::api::{ApiClient, ApiError};
use crate::storage::{Storage, StorageError, StorageKey};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to encode user record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug)]
struct SessionState {
    user: Option<User>,
    token: Option<String>,
    loading: bool,
}

pub struct AuthSession {
    api: ApiClient,
    storage: Arc<dyn Storage>,
    state: RwLock<SessionState>,
}

impl AuthSession {
    /// A session in the loading state; call [`AuthSession::hydrate`] next.
    pub fn new(api: ApiClient, storage: Arc<dyn Storage>) -> Self {
        Self {
            api,
            storage,
            state: RwLock::new(SessionState {
                user: None,
                token: None,
                loading: true,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Restore the persisted user and token. An unreadable user record is
    /// treated as no session.
    pub async fn hydrate(&self) -> Result<(), SessionError> {
        let loaded = self.load_persisted().await;
        let mut state = self.write();
        state.loading = false;
        let (user, token) = loaded?;
        tracing::info!(authenticated = user.is_some(), "session hydrated");
        state.user = user;
        state.token = token;
        Ok(())
    }

    async fn load_persisted(&self) -> Result<(Option<User>, Option<String>), SessionError> {
        let token = self.storage.get(StorageKey::Token).await?;
        let user = match self.storage.get(StorageKey::User).await? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring unreadable stored user");
                    None
                }
            },
            None => None,
        };
        Ok((user, token))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let grant = self
            .api
            .auth()
            .login(&LoginRequest::new(email, password))
            .await?
            .data;
        tracing::info!(role = %grant.user.role, "logged in");
        self.persist(grant).await
    }

    pub async fn register_attorney(&self, form: &AttorneyRegistration) -> Result<User, SessionError> {
        let grant = self.api.auth().register_attorney(form).await?.data;
        tracing::info!("attorney account registered");
        self.persist(grant).await
    }

    pub async fn register_client(&self, form: &ClientRegistration) -> Result<User, SessionError> {
        let grant = self.api.auth().register_client(form).await?.data;
        tracing::info!("client account registered");
        self.persist(grant).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, SessionError> {
        let user = self.api.auth().update_profile(update).await?.data;
        self.persist(AuthGrant { token: None, user }).await
    }

    /// Re-fetch the current user from the API and persist it.
    pub async fn refresh_profile(&self) -> Result<User, SessionError> {
        let user = self.api.auth().profile().await?.data;
        self.persist(AuthGrant { token: None, user }).await
    }

    /// Write the full user record, the token if one came back, and the
    /// company id for firm-scoped roles. Any other role drops a company id
    /// left behind by an earlier session.
    async fn persist(&self, grant: AuthGrant) -> Result<User, SessionError> {
        let AuthGrant { token, user } = grant;
        let record = serde_json::to_string(&user)?;

        if let Some(token) = &token {
            self.storage.set(StorageKey::Token, token).await?;
        }
        self.storage.set(StorageKey::User, &record).await?;
        if !user.role.is_company_scoped() {
            self.storage.remove(StorageKey::CompanyId).await?;
        } else if let Some(company_id) = &user.company_id {
            self.storage.set(StorageKey::CompanyId, company_id.as_str()).await?;
        }

        let mut state = self.write();
        if token.is_some() {
            state.token = token;
        }
        state.user = Some(user.clone());
        state.loading = false;
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        self.clear();
        for key in [StorageKey::Token, StorageKey::User, StorageKey::CompanyId] {
            self.storage.remove(key).await?;
        }
        tracing::info!("logged out");
        Ok(())
    }

    /// End a session whose token ran out. `companyId` is kept.
    pub async fn expire(&self) -> Result<(), SessionError> {
        self.clear();
        for key in [StorageKey::Token, StorageKey::User] {
            self.storage.remove(key).await?;
        }
        tracing::info!("session expired");
        Ok(())
    }

    fn clear(&self) {
        let mut state = self.write();
        state.user = None;
        state.token = None;
    }

    /// The token as currently persisted (another process may have replaced it).
    pub async fn stored_token(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(StorageKey::Token).await
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().user.is_some()
    }

    /// Role flags of the current user; `None` when nobody is logged in.
    pub fn capabilities(&self) -> Option<Capabilities> {
        self.read().user.as_ref().map(User::capabilities)
    }

    pub fn authorize(&self, required: &[Capability]) -> Result<(), AuthzError> {
        authorize(self.capabilities().as_ref(), required)
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("AuthSession")
            .field("authenticated", &state.user.is_some())
            .field("loading", &state.loading)
            .finish_non_exhaustive()
    }
}
