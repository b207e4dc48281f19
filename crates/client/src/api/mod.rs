//! Thin async wrappers over the upstream REST API.
//!
//! [`ApiClient`] owns the HTTP client, the base URL and read-only access to the
//! stored bearer token. Each resource module exposes a borrowed view
//! (`api.clients().list(..)`) with one method per endpoint.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ClientConfig, FeatureFlags};
use crate::storage::{Storage, StorageKey};

pub mod auth;
pub mod billing;
pub mod cases;
pub mod clients;
pub mod company;
pub mod documents;
pub mod envelope;
pub mod error;
pub mod foia;
pub mod workflows;

pub use auth::AuthApi;
pub use billing::BillingApi;
pub use cases::{CaseFilter, CasesApi};
pub use clients::{ClientQuery, ClientsApi};
pub use company::CompanyApi;
pub use documents::DocumentsApi;
pub use envelope::{ApiResponse, FEATURE_DISABLED};
pub use error::ApiError;
pub use foia::FoiaApi;
pub use workflows::WorkflowsApi;

/// Shared HTTP front for every wrapper group. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn Storage>,
    features: FeatureFlags,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.api_url).map_err(|e| ApiError::Request {
            context: "Invalid API URL",
            message: format!("{}: {}", config.api_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Request {
                context: "Invalid API URL",
                message: config.api_url.clone(),
            });
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            storage,
            features: config.features,
        })
    }

    pub fn features(&self) -> FeatureFlags {
        self.features
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn clients(&self) -> ClientsApi<'_> {
        ClientsApi::new(self)
    }

    pub fn cases(&self) -> CasesApi<'_> {
        CasesApi::new(self)
    }

    pub fn documents(&self) -> DocumentsApi<'_> {
        DocumentsApi::new(self)
    }

    pub fn billing(&self) -> BillingApi<'_> {
        BillingApi::new(self)
    }

    pub fn company(&self) -> CompanyApi<'_> {
        CompanyApi::new(self)
    }

    pub fn foia(&self) -> FoiaApi<'_> {
        FoiaApi::new(self)
    }

    pub fn workflows(&self) -> WorkflowsApi<'_> {
        WorkflowsApi::new(self)
    }

    /// Base URL plus path segments; each segment is percent-encoded.
    pub(crate) fn endpoint(&self, context: &'static str, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Request {
                context,
                message: format!("base URL {} cannot take a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request(
        &self,
        method: Method,
        context: &'static str,
        segments: &[&str],
    ) -> Result<RequestBuilder, ApiError> {
        Ok(self.http.request(method, self.endpoint(context, segments)?))
    }

    /// Neutral envelope when a wrapper group is switched off.
    pub(crate) fn gate<T: Default>(&self, enabled: bool, group: &'static str) -> Option<ApiResponse<T>> {
        if enabled {
            None
        } else {
            tracing::debug!(group, "feature disabled; skipping request");
            Some(ApiResponse::disabled())
        }
    }

    async fn with_bearer(&self, req: RequestBuilder) -> RequestBuilder {
        match self.storage.get(StorageKey::Token).await {
            Ok(Some(token)) => req.bearer_auth(token),
            Ok(None) => req,
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored token; sending unauthenticated");
                req
            }
        }
    }

    /// Send with the stored bearer token; non-2xx becomes [`ApiError::Status`].
    pub(crate) async fn send_raw(
        &self,
        context: &'static str,
        req: RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let resp = self
            .with_bearer(req)
            .await
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(context, error = %e, "request failed");
                ApiError::Network {
                    context,
                    message: e.to_string(),
                }
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = error::error_message(&body, status.canonical_reason(), status.as_u16());
        tracing::warn!(context, status = status.as_u16(), %message, "request rejected");
        Err(ApiError::Status {
            context,
            status: status.as_u16(),
            message,
        })
    }

    /// Send and read the body as JSON; an empty body is `null`, plain text a JSON string.
    pub(crate) async fn send(
        &self,
        context: &'static str,
        req: RequestBuilder,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let resp = self.send_raw(context, req).await?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| ApiError::Network {
            context,
            message: e.to_string(),
        })?;

        let data = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        };

        Ok(ApiResponse {
            data,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }

    pub(crate) async fn send_list<T: DeserializeOwned>(
        &self,
        context: &'static str,
        req: RequestBuilder,
        keys: &[&str],
    ) -> Result<ApiResponse<Vec<T>>, ApiError> {
        let res = self.send(context, req).await?;
        Ok(res.map(|body| envelope::normalize_list(body, keys)))
    }

    pub(crate) async fn send_record<T: DeserializeOwned>(
        &self,
        context: &'static str,
        req: RequestBuilder,
        keys: &[&str],
    ) -> Result<ApiResponse<T>, ApiError> {
        let res = self.send(context, req).await?;
        res.try_map(|body| {
            envelope::normalize_record(body, keys).map_err(|e| ApiError::Decode {
                context,
                message: e.to_string(),
            })
        })
    }
}
