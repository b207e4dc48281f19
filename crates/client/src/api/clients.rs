use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use casedesk_core::{Client, ClientId, ClientInput};

use super::{ApiClient, ApiError, ApiResponse};

/// Firms' client listings come back as either `clients` or `users`.
const LIST_KEYS: &[&str] = &["clients", "users"];
const RECORD_KEYS: &[&str] = &["client", "user"];

/// Search and paging for the client list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ClientQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }
}

pub struct ClientsApi<'a> {
    api: &'a ApiClient,
}

impl<'a> ClientsApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &ClientQuery) -> Result<ApiResponse<Vec<Client>>, ApiError> {
        const CONTEXT: &str = "Failed to fetch clients";
        let req = self.api.request(Method::GET, CONTEXT, &["clients"])?.query(query);
        self.api.send_list(CONTEXT, req, LIST_KEYS).await
    }

    pub async fn get(&self, id: &ClientId) -> Result<ApiResponse<Client>, ApiError> {
        const CONTEXT: &str = "Failed to fetch client";
        let req = self.api.request(Method::GET, CONTEXT, &["clients", id.as_str()])?;
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    pub async fn create(&self, input: &ClientInput) -> Result<ApiResponse<Client>, ApiError> {
        const CONTEXT: &str = "Failed to create client";
        let req = self.api.request(Method::POST, CONTEXT, &["clients"])?.json(input);
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    pub async fn update(&self, id: &ClientId, input: &ClientInput) -> Result<ApiResponse<Client>, ApiError> {
        const CONTEXT: &str = "Failed to update client";
        let req = self
            .api
            .request(Method::PUT, CONTEXT, &["clients", id.as_str()])?
            .json(input);
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    pub async fn delete(&self, id: &ClientId) -> Result<ApiResponse<Value>, ApiError> {
        const CONTEXT: &str = "Failed to delete client";
        let req = self.api.request(Method::DELETE, CONTEXT, &["clients", id.as_str()])?;
        self.api.send(CONTEXT, req).await
    }
}
