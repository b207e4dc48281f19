use reqwest::Method;
use serde::Serialize;

use casedesk_core::{Case, CaseId, CaseInput, CaseStatus, ClientId};

use super::{ApiClient, ApiError, ApiResponse};

const LIST_KEYS: &[&str] = &["cases"];
const RECORD_KEYS: &[&str] = &["case"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
}

impl CaseFilter {
    pub fn for_client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            status: None,
        }
    }
}

pub struct CasesApi<'a> {
    api: &'a ApiClient,
}

impl<'a> CasesApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, filter: &CaseFilter) -> Result<ApiResponse<Vec<Case>>, ApiError> {
        const CONTEXT: &str = "Failed to fetch cases";
        let req = self.api.request(Method::GET, CONTEXT, &["cases"])?.query(filter);
        self.api.send_list(CONTEXT, req, LIST_KEYS).await
    }

    pub async fn get(&self, id: &CaseId) -> Result<ApiResponse<Case>, ApiError> {
        const CONTEXT: &str = "Failed to fetch case";
        let req = self.api.request(Method::GET, CONTEXT, &["cases", id.as_str()])?;
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    pub async fn create(&self, input: &CaseInput) -> Result<ApiResponse<Case>, ApiError> {
        const CONTEXT: &str = "Failed to create case";
        let req = self.api.request(Method::POST, CONTEXT, &["cases"])?.json(input);
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    pub async fn update(&self, id: &CaseId, input: &CaseInput) -> Result<ApiResponse<Case>, ApiError> {
        const CONTEXT: &str = "Failed to update case";
        let req = self
            .api
            .request(Method::PUT, CONTEXT, &["cases", id.as_str()])?
            .json(input);
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }
}
