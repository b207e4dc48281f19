use reqwest::Method;

use casedesk_core::{ClientId, FoiaCase, FoiaCaseId, FoiaRequest, FoiaStatusReport};

use super::{ApiClient, ApiError, ApiResponse};

const LIST_KEYS: &[&str] = &["foiaCases", "cases"];
const RECORD_KEYS: &[&str] = &["foiaCase", "case"];

/// FOIA records requests filed with agencies on a client's behalf.
pub struct FoiaApi<'a> {
    api: &'a ApiClient,
}

impl<'a> FoiaApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    fn disabled<T: Default>(&self) -> Option<ApiResponse<T>> {
        self.api.gate(self.api.features().foia, "foia")
    }

    pub async fn list(&self, client_id: Option<&ClientId>) -> Result<ApiResponse<Vec<FoiaCase>>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to fetch FOIA cases";
        let mut req = self.api.request(Method::GET, CONTEXT, &["foia-cases"])?;
        if let Some(client_id) = client_id {
            req = req.query(&[("clientId", client_id.as_str())]);
        }
        self.api.send_list(CONTEXT, req, LIST_KEYS).await
    }

    pub async fn get(&self, id: &FoiaCaseId) -> Result<ApiResponse<FoiaCase>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to fetch FOIA case";
        let req = self.api.request(Method::GET, CONTEXT, &["foia-cases", id.as_str()])?;
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    pub async fn create(&self, request: &FoiaRequest) -> Result<ApiResponse<FoiaCase>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to create FOIA case";
        let req = self.api.request(Method::POST, CONTEXT, &["foia-cases"])?.json(request);
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    /// Live status as last reported by the agency.
    pub async fn status(&self, id: &FoiaCaseId) -> Result<ApiResponse<FoiaStatusReport>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to check FOIA status";
        let req = self
            .api
            .request(Method::GET, CONTEXT, &["foia-cases", id.as_str(), "status"])?;
        self.api.send_record(CONTEXT, req, &[]).await
    }
}
