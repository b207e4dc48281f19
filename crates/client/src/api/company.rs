use reqwest::Method;

use casedesk_auth::User;
use casedesk_core::{Company, CompanyId, CompanyInput};

use super::{ApiClient, ApiError, ApiResponse};

const RECORD_KEYS: &[&str] = &["company"];
const USER_KEYS: &[&str] = &["users"];

/// The caller's firm and its staff.
pub struct CompanyApi<'a> {
    api: &'a ApiClient,
}

impl<'a> CompanyApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    fn disabled<T: Default>(&self) -> Option<ApiResponse<T>> {
        self.api.gate(self.api.features().company, "company")
    }

    pub async fn get(&self, id: &CompanyId) -> Result<ApiResponse<Company>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to fetch company";
        let req = self.api.request(Method::GET, CONTEXT, &["companies", id.as_str()])?;
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    pub async fn update(&self, id: &CompanyId, input: &CompanyInput) -> Result<ApiResponse<Company>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to update company";
        let req = self
            .api
            .request(Method::PUT, CONTEXT, &["companies", id.as_str()])?
            .json(input);
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    pub async fn users(&self, id: &CompanyId) -> Result<ApiResponse<Vec<User>>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to fetch company users";
        let req = self
            .api
            .request(Method::GET, CONTEXT, &["companies", id.as_str(), "users"])?;
        self.api.send_list(CONTEXT, req, USER_KEYS).await
    }
}
