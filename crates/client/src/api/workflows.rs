use reqwest::Method;

use casedesk_core::{Workflow, WorkflowId, WorkflowInput};

use super::{ApiClient, ApiError, ApiResponse};

const LIST_KEYS: &[&str] = &["workflows"];
const RECORD_KEYS: &[&str] = &["workflow"];

/// Questionnaire workflows (saved progress through an intake form).
pub struct WorkflowsApi<'a> {
    api: &'a ApiClient,
}

impl<'a> WorkflowsApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    fn disabled<T: Default>(&self) -> Option<ApiResponse<T>> {
        self.api.gate(self.api.features().workflows, "workflows")
    }

    pub async fn list(&self) -> Result<ApiResponse<Vec<Workflow>>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to fetch workflows";
        let req = self.api.request(Method::GET, CONTEXT, &["workflows"])?;
        self.api.send_list(CONTEXT, req, LIST_KEYS).await
    }

    pub async fn get(&self, id: &WorkflowId) -> Result<ApiResponse<Workflow>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to fetch workflow";
        let req = self.api.request(Method::GET, CONTEXT, &["workflows", id.as_str()])?;
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    pub async fn save(&self, input: &WorkflowInput) -> Result<ApiResponse<Workflow>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to save workflow";
        let req = self.api.request(Method::POST, CONTEXT, &["workflows"])?.json(input);
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    pub async fn update(&self, id: &WorkflowId, input: &WorkflowInput) -> Result<ApiResponse<Workflow>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to update workflow";
        let req = self
            .api
            .request(Method::PUT, CONTEXT, &["workflows", id.as_str()])?
            .json(input);
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }
}
