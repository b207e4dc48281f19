use reqwest::Method;

use casedesk_core::{Plan, SubscribeRequest, Subscription};

use super::{ApiClient, ApiError, ApiResponse};

const PLAN_KEYS: &[&str] = &["plans"];
const SUBSCRIPTION_KEYS: &[&str] = &["subscription"];

/// `/billing/*`; answers with neutral envelopes when billing is switched off.
pub struct BillingApi<'a> {
    api: &'a ApiClient,
}

impl<'a> BillingApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    fn disabled<T: Default>(&self) -> Option<ApiResponse<T>> {
        self.api.gate(self.api.features().billing, "billing")
    }

    pub async fn plans(&self) -> Result<ApiResponse<Vec<Plan>>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to fetch plans";
        let req = self.api.request(Method::GET, CONTEXT, &["billing", "plans"])?;
        self.api.send_list(CONTEXT, req, PLAN_KEYS).await
    }

    pub async fn subscription(&self) -> Result<ApiResponse<Subscription>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to fetch subscription";
        let req = self.api.request(Method::GET, CONTEXT, &["billing", "subscription"])?;
        self.api.send_record(CONTEXT, req, SUBSCRIPTION_KEYS).await
    }

    pub async fn subscribe(&self, request: &SubscribeRequest) -> Result<ApiResponse<Subscription>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to subscribe";
        let req = self
            .api
            .request(Method::POST, CONTEXT, &["billing", "subscribe"])?
            .json(request);
        self.api.send_record(CONTEXT, req, SUBSCRIPTION_KEYS).await
    }

    pub async fn cancel(&self) -> Result<ApiResponse<Subscription>, ApiError> {
        if let Some(res) = self.disabled() {
            return Ok(res);
        }
        const CONTEXT: &str = "Failed to cancel subscription";
        let req = self.api.request(Method::POST, CONTEXT, &["billing", "cancel"])?;
        self.api.send_record(CONTEXT, req, SUBSCRIPTION_KEYS).await
    }
}
