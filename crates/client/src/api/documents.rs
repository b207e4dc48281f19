use std::time::Duration;

use reqwest::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use casedesk_core::{ClientId, Document, DocumentId, DocumentStatus, DocumentUpload, DownloadedDocument};

use super::{ApiClient, ApiError, ApiResponse};

const LIST_KEYS: &[&str] = &["documents"];
const RECORD_KEYS: &[&str] = &["document"];

/// The only call with a client-side timeout.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct StatusChange<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

pub struct DocumentsApi<'a> {
    api: &'a ApiClient,
}

impl<'a> DocumentsApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// All documents visible to the caller, or one client's when `client_id` is set.
    pub async fn list(&self, client_id: Option<&ClientId>) -> Result<ApiResponse<Vec<Document>>, ApiError> {
        const CONTEXT: &str = "Failed to fetch documents";
        let mut req = self.api.request(Method::GET, CONTEXT, &["documents"])?;
        if let Some(client_id) = client_id {
            req = req.query(&[("clientId", client_id.as_str())]);
        }
        self.api.send_list(CONTEXT, req, LIST_KEYS).await
    }

    pub async fn get(&self, id: &DocumentId) -> Result<ApiResponse<Document>, ApiError> {
        const CONTEXT: &str = "Failed to fetch document";
        let req = self.api.request(Method::GET, CONTEXT, &["documents", id.as_str()])?;
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    /// Multipart upload: the file under `file` plus its metadata fields.
    pub async fn upload(&self, upload: DocumentUpload) -> Result<ApiResponse<Document>, ApiError> {
        const CONTEXT: &str = "Failed to upload document";
        let file = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.mime_type)
            .map_err(|e| ApiError::Request {
                context: CONTEXT,
                message: e.to_string(),
            })?;

        let mut form = Form::new().part("file", file).text("type", upload.doc_type);
        if let Some(client_id) = upload.client_id {
            form = form.text("clientId", String::from(client_id));
        }
        if let Some(case_id) = upload.case_id {
            form = form.text("caseId", String::from(case_id));
        }
        if !upload.tags.is_empty() {
            form = form.text("tags", upload.tags.join(","));
        }

        let req = self
            .api
            .request(Method::POST, CONTEXT, &["documents", "upload"])?
            .multipart(form);
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    pub async fn download(&self, id: &DocumentId) -> Result<ApiResponse<DownloadedDocument>, ApiError> {
        const CONTEXT: &str = "Failed to download document";
        let req = self
            .api
            .request(Method::GET, CONTEXT, &["documents", id.as_str(), "download"])?
            .timeout(DOWNLOAD_TIMEOUT);
        let resp = self.api.send_raw(CONTEXT, req).await?;

        let status = resp.status();
        let header = |name: HeaderName| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE);
        let file_name = header(CONTENT_DISPOSITION).as_deref().and_then(disposition_file_name);

        let bytes = resp.bytes().await.map_err(|e| ApiError::Network {
            context: CONTEXT,
            message: e.to_string(),
        })?;

        Ok(ApiResponse {
            data: DownloadedDocument {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            },
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }

    pub async fn update_status(
        &self,
        id: &DocumentId,
        status: DocumentStatus,
        notes: Option<&str>,
    ) -> Result<ApiResponse<Document>, ApiError> {
        const CONTEXT: &str = "Failed to update document status";
        let req = self
            .api
            .request(Method::PUT, CONTEXT, &["documents", id.as_str(), "status"])?
            .json(&StatusChange {
                status: status.as_str(),
                notes,
            });
        self.api.send_record(CONTEXT, req, RECORD_KEYS).await
    }

    pub async fn delete(&self, id: &DocumentId) -> Result<ApiResponse<Value>, ApiError> {
        const CONTEXT: &str = "Failed to delete document";
        let req = self.api.request(Method::DELETE, CONTEXT, &["documents", id.as_str()])?;
        self.api.send(CONTEXT, req).await
    }
}

/// `filename` from a `Content-Disposition` value, quoted or bare.
fn disposition_file_name(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|param| {
        let (key, raw) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let name = raw.trim().trim_matches('"');
        (!name.is_empty()).then(|| name.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_file_name_from_disposition() {
        assert_eq!(
            disposition_file_name(r#"attachment; filename="I-130 petition.pdf""#).as_deref(),
            Some("I-130 petition.pdf")
        );
        assert_eq!(
            disposition_file_name("attachment; FILENAME=passport.jpg").as_deref(),
            Some("passport.jpg")
        );
        assert_eq!(disposition_file_name("inline"), None);
        assert_eq!(disposition_file_name(r#"attachment; filename="""#), None);
    }
}
