use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CaseId, ClientId, DocumentId, UserId};

/// Review status of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Verified,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Verified => "verified",
            DocumentStatus::Rejected => "rejected",
            DocumentStatus::Unknown => "unknown",
        }
    }
}

/// Metadata of a document stored by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    #[serde(default, alias = "fileName")]
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default = "default_document_status")]
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<CaseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_document_status() -> DocumentStatus {
    DocumentStatus::Pending
}

/// A file to upload along with its metadata fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub doc_type: String,
    pub client_id: Option<ClientId>,
    pub case_id: Option<CaseId>,
    pub tags: Vec<String>,
}

/// Raw bytes returned by the download endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedDocument {
    /// From `Content-Disposition`, when the server sends one.
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}
