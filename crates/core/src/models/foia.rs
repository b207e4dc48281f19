use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ClientId, FoiaCaseId};

/// A Freedom of Information Act request filed on a client's behalf.
///
/// Submission to the agency happens server-side; this is the tracking record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoiaCase {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<FoiaCaseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    /// Agency-issued control number, once assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_number: Option<String>,
    #[serde(default)]
    pub agency: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoiaRequest {
    pub client_id: ClientId,
    pub agency: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoiaStatusReport {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
}
