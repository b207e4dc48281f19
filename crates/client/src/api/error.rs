use serde_json::Value;
use thiserror::Error;

/// Failure of one wrapper call.
///
/// `context` is the domain prefix shown to the user, e.g. `"Failed to fetch clients"`,
/// so `to_string()` reads `"Failed to fetch clients: <reason>"`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{context}: {message}")]
    Network {
        context: &'static str,
        message: String,
    },

    #[error("{context}: {message}")]
    Status {
        context: &'static str,
        status: u16,
        message: String,
    },

    #[error("{context}: invalid response: {message}")]
    Decode {
        context: &'static str,
        message: String,
    },

    #[error("{context}: invalid request: {message}")]
    Request {
        context: &'static str,
        message: String,
    },
}

impl ApiError {
    pub fn context(&self) -> &'static str {
        match self {
            ApiError::Network { context, .. }
            | ApiError::Status { context, .. }
            | ApiError::Decode { context, .. }
            | ApiError::Request { context, .. } => context,
        }
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Human-readable reason from an error body.
///
/// Tries the JSON `message`, `error`, then `msg` fields, then the raw text,
/// then the status reason phrase.
pub(crate) fn error_message(body: &str, reason: Option<&str>, status: u16) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error", "msg"] {
            if let Some(text) = map.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()) {
                return text.to_string();
            }
        }
    }
    let body = body.trim();
    if !body.is_empty() && body.len() <= 200 && !body.starts_with('<') {
        return body.to_string();
    }
    match reason {
        Some(reason) => format!("{status} {reason}"),
        None => format!("request failed with status {status}"),
    }
}
