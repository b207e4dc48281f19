use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Forgiving decoder for the payload segment: padding optional, trailing bits
/// ignored. Input is translated to the standard alphabet first.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Claims read from an access token payload.
///
/// The signature is never checked here: the API does that. The client only
/// needs to know when its own copy of the token stops being accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    /// Expiration instant, epoch milliseconds.
    pub expires_at_ms: i64,

    /// Issued-at instant, epoch milliseconds.
    pub issued_at_ms: Option<i64>,

    /// Standard subject (the user id for this API).
    pub subject: Option<String>,

    /// The whole decoded payload, for claims this crate doesn't model.
    pub payload: Map<String, Value>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires_at_ms)
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

#[derive(Debug, Error)]
pub enum TokenDecodeError {
    #[error("token has no payload segment")]
    MissingPayload,

    #[error("payload is not base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has no `exp` claim")]
    MissingExp,

    #[error("`exp` claim is not numeric")]
    NonNumericExp,

    #[error("`exp` claim is out of range")]
    ExpOutOfRange,
}

/// Outcome of reading a token's expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenExpiry {
    /// Token expires at this epoch-millisecond instant.
    At(i64),
    /// Token could not be decoded. Callers skip their check; this is not "expired".
    Unavailable,
}

impl TokenExpiry {
    pub fn as_millis(self) -> Option<i64> {
        match self {
            TokenExpiry::At(ms) => Some(ms),
            TokenExpiry::Unavailable => None,
        }
    }
}

fn seconds_to_millis(value: &Value) -> Result<i64, TokenDecodeError> {
    let secs = value.as_f64().ok_or(TokenDecodeError::NonNumericExp)?;
    let ms = (secs * 1000.0).round();
    if !ms.is_finite() || ms < i64::MIN as f64 || ms > i64::MAX as f64 {
        return Err(TokenDecodeError::ExpOutOfRange);
    }
    Ok(ms as i64)
}

/// Decode the payload segment of a compact token.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenDecodeError> {
    let segment = token
        .trim()
        .split('.')
        .nth(1)
        .filter(|s| !s.is_empty())
        .ok_or(TokenDecodeError::MissingPayload)?;

    let standard: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let bytes = PAYLOAD_ENGINE.decode(standard.as_bytes())?;
    let text = String::from_utf8(bytes)?;
    let payload = match serde_json::from_str::<Value>(&text)? {
        Value::Object(map) => map,
        _ => return Err(TokenDecodeError::NotAnObject),
    };

    let expires_at_ms = seconds_to_millis(payload.get("exp").ok_or(TokenDecodeError::MissingExp)?)?;
    let issued_at_ms = payload.get("iat").and_then(|v| seconds_to_millis(v).ok());
    let subject = payload
        .get("sub")
        .or_else(|| payload.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(TokenClaims {
        expires_at_ms,
        issued_at_ms,
        subject,
        payload,
    })
}

/// Absolute expiration of `token`, or `Unavailable` if it cannot be read.
///
/// Never fails: decode errors are logged and mapped to `Unavailable`.
pub fn token_expiry(token: &str) -> TokenExpiry {
    match decode_claims(token) {
        Ok(claims) => TokenExpiry::At(claims.expires_at_ms),
        Err(err) => {
            tracing::debug!(error = %err, "token expiry unavailable");
            TokenExpiry::Unavailable
        }
    }
}

/// Milliseconds until `token` expires (negative once past), if decodable.
pub fn remaining_ms(token: &str, now_ms: i64) -> Option<i64> {
    token_expiry(token)
        .as_millis()
        .map(|exp| exp.saturating_sub(now_ms))
}
