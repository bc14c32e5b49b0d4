//! Pure helpers: URL building, body decoding, error text (no HTTP, no status logic).

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::{ServiceError, ServiceResult};

/// Longest slice of an error body kept in messages.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Validate and normalise the API base URL (no trailing slash).
pub(crate) fn normalize_base_url(raw: &str) -> ServiceResult<String> {
    let parsed = url::Url::parse(raw).map_err(|e| ServiceError::Config {
        message: format!("invalid API URL {:?}: {}", raw, e),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        other => Err(ServiceError::Config {
            message: format!("unsupported URL scheme: {}", other),
        }),
    }
}

/// URL of a single expense: `{base}/expenses/{id}`.
pub(crate) fn expense_url(base_url: &str, id: i64) -> String {
    format!("{}/expenses/{}", base_url, id)
}

/// Decode a JSON body; shape mismatches become `InvalidResponse`.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &str, what: &str) -> ServiceResult<T> {
    serde_json::from_str(body).map_err(|e| ServiceError::InvalidResponse {
        message: format!("failed to parse {}: {}", what, e),
    })
}

/// Human-readable message for a non-success response.
///
/// Prefers a JSON `{"error": "..."}` or `{"message": "..."}` field, then the
/// raw body (truncated), then the status reason.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = json
            .get("error")
            .or_else(|| json.get("message"))
            .and_then(|v| v.as_str())
        {
            return message.to_string();
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    } else {
        body.chars().take(MAX_ERROR_BODY_CHARS).collect()
    }
}
