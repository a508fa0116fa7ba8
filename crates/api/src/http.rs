//! # HTTP Utilities
//!
//! Helpers for classifying request paths and interpreting response bodies.
//! The portal backend answers either with a bare JSON document or with an
//! envelope of the form `{ "data": ..., "message": ... }`; both are accepted.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ApiError;
use crate::endpoints::PUBLIC_PATH_PREFIXES;

/// Whether `path` belongs to the public allow-list and must not carry the bearer token.
///
/// Matching is by path prefix on segment boundaries; any query string is ignored.
/// `extra` holds additional prefixes from configuration.
///
/// # Example
/// ```rust
/// use sacco_api::http::is_public_path;
///
/// assert!(is_public_path("/auth/login", &[]));
/// assert!(is_public_path("/auth/verify-otp?channel=sms", &[]));
/// assert!(!is_public_path("/auth/loginx", &[]));
/// assert!(!is_public_path("/loan-products", &[]));
/// assert!(is_public_path("/health", &["/health".to_string()]));
/// ```
pub fn is_public_path(path: &str, extra: &[String]) -> bool {
    let path_only = path.split(['?', '#']).next().unwrap_or(path);
    let matches_prefix = |prefix: &str| {
        let prefix = prefix.trim_end_matches('/');
        match path_only.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    };
    PUBLIC_PATH_PREFIXES.iter().any(|prefix| matches_prefix(prefix)) || extra.iter().any(|prefix| matches_prefix(prefix))
}

/// Return a user-friendly error message for common HTTP status codes.
///
/// # Example
/// ```rust
/// use sacco_api::http::status_error_message;
///
/// assert!(status_error_message(403).unwrap().contains("Forbidden"));
/// assert!(status_error_message(404).is_none());
/// ```
pub fn status_error_message(status_code: u16) -> Option<String> {
    match status_code {
        401 => Some("Unauthorized (401). Hint: check your credentials or run `sacco login`".into()),
        403 => Some("Forbidden (403). Hint: your role lacks the permission required for this action".into()),
        _ => None,
    }
}

/// Deserialize a response body, unwrapping a `data` envelope when present.
///
/// An empty body decodes as JSON `null`, which suits unit-like targets.
pub fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str::<Value>(text).map_err(|error| ApiError::Decode(format!("invalid JSON: {}", error)))?
    };
    let payload = match value {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    };
    serde_json::from_value(payload).map_err(|error| ApiError::Decode(error.to_string()))
}

/// Build the message for a failed response: the server's `message`/`error`
/// field when it sent one, otherwise the status hint or the raw body.
pub fn error_message(status_code: u16, text: &str) -> String {
    let server_message = serde_json::from_str::<Value>(text).ok().and_then(|value| {
        ["message", "error", "detail"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
    });
    match (server_message, status_error_message(status_code)) {
        (Some(message), _) => truncate_for_summary(&message, 240),
        (None, Some(hint)) => hint,
        (None, None) if text.trim().is_empty() => "no response body".to_string(),
        (None, None) => truncate_for_summary(text, 240),
    }
}

/// Locate the session token in a login response.
pub fn extract_token(value: &Value) -> Option<String> {
    let candidates = [
        value.get("token"),
        value.get("accessToken"),
        value.pointer("/data/token"),
        value.pointer("/data/accessToken"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
        .filter(|token| !token.trim().is_empty())
        .map(str::to_string)
}

fn truncate_for_summary(text: &str, max_len: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_len {
        return trimmed.to_string();
    }

    // Reserve space for the trailing ellipsis ("...").
    let target_len = max_len.saturating_sub(3);
    let truncated: String = trimmed.chars().take(target_len).collect();
    format!("{}...", truncated.trim_end())
}
