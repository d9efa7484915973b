use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - session may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body returned by the REST data API.
/// Auth endpoints use `msg`/`error_description` instead of `message`.
#[derive(Debug, Default, Deserialize)]
struct BackendErrorBody {
    #[serde(alias = "msg", alias = "error_description")]
    message: Option<String>,
    code: Option<serde_json::Value>,
    details: Option<String>,
    hint: Option<String>,
}

impl BackendErrorBody {
    fn summary(&self) -> Option<String> {
        let message = self.message.as_deref()?;
        let mut out = message.to_string();
        if let Some(ref code) = self.code {
            let code = match code {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out = format!("{} [{}]", out, code);
        }
        if let Some(ref details) = self.details {
            out = format!("{} ({})", out, details);
        }
        if let Some(ref hint) = self.hint {
            out = format!("{} hint: {}", out, hint);
        }
        Some(out)
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Prefer the backend's structured message, fall back to the raw body
    fn describe(body: &str) -> String {
        serde_json::from_str::<BackendErrorBody>(body)
            .ok()
            .and_then(|b| b.summary())
            .map(|s| Self::truncate_body(&s))
            .unwrap_or_else(|| Self::truncate_body(body))
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let described = Self::describe(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(described),
            404 | 406 => ApiError::NotFound(described),
            409 => ApiError::Conflict(described),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(described),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, described)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_uses_backend_message() {
        let body = r#"{"code":"23505","details":"Key (email)=(a@b.co) already exists.","hint":null,"message":"duplicate key value violates unique constraint"}"#;
        let err = ApiError::from_status(StatusCode::CONFLICT, body);
        match err {
            ApiError::Conflict(msg) => {
                assert!(msg.starts_with("duplicate key value violates unique constraint [23505]"));
                assert!(msg.contains("already exists"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_status_auth_body() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            err.to_string(),
            "Invalid response: Status 400 Bad Request: Invalid login credentials"
        );
    }

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(ApiError::from_status(StatusCode::UNAUTHORIZED, ""), ApiError::Unauthorized));
        assert!(matches!(ApiError::from_status(StatusCode::FORBIDDEN, "rls"), ApiError::AccessDenied(_)));
        assert!(matches!(ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""), ApiError::RateLimited));
        assert!(matches!(ApiError::from_status(StatusCode::BAD_GATEWAY, "down"), ApiError::ServerError(_)));
    }

    #[test]
    fn test_truncate_body() {
        let long = "é".repeat(400);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated, 800 total bytes"));
    }
}
