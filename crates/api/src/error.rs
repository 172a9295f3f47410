use crate::envelope::EnvelopeError;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Code attached to synthetic envelopes for transport failures.
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
/// Code attached when a response body is not the JSON we expected.
pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";
/// Code attached when a request could not even be built.
pub const CLIENT_ERROR: &str = "CLIENT_ERROR";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Network(e) if e.is_builder() => CLIENT_ERROR,
            ApiError::Network(_) => NETWORK_ERROR,
            ApiError::Decode(_) => INVALID_RESPONSE,
            ApiError::Url(_) | ApiError::Validation(_) => CLIENT_ERROR,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::Network(e) if e.is_timeout() => "Request timed out. Please try again.",
            ApiError::Network(_) => "Network error. Check your connection and the backend URL.",
            ApiError::Decode(_) => "The backend returned a response that could not be read.",
            ApiError::Url(_) => "The request URL is invalid. Check the configured backend URL.",
            ApiError::Validation(_) => "Invalid input. Please check the form.",
        }
    }
}

impl From<ApiError> for EnvelopeError {
    fn from(error: ApiError) -> Self {
        EnvelopeError::new(error.code(), error.user_message())
            .with_details(redact_secrets(&error.to_string()))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

fn secret_patterns() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)((?:api[_-]?key|token|secret|password)"?\s*[:=]\s*"?|bearer\s+)[^"&\s,}]+"#)
            .expect("secret redaction pattern is valid")
    })
}

/// Masks credential values (`apiKey=...`, `"token": "..."`, bearer tokens)
/// before text reaches logs or the screen.
pub fn redact_secrets(input: &str) -> String {
    secret_patterns()
        .replace_all(input, "${1}[REDACTED]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_key_value_and_json_secrets() {
        let text = r#"bad request apiKey=sk-123&x=1 {"token": "abc"} Bearer xyz"#;
        let redacted = redact_secrets(text);
        assert!(!redacted.contains("sk-123"));
        assert!(!redacted.contains("abc"));
        assert!(!redacted.contains("xyz"));
        assert!(redacted.contains("apiKey=[REDACTED]"));
    }

    #[test]
    fn validation_error_maps_to_client_code() {
        let envelope: EnvelopeError = ApiError::Validation("missing field".into()).into();
        assert_eq!(envelope.code, CLIENT_ERROR);
        assert!(!envelope.message.is_empty());
        assert_eq!(envelope.details.as_deref(), Some("Validation error: missing field"));
    }
}
