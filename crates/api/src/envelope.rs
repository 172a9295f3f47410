//! Normalization of backend responses into a single success/failure shape.
//!
//! The backend wraps payloads as `{ "ok": true, "data": .. }` or
//! `{ "ok": false, "error": { "code", "message", "details" } }`, but older
//! endpoints return the bare payload. Everything that comes back over HTTP
//! goes through [`normalize`] so callers only ever see an [`Envelope`].

use crate::error::{ApiError, INVALID_RESPONSE, NETWORK_ERROR};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

const DEFAULT_FAILURE_CODE: &str = "REQUEST_FAILED";
const DEFAULT_FAILURE_MESSAGE: &str = "Request failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl EnvelopeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        let details = details.into();
        self.details = (!details.is_empty()).then_some(details);
        self
    }
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for EnvelopeError {}

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Ok(T),
    Err(EnvelopeError),
}

impl<T> Envelope<T> {
    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Envelope::Err(EnvelopeError::new(code, message))
    }

    /// False only when the request never got an answer from the backend.
    pub fn reached_backend(&self) -> bool {
        !matches!(self, Envelope::Err(e) if e.code == NETWORK_ERROR)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Envelope::Ok(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Envelope::Ok(data) => Some(data),
            Envelope::Err(_) => None,
        }
    }

    pub fn error(&self) -> Option<&EnvelopeError> {
        match self {
            Envelope::Ok(_) => None,
            Envelope::Err(error) => Some(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        match self {
            Envelope::Ok(data) => Envelope::Ok(f(data)),
            Envelope::Err(error) => Envelope::Err(error),
        }
    }

    pub fn into_result(self) -> Result<T, EnvelopeError> {
        self.into()
    }
}

impl<T> From<Envelope<T>> for Result<T, EnvelopeError> {
    fn from(envelope: Envelope<T>) -> Self {
        match envelope {
            Envelope::Ok(data) => Ok(data),
            Envelope::Err(error) => Err(error),
        }
    }
}

impl<T> From<Result<T, EnvelopeError>> for Envelope<T> {
    fn from(result: Result<T, EnvelopeError>) -> Self {
        match result {
            Ok(data) => Envelope::Ok(data),
            Err(error) => Envelope::Err(error),
        }
    }
}

impl Envelope<Value> {
    /// Converts the untyped payload into `T`. A payload of the wrong shape is
    /// reported as an `INVALID_RESPONSE` failure rather than an error.
    pub fn decode<T: DeserializeOwned>(self) -> Envelope<T> {
        match self {
            Envelope::Ok(value) => match serde_json::from_value(value) {
                Ok(data) => Envelope::Ok(data),
                Err(e) => Envelope::Err(ApiError::from(e).into()),
            },
            Envelope::Err(error) => Envelope::Err(error),
        }
    }
}

/// The two shapes a successful body can take.
enum Body {
    Enveloped {
        ok: Option<bool>,
        data: Option<Value>,
        error: Option<Value>,
    },
    Bare(Value),
}

impl Body {
    fn classify(value: Value) -> Self {
        match value {
            Value::Object(mut map)
                if ["ok", "data", "error"].iter().any(|k| map.contains_key(*k)) =>
            {
                Body::Enveloped {
                    ok: map.get("ok").and_then(Value::as_bool),
                    data: map.remove("data"),
                    error: map.remove("error"),
                }
            }
            other => Body::Bare(other),
        }
    }
}

/// Turns a raw HTTP status and body into an [`Envelope`]. Pure; never panics.
pub fn normalize(status: u16, body: &[u8]) -> Envelope<Value> {
    if !(200..300).contains(&status) {
        return Envelope::Err(http_failure(status, body));
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Envelope::Ok(Value::Null);
    }

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return Envelope::Err(
                EnvelopeError::new(INVALID_RESPONSE, "The backend returned malformed JSON")
                    .with_details(e.to_string()),
            )
        }
    };

    match Body::classify(value) {
        Body::Enveloped {
            ok: Some(false),
            error,
            ..
        } => Envelope::Err(application_failure(error)),
        Body::Enveloped { data, .. } => Envelope::Ok(data.unwrap_or(Value::Null)),
        Body::Bare(value) => Envelope::Ok(value),
    }
}

fn application_failure(error: Option<Value>) -> EnvelopeError {
    match error {
        Some(Value::Object(map)) => EnvelopeError {
            code: string_field(&map, "code").unwrap_or_else(|| DEFAULT_FAILURE_CODE.to_string()),
            message: string_field(&map, "message")
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            details: details_field(&map),
        },
        Some(Value::String(message)) if !message.trim().is_empty() => {
            EnvelopeError::new(DEFAULT_FAILURE_CODE, message)
        }
        _ => EnvelopeError::new(DEFAULT_FAILURE_CODE, DEFAULT_FAILURE_MESSAGE),
    }
}

fn http_failure(status: u16, body: &[u8]) -> EnvelopeError {
    let fallback_code = format!("HTTP_{status}");
    let text = String::from_utf8_lossy(body);

    let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
        let trimmed = text.trim();
        let message = if trimmed.is_empty() {
            format!("Request failed: {status}")
        } else {
            trimmed.to_string()
        };
        return EnvelopeError::new(fallback_code, message);
    };

    let nested = map.get("error").and_then(Value::as_object);
    let message = nested
        .and_then(|e| string_field(e, "message"))
        .or_else(|| string_field(&map, "message"))
        .or_else(|| string_field(&map, "error"))
        .unwrap_or_else(|| format!("Request failed: {status}"));
    let code = nested
        .and_then(|e| string_field(e, "code"))
        .or_else(|| string_field(&map, "code"))
        .unwrap_or(fallback_code);

    EnvelopeError {
        code,
        message,
        details: nested.and_then(details_field),
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn details_field(map: &Map<String, Value>) -> Option<String> {
    match map.get("details")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bytes(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn non_2xx_prefers_nested_error_message() {
        let body = bytes(json!({ "error": { "code": "NOT_FOUND", "message": "no such connection" } }));
        let env = normalize(404, &body);
        let err = env.error().unwrap();
        assert_eq!(err.code, "NOT_FOUND");
        assert_eq!(err.message, "no such connection");
    }

    #[test]
    fn non_2xx_falls_back_to_top_level_message_then_raw_text() {
        let env = normalize(400, &bytes(json!({ "message": "bad connector" })));
        assert_eq!(env.error().unwrap().message, "bad connector");
        assert_eq!(env.error().unwrap().code, "HTTP_400");

        let env = normalize(502, b"<html>Bad Gateway</html>");
        assert_eq!(env.error().unwrap().message, "<html>Bad Gateway</html>");
    }

    #[test]
    fn non_2xx_message_is_never_empty() {
        for body in [&b""[..], b"   ", b"{}", b"{\"message\":\"\"}", b"{\"error\":{}}", b"null"] {
            for status in [301, 400, 401, 404, 500, 503] {
                let env = normalize(status, body);
                let err = env.error().expect("non-2xx must fail");
                assert!(!err.message.trim().is_empty(), "empty message for {status}");
            }
        }
        let env = normalize(500, b"");
        assert_eq!(env.error().unwrap().message, "Request failed: 500");
    }

    #[test]
    fn ok_false_preserves_code_message_and_details() {
        let body = bytes(json!({
            "ok": false,
            "error": { "code": "INVALID_API_KEY", "message": "key rejected", "details": "401 from upstream" }
        }));
        let env = normalize(200, &body);
        assert_eq!(
            env,
            Envelope::Err(EnvelopeError {
                code: "INVALID_API_KEY".into(),
                message: "key rejected".into(),
                details: Some("401 from upstream".into()),
            })
        );
    }

    #[test]
    fn enveloped_success_unwraps_data_or_null() {
        let env = normalize(200, &bytes(json!({ "ok": true, "data": [1, 2] })));
        assert_eq!(env, Envelope::Ok(json!([1, 2])));

        let env = normalize(201, &bytes(json!({ "ok": true })));
        assert_eq!(env, Envelope::Ok(Value::Null));
    }

    #[test]
    fn bare_payload_is_wrapped_as_data() {
        let body = json!([{ "id": "jira", "name": "Jira", "authMethods": ["oauth"] }]);
        assert_eq!(normalize(200, &bytes(body.clone())), Envelope::Ok(body));

        let obj = json!({ "authUrl": "https://example.test/authorize" });
        assert_eq!(normalize(200, &bytes(obj.clone())), Envelope::Ok(obj));
    }

    #[test]
    fn malformed_json_is_a_failure_not_a_panic() {
        let env = normalize(200, b"{not json");
        assert_eq!(env.error().unwrap().code, INVALID_RESPONSE);
    }

    #[test]
    fn empty_success_body_is_null_data() {
        assert_eq!(normalize(204, b""), Envelope::Ok(Value::Null));
    }

    #[test]
    fn decode_reports_shape_mismatch_as_invalid_response() {
        let env: Envelope<Vec<String>> = Envelope::Ok(json!({ "unexpected": true })).decode();
        let error = env.error().unwrap();
        assert_eq!(error.code, INVALID_RESPONSE);
        assert!(error.details.as_deref().unwrap().starts_with("Invalid response:"));
    }
}
