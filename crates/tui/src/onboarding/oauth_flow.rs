use linkdeck_api::EnvelopeError;
use url::form_urlencoded;

pub const OAUTH_FAILED: &str = "OAUTH_FAILED";
pub const INVALID_CALLBACK: &str = "INVALID_CALLBACK";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthStatus {
    NotStarted,
    Initiating,
    WaitingForCallback,
    Completed,
    Failed,
}

pub struct OAuthFlowState {
    pub status: OAuthStatus,
    pub auth_url: Option<String>,
    pub callback_input: String,
}

impl Default for OAuthFlowState {
    fn default() -> Self {
        Self {
            status: OAuthStatus::NotStarted,
            auth_url: None,
            callback_input: String::new(),
        }
    }
}

impl OAuthFlowState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Success,
    Failure(EnvelopeError),
}

/// Parameters the backend appends when it redirects back after an OAuth
/// authorization, e.g. `/connect?status=success&connectorId=jira`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCallback {
    pub connector_id: Option<String>,
    pub connection_id: Option<String>,
    pub outcome: CallbackOutcome,
}

impl OAuthCallback {
    /// Accepts a full callback URL, a path with a query, or a bare query
    /// string. Returns `None` when nothing in it looks like a callback.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let query = match input.split_once('?') {
            Some((_, query)) => query,
            None if input.contains('=') => input,
            None => return None,
        };
        let query = query.split('#').next().unwrap_or_default();

        let mut status = None;
        let mut error = None;
        let mut error_code = None;
        let mut message = None;
        let mut connector_id = None;
        let mut connection_id = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "status" | "oauth" => status = Some(value.to_ascii_lowercase()),
                "error" => error = Some(value),
                // On a success redirect `code` is the provider's authorization code.
                "code" => error_code = Some(value),
                "message" | "error_description" => message = Some(value),
                "connectorId" | "connector" => connector_id = Some(value),
                "connectionId" => connection_id = Some(value),
                _ => {}
            }
        }

        let failed = match status.as_deref() {
            Some("success" | "ok" | "connected") => false,
            Some("error" | "failed" | "failure" | "denied") => true,
            Some(_) => return None,
            None if error.is_some() => true,
            None if connection_id.is_some() => false,
            None => return None,
        };

        let outcome = if failed {
            CallbackOutcome::Failure(EnvelopeError::new(
                error.or(error_code).unwrap_or_else(|| OAUTH_FAILED.to_string()),
                message.unwrap_or_else(|| "Authorization was not completed".to_string()),
            ))
        } else {
            CallbackOutcome::Success
        };

        Some(Self {
            connector_id,
            connection_id,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_success_from_full_url() {
        let cb = OAuthCallback::parse("https://app.example.test/connect?status=success&connectorId=jira")
            .unwrap();
        assert_eq!(cb.outcome, CallbackOutcome::Success);
        assert_eq!(cb.connector_id.as_deref(), Some("jira"));
    }

    #[test]
    fn parses_failure_with_code_and_message() {
        let cb = OAuthCallback::parse("status=error&error=access_denied&message=User+cancelled").unwrap();
        match cb.outcome {
            CallbackOutcome::Failure(err) => {
                assert_eq!(err.code, "access_denied");
                assert_eq!(err.message, "User cancelled");
            }
            CallbackOutcome::Success => panic!("expected failure"),
        }
    }

    #[test]
    fn error_without_status_is_a_failure() {
        let cb = OAuthCallback::parse("/connect?error=invalid_state").unwrap();
        assert!(matches!(cb.outcome, CallbackOutcome::Failure(ref e) if e.code == "invalid_state"));
    }

    #[test]
    fn authorization_code_is_not_mistaken_for_an_error() {
        let cb = OAuthCallback::parse("/connect?code=abc123&state=xyz&connectionId=c9").unwrap();
        assert_eq!(cb.outcome, CallbackOutcome::Success);
        assert_eq!(cb.connection_id.as_deref(), Some("c9"));

        assert_eq!(OAuthCallback::parse("/connect?code=abc123&state=xyz"), None);

        let cb = OAuthCallback::parse("status=error&code=expired_token").unwrap();
        assert!(matches!(cb.outcome, CallbackOutcome::Failure(ref e) if e.code == "expired_token"));
    }

    #[test]
    fn unrelated_input_is_not_a_callback() {
        assert_eq!(OAuthCallback::parse("hello"), None);
        assert_eq!(OAuthCallback::parse("/connect?tab=items"), None);
        assert_eq!(OAuthCallback::parse("status=maybe"), None);
    }
}
