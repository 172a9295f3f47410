use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthMethod {
    #[serde(rename = "oauth")]
    OAuth,
    #[serde(rename = "api_key")]
    ApiKey,
    /// A method this client has no flow for. Kept so one odd entry does not
    /// fail the whole connector list.
    #[serde(other)]
    Unknown,
}

impl AuthMethod {
    pub fn label(&self) -> &'static str {
        match self {
            AuthMethod::OAuth => "OAuth",
            AuthMethod::ApiKey => "API key",
            AuthMethod::Unknown => "unsupported",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub auth_methods: Vec<AuthMethod>,
}

impl Connector {
    /// The key connections refer to this connector by.
    pub fn join_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.id)
    }

    pub fn supports(&self, method: AuthMethod) -> bool {
        method != AuthMethod::Unknown && self.auth_methods.contains(&method)
    }

    /// Methods the wizard can actually run, in the order the backend listed them.
    pub fn usable_auth_methods(&self) -> impl Iterator<Item = AuthMethod> + '_ {
        self.auth_methods
            .iter()
            .copied()
            .filter(|&m| m != AuthMethod::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Invalid,
    Revoked,
    Pending,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Invalid => "invalid",
            ConnectionStatus::Revoked => "revoked",
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    pub id: String,
    pub connector_key: String,
    pub status: ConnectionStatus,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_validated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub container_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub author: Option<String>,
    pub body: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    #[serde(default = "default_valid")]
    pub valid: bool,
    #[serde(default)]
    pub status: Option<ConnectionStatus>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub connection_id: Option<String>,
}

fn default_valid() -> bool {
    true
}

/// A success without a body means the backend had nothing to object to.
impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            status: None,
            message: None,
            connection_id: None,
        }
    }
}

/// Accepts RFC 3339 strings and epoch milliseconds. Anything else becomes
/// `None` so one odd row cannot fail a whole list.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthInitiation {
    pub auth_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyConnectionRequest {
    pub connector_id: String,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn connector_parses_auth_methods_and_join_key() {
        let connector: Connector = serde_json::from_value(json!({
            "id": "c-jira",
            "key": "jira",
            "name": "Jira",
            "authMethods": ["oauth", "api_key"]
        }))
        .unwrap();
        assert_eq!(connector.join_key(), "jira");
        assert!(connector.supports(AuthMethod::ApiKey));

        let bare: Connector =
            serde_json::from_value(json!({ "id": "confluence", "name": "Confluence" })).unwrap();
        assert_eq!(bare.join_key(), "confluence");
        assert!(!bare.supports(AuthMethod::OAuth));
    }

    #[test]
    fn unknown_connection_status_does_not_fail_the_row() {
        let summary: ConnectionSummary = serde_json::from_value(json!({
            "id": "c1",
            "connectorKey": "jira",
            "status": "suspended",
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(summary.status, ConnectionStatus::Unknown);
        assert!(summary.created_at.is_some());
    }

    #[test]
    fn api_key_request_omits_empty_base_url() {
        let body = serde_json::to_value(ApiKeyConnectionRequest {
            connector_id: "jira".into(),
            api_key: "k".into(),
            api_base_url: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "connectorId": "jira", "apiKey": "k" }));
    }

    #[test]
    fn unknown_auth_method_does_not_fail_the_connector_list() {
        let connectors: Vec<Connector> = serde_json::from_value(json!([
            { "id": "jira", "name": "Jira", "authMethods": ["oauth", "basic"] },
            { "id": "linear", "name": "Linear", "authMethods": ["api_key"] }
        ]))
        .unwrap();
        assert_eq!(connectors[0].auth_methods, vec![AuthMethod::OAuth, AuthMethod::Unknown]);
        assert_eq!(connectors[0].usable_auth_methods().collect::<Vec<_>>(), vec![AuthMethod::OAuth]);
        assert!(!connectors[0].supports(AuthMethod::Unknown));
    }

    #[test]
    fn timestamps_accept_epoch_millis_and_ignore_garbage() {
        let rows: Vec<ConnectionSummary> = serde_json::from_value(json!([
            { "id": "c1", "connectorKey": "jira", "status": "connected", "createdAt": 1714557600000i64 },
            { "id": "c2", "connectorKey": "jira", "status": "connected", "createdAt": "yesterday",
              "updatedAt": null, "lastValidatedAt": true }
        ]))
        .unwrap();
        assert_eq!(
            rows[0].created_at.map(|t| t.to_rfc3339()),
            Some("2024-05-01T10:00:00+00:00".to_string())
        );
        assert_eq!(rows[1].created_at, None);
        assert_eq!(rows[1].updated_at, None);
        assert_eq!(rows[1].last_validated_at, None);
    }

    #[test]
    fn empty_validation_result_counts_as_valid() {
        let result = ValidationResult::default();
        assert!(result.valid);
        let parsed: ValidationResult = serde_json::from_value(json!({})).unwrap();
        assert_eq!(parsed, result);
    }
}
