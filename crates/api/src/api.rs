use crate::envelope::{normalize, Envelope};
use crate::error::{redact_secrets, ApiError, ApiResult};
use crate::types::{
    ApiKeyConnectionRequest, Comment, ConnectionSummary, Connector, Container, Item, NewComment,
    NewItem, OAuthInitiation, ValidationResult,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("linkdeck/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Typed access to the connection backend. Every call resolves to an
/// [`Envelope`]; transport failures come back as synthetic failures instead
/// of errors.
#[derive(Clone)]
pub struct ResourceClient {
    http: Client,
    base_url: Url,
}

impl ResourceClient {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Self::with_options(base_url, ClientOptions::default())
    }

    pub fn with_options(base_url: &str, options: ClientOptions) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Validation(format!(
                "{base_url} cannot be used as a backend base URL"
            )));
        }

        // The cookie jar carries backend-issued session cookies across calls.
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .connect_timeout(options.connect_timeout)
            .timeout(options.timeout)
            .build()?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn endpoint_with_query(&self, segments: &[&str], query: &[(&str, Option<&str>)]) -> Url {
        let mut url = self.endpoint(segments);
        let present: Vec<_> = query
            .iter()
            .filter_map(|&(k, v)| v.filter(|v| !v.is_empty()).map(|v| (k, v)))
            .collect();
        if !present.is_empty() {
            url.query_pairs_mut().extend_pairs(present);
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Envelope<Value>> {
        let request = request.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, %path, "Sending backend request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?;

        let envelope = normalize(status.as_u16(), &body);
        if let Envelope::Err(ref error) = envelope {
            warn!(
                %method,
                %path,
                status = status.as_u16(),
                code = %error.code,
                "Backend request failed: {}",
                redact_secrets(&error.message)
            );
        }
        Ok(envelope)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Envelope<T> {
        match self.send(request).await {
            Ok(envelope) => envelope.decode(),
            Err(e) => {
                warn!("Backend request did not complete: {}", redact_secrets(&e.to_string()));
                Envelope::Err(e.into())
            }
        }
    }

    /// Validation endpoints may answer `{ok: true}` or an empty 2xx with no
    /// result at all; that is a pass.
    async fn execute_validation(&self, request: RequestBuilder) -> Envelope<ValidationResult> {
        self.execute::<Option<ValidationResult>>(request)
            .await
            .map(Option::unwrap_or_default)
    }

    pub async fn list_connectors(&self) -> Envelope<Vec<Connector>> {
        self.execute(self.http.get(self.endpoint(&["connectors"])))
            .await
    }

    pub async fn initiate_oauth(&self, connector_id: &str) -> Envelope<OAuthInitiation> {
        self.execute(
            self.http
                .post(self.endpoint(&["connections", "oauth", "initiate"]))
                .json(&json!({ "connectorId": connector_id })),
        )
        .await
    }

    pub async fn create_api_key_connection(
        &self,
        request: &ApiKeyConnectionRequest,
    ) -> Envelope<ConnectionSummary> {
        self.execute(
            self.http
                .post(self.endpoint(&["connections", "api-key"]))
                .json(request),
        )
        .await
    }

    pub async fn validate_connector(&self, connector_id: &str) -> Envelope<ValidationResult> {
        let url = self.endpoint_with_query(
            &["connections", "validate"],
            &[("connectorId", Some(connector_id))],
        );
        self.execute_validation(self.http.get(url)).await
    }

    pub async fn validate_connection(&self, connection_id: &str) -> Envelope<ValidationResult> {
        self.execute_validation(
            self.http
                .post(self.endpoint(&["connections", connection_id, "validate"])),
        )
        .await
    }

    pub async fn revoke_connection(&self, connection_id: &str) -> Envelope<Value> {
        self.execute(
            self.http
                .post(self.endpoint(&["connections", connection_id, "revoke"])),
        )
        .await
    }

    pub async fn list_connections(&self) -> Envelope<Vec<ConnectionSummary>> {
        self.execute(self.http.get(self.endpoint(&["connections"])))
            .await
    }

    /// Raw JSON for a single connection, as shown by the explorer's raw tab.
    pub async fn get_connection(&self, connection_id: &str) -> Envelope<Value> {
        self.execute(self.http.get(self.endpoint(&["connections", connection_id])))
            .await
    }

    pub async fn list_containers(&self, connection_id: &str) -> Envelope<Vec<Container>> {
        self.execute(
            self.http
                .get(self.endpoint(&["connections", connection_id, "containers"])),
        )
        .await
    }

    pub async fn list_items(
        &self,
        connection_id: &str,
        container_id: Option<&str>,
        query: Option<&str>,
    ) -> Envelope<Vec<Item>> {
        let url = self.endpoint_with_query(
            &["connections", connection_id, "items"],
            &[("containerId", container_id), ("q", query)],
        );
        self.execute(self.http.get(url)).await
    }

    pub async fn create_item(&self, connection_id: &str, item: &NewItem) -> Envelope<Item> {
        self.execute(
            self.http
                .post(self.endpoint(&["connections", connection_id, "items"]))
                .json(item),
        )
        .await
    }

    pub async fn get_item(&self, connection_id: &str, item_id: &str) -> Envelope<Item> {
        self.execute(
            self.http
                .get(self.endpoint(&["connections", connection_id, "items", item_id])),
        )
        .await
    }

    pub async fn list_comments(&self, connection_id: &str, item_id: &str) -> Envelope<Vec<Comment>> {
        self.execute(self.http.get(self.endpoint(&[
            "connections",
            connection_id,
            "items",
            item_id,
            "comments",
        ])))
        .await
    }

    pub async fn add_comment(
        &self,
        connection_id: &str,
        item_id: &str,
        comment: &NewComment,
    ) -> Envelope<Comment> {
        self.execute(
            self.http
                .post(self.endpoint(&[
                    "connections",
                    connection_id,
                    "items",
                    item_id,
                    "comments",
                ]))
                .json(comment),
        )
        .await
    }
}
