//! Onboarding wizard: select connector, pick an auth method, authenticate,
//! validate, done.
//!
//! The session is a plain state record. User actions and backend results
//! are methods that mutate it and may hand back a [`WizardEffect`] for the
//! app shell to run; the effect's result comes back as a [`WizardEvent`].
//! Errors never advance the step, they are attached to the session.

mod api_key_setup;
mod oauth_flow;

pub use api_key_setup::{ApiKeyForm, Field};
pub use oauth_flow::{CallbackOutcome, OAuthCallback, OAuthFlowState, OAuthStatus, INVALID_CALLBACK};

use linkdeck_api::{
    ApiKeyConnectionRequest, AuthMethod, ConnectionSummary, Connector, Envelope, EnvelopeError,
    OAuthInitiation, ResourceClient, ValidationResult,
};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const MISSING_CONNECTOR: &str = "MISSING_CONNECTOR";
pub const MISSING_AUTH_METHOD: &str = "MISSING_AUTH_METHOD";
pub const UNSUPPORTED_AUTH_METHOD: &str = "UNSUPPORTED_AUTH_METHOD";
pub const MISSING_API_KEY: &str = "MISSING_API_KEY";
pub const INVALID_API_BASE_URL: &str = "INVALID_API_BASE_URL";
pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";

pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    SelectConnector,
    SelectAuth,
    Auth,
    Validate,
    Done,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::SelectConnector,
        WizardStep::SelectAuth,
        WizardStep::Auth,
        WizardStep::Validate,
        WizardStep::Done,
    ];

    pub fn previous(self) -> Option<WizardStep> {
        match self {
            WizardStep::SelectConnector => None,
            WizardStep::SelectAuth => Some(WizardStep::SelectConnector),
            WizardStep::Auth => Some(WizardStep::SelectAuth),
            WizardStep::Validate => Some(WizardStep::Auth),
            WizardStep::Done => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::SelectConnector => "Select connector",
            WizardStep::SelectAuth => "Select auth method",
            WizardStep::Auth => "Authenticate",
            WizardStep::Validate => "Validate",
            WizardStep::Done => "Done",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardEffect {
    LoadConnectors,
    InitiateOAuth { connector_id: String },
    CreateApiKeyConnection(ApiKeyConnectionRequest),
    ValidateConnector { connector_id: String },
    ValidateConnection { connection_id: String },
    NavigateToDashboard { after: Duration },
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    ConnectorsLoaded(Envelope<Vec<Connector>>),
    OAuthInitiated(Envelope<OAuthInitiation>),
    ApiKeyConnectionCreated(Envelope<ConnectionSummary>),
    Validated(Envelope<ValidationResult>),
    RedirectElapsed,
}

impl WizardEvent {
    pub fn reached_backend(&self) -> bool {
        match self {
            WizardEvent::ConnectorsLoaded(envelope) => envelope.reached_backend(),
            WizardEvent::OAuthInitiated(envelope) => envelope.reached_backend(),
            WizardEvent::ApiKeyConnectionCreated(envelope) => envelope.reached_backend(),
            WizardEvent::Validated(envelope) => envelope.reached_backend(),
            WizardEvent::RedirectElapsed => false,
        }
    }
}

impl WizardEffect {
    pub async fn run(self, client: &ResourceClient) -> WizardEvent {
        match self {
            WizardEffect::LoadConnectors => {
                WizardEvent::ConnectorsLoaded(client.list_connectors().await)
            }
            WizardEffect::InitiateOAuth { connector_id } => {
                WizardEvent::OAuthInitiated(client.initiate_oauth(&connector_id).await)
            }
            WizardEffect::CreateApiKeyConnection(request) => {
                WizardEvent::ApiKeyConnectionCreated(client.create_api_key_connection(&request).await)
            }
            WizardEffect::ValidateConnector { connector_id } => {
                WizardEvent::Validated(client.validate_connector(&connector_id).await)
            }
            WizardEffect::ValidateConnection { connection_id } => {
                WizardEvent::Validated(client.validate_connection(&connection_id).await)
            }
            WizardEffect::NavigateToDashboard { after } => {
                tokio::time::sleep(after).await;
                WizardEvent::RedirectElapsed
            }
        }
    }
}

pub struct WizardSession {
    pub step: WizardStep,
    pub connectors: Vec<Connector>,
    pub connectors_loading: bool,
    pub cursor: usize,
    pub selected_connector_id: Option<String>,
    pub auth_method: Option<AuthMethod>,
    pub api_key_form: ApiKeyForm,
    pub oauth: OAuthFlowState,
    pub connection_id: Option<String>,
    pub error: Option<EnvelopeError>,
    pub info_message: Option<String>,
    pub busy: bool,
    redirect_delay: Duration,
    redirect_scheduled: bool,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new(DEFAULT_REDIRECT_DELAY)
    }
}

impl WizardSession {
    pub fn new(redirect_delay: Duration) -> Self {
        Self {
            step: WizardStep::SelectConnector,
            connectors: Vec::new(),
            connectors_loading: false,
            cursor: 0,
            selected_connector_id: None,
            auth_method: None,
            api_key_form: ApiKeyForm::default(),
            oauth: OAuthFlowState::default(),
            connection_id: None,
            error: None,
            info_message: None,
            busy: false,
            redirect_delay,
            redirect_scheduled: false,
        }
    }

    pub fn redirect_scheduled(&self) -> bool {
        self.redirect_scheduled
    }

    pub fn selected_connector(&self) -> Option<&Connector> {
        let id = self.selected_connector_id.as_deref()?;
        self.connectors.iter().find(|c| c.id == id)
    }

    /// Auth methods offered by the selected connector, in backend order.
    pub fn available_methods(&self) -> Vec<AuthMethod> {
        self.selected_connector()
            .map(|c| c.usable_auth_methods().collect())
            .unwrap_or_default()
    }

    fn fail(&mut self, code: &str, message: impl Into<String>) {
        self.error = Some(EnvelopeError::new(code, message));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn load_connectors(&mut self) -> Option<WizardEffect> {
        if self.connectors_loading {
            return None;
        }
        self.connectors_loading = true;
        Some(WizardEffect::LoadConnectors)
    }

    /// Changing to a different connector discards everything chosen or typed
    /// for the previous one.
    pub fn select_connector(&mut self, connector_id: &str) {
        if self.selected_connector_id.as_deref() == Some(connector_id) {
            return;
        }
        self.selected_connector_id = Some(connector_id.to_string());
        self.auth_method = None;
        self.api_key_form.clear();
        self.oauth.reset();
        self.connection_id = None;
        self.info_message = None;
        self.error = None;
    }

    pub fn select_auth_method(&mut self, method: AuthMethod) {
        let Some(connector_id) = self.selected_connector_id.clone() else {
            self.fail(MISSING_CONNECTOR, "Select a connector first");
            return;
        };
        if let Some(connector) = self.selected_connector() {
            if !connector.supports(method) {
                let message = format!("{} does not support {}", connector.name, method.label());
                self.fail(UNSUPPORTED_AUTH_METHOD, message);
                return;
            }
        }
        if self.auth_method != Some(method) {
            self.oauth.reset();
        }
        debug!(%connector_id, ?method, "Auth method selected");
        self.auth_method = Some(method);
        self.error = None;
    }

    /// Forward transition for the two selection steps. The later steps only
    /// advance through their own actions.
    pub fn next(&mut self) {
        match self.step {
            WizardStep::SelectConnector => {
                if self.selected_connector_id.is_none() {
                    self.fail(MISSING_CONNECTOR, "Select a connector to continue");
                    return;
                }
                self.step = WizardStep::SelectAuth;
                self.cursor = 0;
                self.error = None;
            }
            WizardStep::SelectAuth => {
                if self.auth_method.is_none() {
                    self.fail(MISSING_AUTH_METHOD, "Select an authentication method to continue");
                    return;
                }
                self.step = WizardStep::Auth;
                self.error = None;
            }
            WizardStep::Auth | WizardStep::Validate | WizardStep::Done => {}
        }
    }

    pub fn back(&mut self) {
        if self.busy {
            return;
        }
        if let Some(previous) = self.step.previous() {
            self.step = previous;
            self.cursor = 0;
            self.error = None;
            self.info_message = None;
        }
    }

    pub fn begin_oauth(&mut self) -> Option<WizardEffect> {
        if self.busy || self.step != WizardStep::Auth {
            return None;
        }
        let connector_id = self.selected_connector_id.clone()?;
        self.busy = true;
        self.error = None;
        self.oauth.status = OAuthStatus::Initiating;
        Some(WizardEffect::InitiateOAuth { connector_id })
    }

    /// Applies the parameters of the OAuth redirect back to the client.
    pub fn apply_callback(&mut self, callback: OAuthCallback) {
        if self.step == WizardStep::Done {
            return;
        }
        if let Some(ref connector_id) = callback.connector_id {
            self.select_connector(connector_id);
            self.auth_method = Some(AuthMethod::OAuth);
        }
        if callback.connection_id.is_some() {
            self.connection_id = callback.connection_id;
        }
        self.oauth.callback_input.clear();

        match callback.outcome {
            CallbackOutcome::Success => {
                if self.selected_connector_id.is_none() && self.connection_id.is_none() {
                    self.fail(MISSING_CONNECTOR, "The callback did not say which connector it was for");
                    return;
                }
                info!("OAuth callback reported success");
                self.oauth.status = OAuthStatus::Completed;
                self.step = WizardStep::Validate;
                self.error = None;
                self.info_message =
                    Some("Authorization complete. Validate the connection to finish.".to_string());
            }
            CallbackOutcome::Failure(error) => {
                info!(code = %error.code, "OAuth callback reported failure");
                self.oauth.status = OAuthStatus::Failed;
                if self.selected_connector_id.is_some() {
                    self.auth_method = Some(AuthMethod::OAuth);
                    self.step = WizardStep::Auth;
                }
                self.info_message = None;
                self.error = Some(error);
            }
        }
    }

    /// Parses whatever was typed into the callback field.
    pub fn submit_callback_input(&mut self) {
        match OAuthCallback::parse(&self.oauth.callback_input) {
            Some(callback) => self.apply_callback(callback),
            None => self.fail(
                INVALID_CALLBACK,
                "Paste the full address the browser was redirected to",
            ),
        }
    }

    pub fn submit_api_key(&mut self) -> Option<WizardEffect> {
        if self.busy || self.step != WizardStep::Auth {
            return None;
        }
        let Some(connector_id) = self.selected_connector_id.clone() else {
            self.fail(MISSING_CONNECTOR, "Select a connector first");
            return None;
        };
        let api_key = self.api_key_form.api_key.trim().to_string();
        if api_key.is_empty() {
            self.fail(MISSING_API_KEY, "Enter an API key");
            return None;
        }
        let api_base_url = self.api_key_form.base_url().map(str::to_string);
        if let Some(ref base) = api_base_url {
            if Url::parse(base).is_err() {
                self.fail(INVALID_API_BASE_URL, format!("{base} is not a valid URL"));
                return None;
            }
        }

        self.busy = true;
        self.error = None;
        Some(WizardEffect::CreateApiKeyConnection(ApiKeyConnectionRequest {
            connector_id,
            api_key,
            api_base_url,
        }))
    }

    pub fn validate(&mut self) -> Option<WizardEffect> {
        if self.busy || self.step != WizardStep::Validate {
            return None;
        }
        let effect = if let Some(connection_id) = self.connection_id.clone() {
            WizardEffect::ValidateConnection { connection_id }
        } else if let Some(connector_id) = self.selected_connector_id.clone() {
            WizardEffect::ValidateConnector { connector_id }
        } else {
            self.fail(MISSING_CONNECTOR, "Nothing to validate yet");
            return None;
        };
        self.busy = true;
        self.error = None;
        Some(effect)
    }

    /// The primary action for the current step (Enter).
    pub fn confirm(&mut self) -> Option<WizardEffect> {
        match self.step {
            WizardStep::SelectConnector => {
                if let Some(id) = self.connectors.get(self.cursor).map(|c| c.id.clone()) {
                    self.select_connector(&id);
                }
                self.next();
                None
            }
            WizardStep::SelectAuth => {
                if let Some(method) = self.available_methods().get(self.cursor).copied() {
                    self.select_auth_method(method);
                }
                self.next();
                None
            }
            WizardStep::Auth => match self.auth_method {
                Some(AuthMethod::ApiKey) => self.submit_api_key(),
                Some(AuthMethod::OAuth) if self.oauth.auth_url.is_none() => self.begin_oauth(),
                Some(AuthMethod::OAuth) => {
                    if !self.busy {
                        self.submit_callback_input();
                    }
                    None
                }
                Some(AuthMethod::Unknown) | None => {
                    self.fail(MISSING_AUTH_METHOD, "Select an authentication method first");
                    None
                }
            },
            WizardStep::Validate => self.validate(),
            WizardStep::Done => None,
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = match self.step {
            WizardStep::SelectConnector => self.connectors.len(),
            WizardStep::SelectAuth => self.available_methods().len(),
            _ => 0,
        };
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
    }

    pub fn handle(&mut self, event: WizardEvent) -> Option<WizardEffect> {
        match event {
            WizardEvent::ConnectorsLoaded(envelope) => {
                self.connectors_loading = false;
                match envelope {
                    Envelope::Ok(connectors) => {
                        let selected = self.selected_connector_id.as_deref().and_then(|id| {
                            connectors.iter().position(|c| c.id == id)
                        });
                        self.connectors = connectors;
                        if let (Some(idx), WizardStep::SelectConnector) = (selected, self.step) {
                            self.cursor = idx;
                        }
                    }
                    Envelope::Err(error) => self.error = Some(error),
                }
                None
            }
            WizardEvent::OAuthInitiated(envelope) => {
                self.busy = false;
                if self.step != WizardStep::Auth {
                    debug!("Dropping OAuth initiation result outside the auth step");
                    return None;
                }
                match envelope {
                    Envelope::Ok(initiation) => {
                        self.oauth.auth_url = Some(initiation.auth_url);
                        self.oauth.status = OAuthStatus::WaitingForCallback;
                        self.info_message = Some(
                            "Open the link, authorize, then paste the address you are sent back to."
                                .to_string(),
                        );
                    }
                    Envelope::Err(error) => {
                        self.oauth.status = OAuthStatus::Failed;
                        self.error = Some(error);
                    }
                }
                None
            }
            WizardEvent::ApiKeyConnectionCreated(envelope) => {
                self.busy = false;
                if self.step != WizardStep::Auth {
                    debug!("Dropping API key result outside the auth step");
                    return None;
                }
                match envelope {
                    Envelope::Ok(connection) => {
                        info!(connection_id = %connection.id, "API key connection created");
                        self.connection_id = Some(connection.id);
                        self.step = WizardStep::Validate;
                        self.info_message =
                            Some("API key accepted. Validate the connection to finish.".to_string());
                    }
                    Envelope::Err(error) => self.error = Some(error),
                }
                None
            }
            WizardEvent::Validated(envelope) => {
                self.busy = false;
                if self.step != WizardStep::Validate {
                    debug!("Dropping validation result outside the validate step");
                    return None;
                }
                match envelope {
                    Envelope::Ok(result) if result.valid => {
                        if let Some(id) = result.connection_id {
                            self.connection_id = Some(id);
                        }
                        self.step = WizardStep::Done;
                        self.error = None;
                        self.info_message = Some(
                            result
                                .message
                                .unwrap_or_else(|| "Connection validated.".to_string()),
                        );
                        if self.redirect_scheduled {
                            return None;
                        }
                        self.redirect_scheduled = true;
                        Some(WizardEffect::NavigateToDashboard {
                            after: self.redirect_delay,
                        })
                    }
                    Envelope::Ok(result) => {
                        self.fail(
                            VALIDATION_FAILED,
                            result
                                .message
                                .unwrap_or_else(|| "The connection could not be validated".to_string()),
                        );
                        None
                    }
                    Envelope::Err(error) => {
                        self.error = Some(error);
                        None
                    }
                }
            }
            WizardEvent::RedirectElapsed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkdeck_api::ConnectionStatus;

    fn connector(id: &str, methods: &[AuthMethod]) -> Connector {
        Connector {
            id: id.to_string(),
            key: None,
            name: id.to_uppercase(),
            description: None,
            auth_methods: methods.to_vec(),
        }
    }

    fn loaded_session() -> WizardSession {
        let mut session = WizardSession::default();
        assert_eq!(session.load_connectors(), Some(WizardEffect::LoadConnectors));
        session.handle(WizardEvent::ConnectorsLoaded(Envelope::Ok(vec![
            connector("jira", &[AuthMethod::OAuth, AuthMethod::ApiKey]),
            connector("linear", &[AuthMethod::ApiKey]),
        ])));
        session
    }

    fn at_auth(method: AuthMethod) -> WizardSession {
        let mut session = loaded_session();
        session.select_connector("jira");
        session.next();
        session.select_auth_method(method);
        session.next();
        assert_eq!(session.step, WizardStep::Auth);
        session
    }

    fn at_validate() -> WizardSession {
        let mut session = at_auth(AuthMethod::ApiKey);
        session.api_key_form.api_key = "secret".into();
        assert!(session.submit_api_key().is_some());
        session.handle(WizardEvent::ApiKeyConnectionCreated(Envelope::Ok(ConnectionSummary {
            id: "c1".into(),
            connector_key: "jira".into(),
            status: ConnectionStatus::Pending,
            display_name: None,
            created_at: None,
            updated_at: None,
            last_validated_at: None,
        })));
        assert_eq!(session.step, WizardStep::Validate);
        session
    }

    fn valid() -> ValidationResult {
        ValidationResult {
            valid: true,
            status: Some(ConnectionStatus::Connected),
            message: None,
            connection_id: None,
        }
    }

    #[test]
    fn next_is_guarded_on_selection() {
        let mut session = loaded_session();
        session.next();
        assert_eq!(session.step, WizardStep::SelectConnector);
        assert_eq!(session.error.as_ref().unwrap().code, MISSING_CONNECTOR);

        session.select_connector("jira");
        session.next();
        assert_eq!(session.step, WizardStep::SelectAuth);
        assert!(session.error.is_none());

        session.next();
        assert_eq!(session.step, WizardStep::SelectAuth);
        assert_eq!(session.error.as_ref().unwrap().code, MISSING_AUTH_METHOD);
    }

    #[test]
    fn changing_connector_resets_auth_method_and_credentials() {
        let mut session = at_auth(AuthMethod::ApiKey);
        session.api_key_form.api_key = "typed".into();

        session.select_connector("jira");
        assert_eq!(session.auth_method, Some(AuthMethod::ApiKey));
        assert_eq!(session.api_key_form.api_key, "typed");

        session.select_connector("linear");
        assert_eq!(session.auth_method, None);
        assert!(session.api_key_form.api_key.is_empty());

        session.select_connector("linear");
        assert_eq!(session.auth_method, None);
    }

    #[test]
    fn unsupported_method_is_rejected() {
        let mut session = loaded_session();
        session.select_connector("linear");
        session.select_auth_method(AuthMethod::OAuth);
        assert_eq!(session.auth_method, None);
        assert_eq!(session.error.as_ref().unwrap().code, UNSUPPORTED_AUTH_METHOD);
    }

    #[test]
    fn empty_api_key_never_issues_a_request() {
        let mut session = at_auth(AuthMethod::ApiKey);
        session.api_key_form.api_key = "   ".into();

        assert_eq!(session.submit_api_key(), None);
        assert_eq!(session.confirm(), None);
        assert!(!session.busy);
        assert_eq!(session.step, WizardStep::Auth);
        assert_eq!(session.error.as_ref().unwrap().code, MISSING_API_KEY);
    }

    #[test]
    fn invalid_base_url_is_caught_before_submit() {
        let mut session = at_auth(AuthMethod::ApiKey);
        session.api_key_form.api_key = "secret".into();
        session.api_key_form.api_base_url = "not a url".into();
        assert_eq!(session.submit_api_key(), None);
        assert_eq!(session.error.as_ref().unwrap().code, INVALID_API_BASE_URL);
    }

    #[test]
    fn busy_flag_blocks_duplicate_submissions() {
        let mut session = at_auth(AuthMethod::ApiKey);
        session.api_key_form.api_key = "secret".into();
        session.api_key_form.api_base_url = "https://jira.example.test".into();

        let effect = session.submit_api_key();
        assert_eq!(
            effect,
            Some(WizardEffect::CreateApiKeyConnection(ApiKeyConnectionRequest {
                connector_id: "jira".into(),
                api_key: "secret".into(),
                api_base_url: Some("https://jira.example.test".into()),
            }))
        );
        assert!(session.busy);
        assert_eq!(session.submit_api_key(), None);

        session.back();
        assert_eq!(session.step, WizardStep::Auth);
    }

    #[test]
    fn backend_failure_attaches_envelope_and_stays() {
        let mut session = at_auth(AuthMethod::ApiKey);
        session.api_key_form.api_key = "secret".into();
        session.submit_api_key();
        session.handle(WizardEvent::ApiKeyConnectionCreated(Envelope::failure(
            "INVALID_API_KEY",
            "key rejected",
        )));
        assert_eq!(session.step, WizardStep::Auth);
        assert!(!session.busy);
        assert_eq!(session.error.as_ref().unwrap().code, "INVALID_API_KEY");
    }

    #[test]
    fn validate_uses_created_connection_id() {
        let mut session = at_validate();
        assert_eq!(
            session.validate(),
            Some(WizardEffect::ValidateConnection {
                connection_id: "c1".into()
            })
        );
    }

    #[test]
    fn successful_validation_schedules_exactly_one_navigation() {
        let mut session = at_validate();
        session.validate();
        let effect = session.handle(WizardEvent::Validated(Envelope::Ok(valid())));
        assert_eq!(
            effect,
            Some(WizardEffect::NavigateToDashboard {
                after: DEFAULT_REDIRECT_DELAY
            })
        );
        assert_eq!(session.step, WizardStep::Done);
        assert!(session.redirect_scheduled());

        // A late duplicate result must not schedule another navigation.
        assert_eq!(session.handle(WizardEvent::Validated(Envelope::Ok(valid()))), None);
        assert_eq!(session.validate(), None);
    }

    #[test]
    fn invalid_result_stays_on_validate_until_back() {
        let mut session = at_validate();
        session.validate();
        let effect = session.handle(WizardEvent::Validated(Envelope::Ok(ValidationResult {
            valid: false,
            status: Some(ConnectionStatus::Invalid),
            message: Some("token expired".into()),
            connection_id: None,
        })));
        assert_eq!(effect, None);
        assert_eq!(session.step, WizardStep::Validate);
        assert_eq!(session.error.as_ref().unwrap().code, VALIDATION_FAILED);

        session.back();
        assert_eq!(session.step, WizardStep::Auth);
    }

    #[test]
    fn back_moves_one_step_and_never_leaves_done() {
        let mut session = at_auth(AuthMethod::OAuth);
        session.back();
        assert_eq!(session.step, WizardStep::SelectAuth);
        session.back();
        assert_eq!(session.step, WizardStep::SelectConnector);
        session.back();
        assert_eq!(session.step, WizardStep::SelectConnector);

        let mut done = at_validate();
        done.validate();
        done.handle(WizardEvent::Validated(Envelope::Ok(valid())));
        done.back();
        assert_eq!(done.step, WizardStep::Done);
    }

    #[test]
    fn oauth_success_callback_jumps_to_validate() {
        let mut session = at_auth(AuthMethod::OAuth);
        assert_eq!(
            session.confirm(),
            Some(WizardEffect::InitiateOAuth {
                connector_id: "jira".into()
            })
        );
        session.handle(WizardEvent::OAuthInitiated(Envelope::Ok(OAuthInitiation {
            auth_url: "https://auth.example.test/authorize".into(),
        })));
        assert_eq!(session.oauth.status, OAuthStatus::WaitingForCallback);

        session.oauth.callback_input = "https://app.example.test/connect?status=success&connectorId=jira".into();
        assert_eq!(session.confirm(), None);
        assert_eq!(session.step, WizardStep::Validate);
        assert_eq!(
            session.validate(),
            Some(WizardEffect::ValidateConnector {
                connector_id: "jira".into()
            })
        );
    }

    #[test]
    fn oauth_failure_callback_returns_to_auth_with_error() {
        let mut session = loaded_session();
        session.apply_callback(
            OAuthCallback::parse("/connect?status=error&connectorId=jira&error=access_denied").unwrap(),
        );
        assert_eq!(session.step, WizardStep::Auth);
        assert_eq!(session.auth_method, Some(AuthMethod::OAuth));
        assert_eq!(session.error.as_ref().unwrap().code, "access_denied");
    }

    #[test]
    fn garbage_callback_input_is_reported() {
        let mut session = at_auth(AuthMethod::OAuth);
        session.oauth.auth_url = Some("https://auth.example.test".into());
        session.oauth.callback_input = "nothing useful".into();
        session.confirm();
        assert_eq!(session.step, WizardStep::Auth);
        assert_eq!(session.error.as_ref().unwrap().code, INVALID_CALLBACK);
    }

    #[test]
    fn connector_load_failure_is_attached() {
        let mut session = WizardSession::default();
        session.load_connectors();
        assert_eq!(session.load_connectors(), None);
        session.handle(WizardEvent::ConnectorsLoaded(Envelope::failure("NETWORK_ERROR", "offline")));
        assert!(!session.connectors_loading);
        assert_eq!(session.error.as_ref().unwrap().code, "NETWORK_ERROR");
        assert_eq!(session.load_connectors(), Some(WizardEffect::LoadConnectors));
    }

    #[test]
    fn unrecognised_auth_methods_are_not_offered() {
        let mut session = WizardSession::default();
        session.load_connectors();
        session.handle(WizardEvent::ConnectorsLoaded(Envelope::Ok(vec![connector(
            "jira",
            &[AuthMethod::Unknown, AuthMethod::OAuth],
        )])));
        session.select_connector("jira");
        session.next();
        assert_eq!(session.available_methods(), vec![AuthMethod::OAuth]);

        session.select_auth_method(AuthMethod::Unknown);
        assert_eq!(session.error.as_ref().unwrap().code, UNSUPPORTED_AUTH_METHOD);
        assert_eq!(session.auth_method, None);
    }

    #[tokio::test]
    async fn validation_answered_without_a_body_reaches_done() {
        use axum::http::StatusCode;
        use axum::routing::{get, post};
        use axum::{Json, Router};

        let app = Router::new()
            .route(
                "/connections/c1/validate",
                post(|| async { StatusCode::NO_CONTENT }),
            )
            .route(
                "/connections/validate",
                get(|| async { Json(serde_json::json!({ "ok": true })) }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        let client = ResourceClient::new(&format!("http://{addr}")).unwrap();

        let mut by_connection = at_validate();
        let effect = by_connection.validate().unwrap();
        let next = by_connection.handle(effect.run(&client).await);
        assert_eq!(by_connection.step, WizardStep::Done);
        assert!(matches!(next, Some(WizardEffect::NavigateToDashboard { .. })));

        let mut by_connector = at_validate();
        by_connector.connection_id = None;
        let effect = by_connector.validate().unwrap();
        assert_eq!(
            effect,
            WizardEffect::ValidateConnector {
                connector_id: "jira".into()
            }
        );
        let next = by_connector.handle(effect.run(&client).await);
        assert_eq!(by_connector.step, WizardStep::Done);
        assert!(matches!(next, Some(WizardEffect::NavigateToDashboard { .. })));
    }
}
