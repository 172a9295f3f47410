//! Connection list: fetch, periodic revalidation, validate/revoke actions.

use linkdeck_api::error::NETWORK_ERROR;
use linkdeck_api::{ConnectionSummary, Connector, Envelope, EnvelopeError, ResourceClient};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevalidateReason {
    Mount,
    Focus,
    Reconnect,
    Interval,
    Manual,
    Mutation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    Validate,
    Revoke,
}

impl ConnectionAction {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionAction::Validate => "validate",
            ConnectionAction::Revoke => "revoke",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEffect {
    Fetch {
        generation: u64,
    },
    Run {
        connection_id: String,
        action: ConnectionAction,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    Fetched {
        generation: u64,
        connections: Envelope<Vec<ConnectionSummary>>,
        connectors: Envelope<Vec<Connector>>,
    },
    ActionFinished {
        connection_id: String,
        action: ConnectionAction,
        /// Notice to show on success.
        result: Envelope<String>,
    },
}

impl DashboardEffect {
    pub async fn run(self, client: &ResourceClient) -> DashboardEvent {
        match self {
            DashboardEffect::Fetch { generation } => {
                let (connections, connectors) =
                    tokio::join!(client.list_connections(), client.list_connectors());
                DashboardEvent::Fetched {
                    generation,
                    connections,
                    connectors,
                }
            }
            DashboardEffect::Run {
                connection_id,
                action,
            } => {
                let result = match action {
                    ConnectionAction::Validate => {
                        client.validate_connection(&connection_id).await.map(|r| {
                            match (r.valid, r.message) {
                                (true, _) => format!("{connection_id} is valid"),
                                (false, Some(message)) => {
                                    format!("{connection_id} is not valid: {message}")
                                }
                                (false, None) => format!("{connection_id} is not valid"),
                            }
                        })
                    }
                    ConnectionAction::Revoke => client
                        .revoke_connection(&connection_id)
                        .await
                        .map(|_| format!("{connection_id} revoked")),
                };
                DashboardEvent::ActionFinished {
                    connection_id,
                    action,
                    result,
                }
            }
        }
    }
}

/// A connection joined with the connector it was made from.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionRow<'a> {
    pub connection: &'a ConnectionSummary,
    pub connector: Option<&'a Connector>,
    pub busy: bool,
}

impl ConnectionRow<'_> {
    pub fn title(&self) -> &str {
        self.connection
            .display_name
            .as_deref()
            .or(self.connector.map(|c| c.name.as_str()))
            .unwrap_or(&self.connection.connector_key)
    }

    pub fn connector_name(&self) -> &str {
        self.connector
            .map(|c| c.name.as_str())
            .unwrap_or(&self.connection.connector_key)
    }
}

/// Exactly one of these is shown at a time.
#[derive(Debug)]
pub enum DashboardView<'a> {
    Loading,
    Empty,
    Error(&'a EnvelopeError),
    Ready(Vec<ConnectionRow<'a>>),
}

pub struct DashboardState {
    connections: Option<Vec<ConnectionSummary>>,
    connectors: Vec<Connector>,
    error: Option<EnvelopeError>,
    generation: u64,
    in_flight: bool,
    offline: bool,
    busy_ids: HashSet<String>,
    poll_interval: Duration,
    next_poll_at: Option<Instant>,
    pub cursor: usize,
    pub notice: Option<String>,
    pub action_error: Option<EnvelopeError>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl DashboardState {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            connections: None,
            connectors: Vec::new(),
            error: None,
            generation: 0,
            in_flight: false,
            offline: false,
            busy_ids: HashSet::new(),
            poll_interval,
            next_poll_at: None,
            cursor: 0,
            notice: None,
            action_error: None,
        }
    }

    pub fn view(&self) -> DashboardView<'_> {
        if let Some(ref error) = self.error {
            return DashboardView::Error(error);
        }
        match self.connections {
            None => DashboardView::Loading,
            Some(ref list) if list.is_empty() => DashboardView::Empty,
            Some(_) => DashboardView::Ready(self.rows()),
        }
    }

    pub fn rows(&self) -> Vec<ConnectionRow<'_>> {
        self.connections
            .iter()
            .flatten()
            .map(|connection| ConnectionRow {
                connection,
                connector: self
                    .connectors
                    .iter()
                    .find(|c| c.join_key() == connection.connector_key || c.id == connection.connector_key),
                busy: self.busy_ids.contains(&connection.id),
            })
            .collect()
    }

    pub fn selected_connection_id(&self) -> Option<&str> {
        self.connections
            .as_ref()?
            .get(self.cursor)
            .map(|c| c.id.as_str())
    }

    pub fn is_busy(&self, connection_id: &str) -> bool {
        self.busy_ids.contains(connection_id)
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.connections.as_ref().map_or(0, Vec::len);
        self.cursor = if len == 0 {
            0
        } else {
            self.cursor.saturating_add_signed(delta).min(len - 1)
        };
    }

    pub fn mount(&mut self, now: Instant) -> Option<DashboardEffect> {
        self.next_poll_at = Some(now + self.poll_interval);
        self.revalidate(RevalidateReason::Mount)
    }

    /// Results of anything still in flight are discarded by the shell once the
    /// screen is left, so forget about them here too.
    pub fn unmount(&mut self) {
        self.next_poll_at = None;
        self.in_flight = false;
        self.busy_ids.clear();
    }

    pub fn revalidate(&mut self, reason: RevalidateReason) -> Option<DashboardEffect> {
        if self.in_flight && reason != RevalidateReason::Mutation {
            debug!(?reason, "Revalidation already in flight");
            return None;
        }
        debug!(?reason, "Revalidating connection list");
        self.generation += 1;
        self.in_flight = true;
        Some(DashboardEffect::Fetch {
            generation: self.generation,
        })
    }

    /// Fixed-rate polling: the schedule does not move with request latency.
    pub fn tick(&mut self, now: Instant) -> Option<DashboardEffect> {
        let due = self.next_poll_at?;
        if now < due {
            return None;
        }
        let mut next = due + self.poll_interval;
        if next <= now {
            next = now + self.poll_interval;
        }
        self.next_poll_at = Some(next);
        self.revalidate(RevalidateReason::Interval)
    }

    /// Called when some other request reached the backend.
    pub fn note_reachable(&mut self) -> Option<DashboardEffect> {
        if !self.offline {
            return None;
        }
        self.offline = false;
        self.revalidate(RevalidateReason::Reconnect)
    }

    fn request_action(
        &mut self,
        connection_id: &str,
        action: ConnectionAction,
    ) -> Option<DashboardEffect> {
        if !self.busy_ids.insert(connection_id.to_string()) {
            debug!(%connection_id, "Action already in flight for connection");
            return None;
        }
        self.notice = None;
        self.action_error = None;
        Some(DashboardEffect::Run {
            connection_id: connection_id.to_string(),
            action,
        })
    }

    pub fn validate(&mut self, connection_id: &str) -> Option<DashboardEffect> {
        self.request_action(connection_id, ConnectionAction::Validate)
    }

    pub fn revoke(&mut self, connection_id: &str) -> Option<DashboardEffect> {
        self.request_action(connection_id, ConnectionAction::Revoke)
    }

    pub fn handle(&mut self, event: DashboardEvent) -> Option<DashboardEffect> {
        match event {
            DashboardEvent::Fetched {
                generation,
                connections,
                connectors,
            } => {
                if generation != self.generation {
                    debug!(generation, latest = self.generation, "Dropping superseded fetch");
                    return None;
                }
                self.in_flight = false;
                match connections {
                    Envelope::Ok(list) => {
                        self.connections = Some(list);
                        self.error = None;
                        self.offline = false;
                    }
                    Envelope::Err(error) => {
                        self.offline = error.code == NETWORK_ERROR;
                        self.error = Some(error);
                    }
                }
                match connectors {
                    Envelope::Ok(list) => self.connectors = list,
                    Envelope::Err(error) => {
                        warn!(code = %error.code, "Connector metadata unavailable: {}", error.message)
                    }
                }
                self.move_cursor(0);
                None
            }
            DashboardEvent::ActionFinished {
                connection_id,
                action,
                result,
            } => {
                self.busy_ids.remove(&connection_id);
                match result {
                    Envelope::Ok(notice) => self.notice = Some(notice),
                    Envelope::Err(error) => {
                        warn!(%connection_id, action = action.label(), code = %error.code, "Connection action failed");
                        self.action_error = Some(error);
                    }
                }
                self.revalidate(RevalidateReason::Mutation)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkdeck_api::{AuthMethod, ConnectionStatus};

    fn summary(id: &str, key: &str) -> ConnectionSummary {
        ConnectionSummary {
            id: id.to_string(),
            connector_key: key.to_string(),
            status: ConnectionStatus::Connected,
            display_name: None,
            created_at: None,
            updated_at: None,
            last_validated_at: None,
        }
    }

    fn jira() -> Connector {
        Connector {
            id: "conn-jira".into(),
            key: Some("jira".into()),
            name: "Jira".into(),
            description: None,
            auth_methods: vec![AuthMethod::OAuth],
        }
    }

    fn fetched(state: &mut DashboardState, connections: Envelope<Vec<ConnectionSummary>>) {
        let Some(DashboardEffect::Fetch { generation }) = state.revalidate(RevalidateReason::Manual)
        else {
            panic!("expected fetch");
        };
        state.handle(DashboardEvent::Fetched {
            generation,
            connections,
            connectors: Envelope::Ok(vec![jira()]),
        });
    }

    #[test]
    fn loading_empty_error_and_ready_are_exclusive() {
        let mut state = DashboardState::default();
        assert!(matches!(state.view(), DashboardView::Loading));

        fetched(&mut state, Envelope::Ok(vec![]));
        assert!(matches!(state.view(), DashboardView::Empty));

        fetched(&mut state, Envelope::failure("HTTP_500", "boom"));
        assert!(matches!(state.view(), DashboardView::Error(e) if e.code == "HTTP_500"));

        fetched(&mut state, Envelope::Ok(vec![summary("c1", "jira"), summary("c2", "notion")]));
        match state.view() {
            DashboardView::Ready(rows) => {
                assert_eq!(rows[0].connector_name(), "Jira");
                assert_eq!(rows[1].connector_name(), "notion");
            }
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn revoke_is_single_flight_per_connection_and_revalidates_once() {
        let mut state = DashboardState::default();
        fetched(&mut state, Envelope::Ok(vec![summary("c1", "jira")]));

        let effect = state.revoke("c1");
        assert_eq!(
            effect,
            Some(DashboardEffect::Run {
                connection_id: "c1".into(),
                action: ConnectionAction::Revoke
            })
        );
        assert!(state.is_busy("c1"));
        assert_eq!(state.revoke("c1"), None);
        assert_eq!(state.validate("c1"), None);
        assert!(state.validate("c2").is_some());

        let next = state.handle(DashboardEvent::ActionFinished {
            connection_id: "c1".into(),
            action: ConnectionAction::Revoke,
            result: Envelope::Ok("c1 revoked".into()),
        });
        assert!(matches!(next, Some(DashboardEffect::Fetch { .. })));
        assert!(!state.is_busy("c1"));
        assert_eq!(state.notice.as_deref(), Some("c1 revoked"));
    }

    #[test]
    fn overlapping_revalidations_are_deduplicated_except_after_mutations() {
        let mut state = DashboardState::default();
        let first = state.revalidate(RevalidateReason::Focus);
        assert!(first.is_some());
        assert_eq!(state.revalidate(RevalidateReason::Interval), None);
        let forced = state.revalidate(RevalidateReason::Mutation);
        assert_eq!(forced, Some(DashboardEffect::Fetch { generation: 2 }));

        // The superseded response is ignored.
        state.handle(DashboardEvent::Fetched {
            generation: 1,
            connections: Envelope::Ok(vec![summary("stale", "jira")]),
            connectors: Envelope::Ok(vec![]),
        });
        assert!(matches!(state.view(), DashboardView::Loading));
        assert!(state.is_refreshing());
    }

    #[test]
    fn polling_runs_on_a_fixed_schedule() {
        let start = Instant::now();
        let interval = Duration::from_secs(10);
        let mut state = DashboardState::new(interval);
        let Some(DashboardEffect::Fetch { generation }) = state.mount(start) else {
            panic!("mount fetches");
        };
        state.handle(DashboardEvent::Fetched {
            generation,
            connections: Envelope::Ok(vec![]),
            connectors: Envelope::Ok(vec![]),
        });

        assert_eq!(state.tick(start + Duration::from_secs(9)), None);
        assert!(state.tick(start + Duration::from_secs(10)).is_some());
        // Still in flight at the next tick: deduplicated, schedule keeps moving.
        assert_eq!(state.tick(start + Duration::from_secs(20)), None);
        assert_eq!(state.tick(start + Duration::from_secs(25)), None);

        state.unmount();
        assert_eq!(state.tick(start + Duration::from_secs(60)), None);
    }

    #[test]
    fn reconnect_triggers_revalidation_after_network_failure() {
        let mut state = DashboardState::default();
        assert_eq!(state.note_reachable(), None);

        fetched(&mut state, Envelope::failure(NETWORK_ERROR, "offline"));
        assert!(state.note_reachable().is_some());
        assert_eq!(state.note_reachable(), None);
    }

    #[tokio::test]
    async fn revoking_posts_once_then_refetches_list_once() {
        use axum::extract::State;
        use axum::routing::{get, post};
        use axum::{Json, Router};
        use serde_json::json;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        use tokio::net::TcpListener;

        #[derive(Clone, Default)]
        struct Hits {
            revoke: Arc<AtomicUsize>,
            list: Arc<AtomicUsize>,
        }

        let hits = Hits::default();
        let app = Router::new()
            .route(
                "/connections",
                get(|State(h): State<Hits>| async move {
                    h.list.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "ok": true, "data": [
                        { "id": "c1", "connectorKey": "jira", "status": "revoked" }
                    ] }))
                }),
            )
            .route(
                "/connectors",
                get(|| async { Json(json!({ "ok": true, "data": [] })) }),
            )
            .route(
                "/connections/c1/revoke",
                post(|State(h): State<Hits>| async move {
                    h.revoke.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "ok": true, "data": { "id": "c1", "status": "revoked" } }))
                }),
            )
            .with_state(hits.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        let client = ResourceClient::new(&format!("http://{addr}")).unwrap();

        let mut state = DashboardState::default();
        let mut pending = state.revoke("c1");
        assert_eq!(state.revoke("c1"), None);
        while let Some(effect) = pending {
            let event = effect.run(&client).await;
            pending = state.handle(event);
        }

        assert_eq!(hits.revoke.load(Ordering::SeqCst), 1);
        assert_eq!(hits.list.load(Ordering::SeqCst), 1);
        assert_eq!(state.notice.as_deref(), Some("c1 revoked"));
        assert!(matches!(state.view(), DashboardView::Ready(ref rows) if rows.len() == 1));
    }
}
