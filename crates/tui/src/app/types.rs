use crate::dashboard::DashboardEvent;
use crate::explorer::ExplorerEvent;
use crate::onboarding::WizardEvent;
use linkdeck_api::EnvelopeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Wizard,
    Dashboard,
    Explorer,
}

impl Screen {
    pub fn title(self) -> &'static str {
        match self {
            Screen::Wizard => "Connect",
            Screen::Dashboard => "Connections",
            Screen::Explorer => "Explorer",
        }
    }
}

/// Result of a spawned backend call, routed back to the screen that asked.
#[derive(Debug)]
pub enum AppAsyncEvent {
    Wizard(WizardEvent),
    Dashboard(DashboardEvent),
    Explorer(ExplorerEvent),
}

impl AppAsyncEvent {
    pub fn reached_backend(&self) -> bool {
        match self {
            AppAsyncEvent::Wizard(event) => event.reached_backend(),
            AppAsyncEvent::Dashboard(DashboardEvent::Fetched { connections, .. }) => {
                connections.reached_backend()
            }
            AppAsyncEvent::Dashboard(DashboardEvent::ActionFinished { result, .. }) => {
                result.reached_backend()
            }
            AppAsyncEvent::Explorer(event) => event.reached_backend(),
        }
    }

    /// The failure carried by this result, with a short label for the log.
    pub fn failure(&self) -> Option<(&'static str, &EnvelopeError)> {
        match self {
            AppAsyncEvent::Wizard(event) => match event {
                WizardEvent::ConnectorsLoaded(e) => e.error().map(|e| ("Loading connectors failed", e)),
                WizardEvent::OAuthInitiated(e) => e.error().map(|e| ("Starting OAuth failed", e)),
                WizardEvent::ApiKeyConnectionCreated(e) => {
                    e.error().map(|e| ("Creating the connection failed", e))
                }
                WizardEvent::Validated(e) => e.error().map(|e| ("Validation failed", e)),
                WizardEvent::RedirectElapsed => None,
            },
            AppAsyncEvent::Dashboard(event) => match event {
                DashboardEvent::Fetched { connections, .. } => {
                    connections.error().map(|e| ("Loading connections failed", e))
                }
                DashboardEvent::ActionFinished { result, .. } => {
                    result.error().map(|e| ("Connection action failed", e))
                }
            },
            AppAsyncEvent::Explorer(event) => match event {
                ExplorerEvent::ConnectionLoaded(e) => e.error().map(|e| ("Loading connection failed", e)),
                ExplorerEvent::ContainersLoaded(e) => e.error().map(|e| ("Loading containers failed", e)),
                ExplorerEvent::ItemsLoaded { items, .. } => {
                    items.error().map(|e| ("Loading items failed", e))
                }
                ExplorerEvent::ItemLoaded { item, .. } => item.error().map(|e| ("Loading item failed", e)),
                ExplorerEvent::CommentsLoaded { comments, .. } => {
                    comments.error().map(|e| ("Loading comments failed", e))
                }
                ExplorerEvent::ItemCreated(e) => e.error().map(|e| ("Creating item failed", e)),
                ExplorerEvent::CommentAdded { comment, .. } => {
                    comment.error().map(|e| ("Adding comment failed", e))
                }
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    Revoke { connection_id: String },
}

#[derive(Debug, Clone)]
pub struct ConfirmationDialog {
    pub title: String,
    pub message: String,
    pub action: PendingAction,
}
