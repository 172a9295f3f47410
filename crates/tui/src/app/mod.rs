use crate::config::Config;
use crate::dashboard::{DashboardEffect, DashboardState, DashboardView, RevalidateReason};
use crate::explorer::{ExplorerEffect, ExplorerState, ExplorerTab, ItemView, Load};
use crate::input::{InputMode, InputState};
use crate::keybinds::Keybinds;
use crate::onboarding::{WizardEffect, WizardEvent, WizardSession};
use crate::route::Route;
use crate::ui::layout::LayoutState;
use crate::ui::panel::PanelType;
use linkdeck_api::error::redact_secrets;
use linkdeck_api::{EnvelopeError, ResourceClient};
use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::Frame;
use std::future::Future;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

mod actions;
mod effects;
mod input;
mod render;
mod state;
mod types;

pub use state::App;
pub use types::{AppAsyncEvent, ConfirmationDialog, PendingAction, Screen};

impl App {
    pub(super) fn report_error(&mut self, context: &str, error: &EnvelopeError) {
        let mut message = format!("{context}: {} ({})", error.message, error.code);
        if let Some(ref details) = error.details {
            message.push_str("\n\n");
            message.push_str(details);
        }
        let message = redact_secrets(&message);
        tracing::warn!("{message}");
        self.last_error = Some(message);
    }

    pub(super) fn clear_error(&mut self) {
        self.last_error = None;
        self.show_error_details = false;
    }

    /// Runs `future` for the current mount. Leaving the screen cancels it,
    /// and anything it already sent is dropped on receipt.
    pub(super) fn spawn_app_task<F>(&self, future: F)
    where
        F: Future<Output = AppAsyncEvent> + Send + 'static,
    {
        let tx = self.app_async_tx.clone();
        let token = self.mount_token.clone();
        let mount = self.mount_id;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                event = future => {
                    let _ = tx.send((mount, event));
                }
            }
        });
    }
}
