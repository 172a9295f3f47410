use super::*;

const INVALID_LOCATION: &str = "INVALID_LOCATION";

impl App {
    pub(super) fn submit_prompt(&mut self, mode: InputMode, text: &str) {
        match mode {
            InputMode::Normal => {}
            InputMode::GoTo => match Route::parse(text) {
                Ok(route) => self.navigate(route),
                Err(e) => {
                    let error = EnvelopeError::new(INVALID_LOCATION, format!("{e:#}"));
                    self.report_error("Cannot open location", &error);
                }
            },
            InputMode::Search => {
                if let Some(ref mut explorer) = self.explorer {
                    let effects = explorer.set_search(text);
                    self.run_explorer(effects);
                }
            }
            InputMode::ItemTitle => {
                if text.trim().is_empty() {
                    // Let the explorer reject it so the error shows in place.
                    self.create_item(text, "");
                } else {
                    self.pending_item_title = Some(text.to_string());
                    self.input.begin(InputMode::ItemBody, "");
                }
            }
            InputMode::ItemBody => {
                let title = self.pending_item_title.take().unwrap_or_default();
                self.create_item(&title, text);
            }
            InputMode::Comment => {
                let effect = self
                    .explorer
                    .as_mut()
                    .and_then(|explorer| explorer.add_comment(text));
                self.run_explorer(effect.into_iter().collect());
            }
        }
    }

    fn create_item(&mut self, title: &str, body: &str) {
        let effect = self
            .explorer
            .as_mut()
            .and_then(|explorer| explorer.create_item(title, body));
        self.run_explorer(effect.into_iter().collect());
    }

    pub(super) fn validate_selected_connection(&mut self) {
        let Some(id) = self.dashboard.selected_connection_id().map(str::to_string) else {
            return;
        };
        let effect = self.dashboard.validate(&id);
        self.run_dashboard(effect);
    }

    pub(super) fn ask_revoke_selected_connection(&mut self) {
        let Some(row) = self.dashboard.rows().get(self.dashboard.cursor).copied() else {
            return;
        };
        if row.busy {
            return;
        }
        self.confirmation_dialog = Some(ConfirmationDialog {
            title: "Revoke connection".to_string(),
            message: format!(
                "Revoke {} ({})? The backend will stop using its credentials.",
                row.title(),
                row.connection.id
            ),
            action: PendingAction::Revoke {
                connection_id: row.connection.id.clone(),
            },
        });
    }

    pub(super) fn dispatch_confirmed(&mut self, dialog: ConfirmationDialog) {
        match dialog.action {
            PendingAction::Revoke { connection_id } => {
                let effect = self.dashboard.revoke(&connection_id);
                self.run_dashboard(effect);
            }
        }
    }

    pub(super) fn open_selected_connection(&mut self) {
        if let Some(id) = self.dashboard.selected_connection_id().map(str::to_string) {
            self.navigate(Route::Explorer {
                connection_id: id,
                query: Default::default(),
            });
        }
    }
}
