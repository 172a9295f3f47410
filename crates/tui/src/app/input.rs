use super::*;
use crate::onboarding::WizardStep;
use linkdeck_api::AuthMethod;

impl App {
    /// Returns true when the app should quit.
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key),
            Event::FocusGained => {
                self.handle_focus_gained();
                false
            }
            _ => false,
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        if self.input.is_active() {
            self.handle_prompt_key(key);
            return false;
        }

        if self.confirmation_dialog.is_some() {
            match key.code {
                KeyCode::Enter | KeyCode::Char('y') => {
                    if let Some(dialog) = self.confirmation_dialog.take() {
                        self.dispatch_confirmed(dialog);
                    }
                }
                KeyCode::Esc | KeyCode::Char('n') => self.confirmation_dialog = None,
                _ => {}
            }
            return false;
        }

        if self.show_error_details {
            match key.code {
                KeyCode::Esc => self.clear_error(),
                KeyCode::Enter | KeyCode::Char('E') => self.show_error_details = false,
                _ => {}
            }
            return false;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return false;
        }

        // Typed credentials must not be taken as shortcuts.
        if self.screen == Screen::Wizard && self.wizard_captures_text() {
            self.handle_wizard_text_key(key);
            return false;
        }

        match key.code {
            KeyCode::Char('?') => {
                self.show_help = true;
                return false;
            }
            KeyCode::Char('E') => {
                self.show_error_details = self.last_error.is_some();
                return false;
            }
            KeyCode::Char('g') => {
                let location = self.location();
                self.input.begin(InputMode::GoTo, &location);
                return false;
            }
            _ => {}
        }

        match self.screen {
            Screen::Wizard => self.handle_wizard_key(key),
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::Explorer => self.handle_explorer_key(key),
        }
        false
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input.clear();
                self.pending_item_title = None;
            }
            KeyCode::Enter => {
                let (mode, text) = self.input.submit();
                self.submit_prompt(mode, &text);
            }
            KeyCode::Backspace => self.input.handle_backspace(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Char(c) => self.input.handle_char(c),
            _ => {}
        }
    }

    fn wizard_captures_text(&self) -> bool {
        self.wizard.step == WizardStep::Auth
            && match self.wizard.auth_method {
                Some(AuthMethod::ApiKey) => true,
                Some(AuthMethod::OAuth) => self.wizard.oauth.auth_url.is_some(),
                Some(AuthMethod::Unknown) | None => false,
            }
    }

    fn handle_wizard_text_key(&mut self, key: KeyEvent) {
        let api_key = self.wizard.auth_method == Some(AuthMethod::ApiKey);
        match key.code {
            KeyCode::Enter => {
                let effect = self.wizard.confirm();
                self.run_wizard(effect);
            }
            KeyCode::Esc => self.wizard.back(),
            KeyCode::Tab if api_key => self.wizard.api_key_form.toggle_field(),
            KeyCode::Backspace if api_key => {
                self.wizard.api_key_form.current_field_value().pop();
            }
            KeyCode::Backspace => {
                self.wizard.oauth.callback_input.pop();
            }
            KeyCode::Char(c) if api_key => self.wizard.api_key_form.current_field_value().push(c),
            KeyCode::Char(c) => self.wizard.oauth.callback_input.push(c),
            _ => {}
        }
    }

    fn handle_wizard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.wizard.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.wizard.move_cursor(1),
            KeyCode::Enter if self.wizard.step == WizardStep::Done => {
                self.navigate(Route::Dashboard);
            }
            KeyCode::Enter => {
                let effect = self.wizard.confirm();
                self.run_wizard(effect);
            }
            KeyCode::Esc | KeyCode::Backspace => self.wizard.back(),
            KeyCode::Char('r') => {
                self.wizard.clear_error();
                let effect = self.wizard.load_connectors();
                self.run_wizard(effect);
            }
            KeyCode::Char('d') => self.navigate(Route::Dashboard),
            _ => {}
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.dashboard.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.dashboard.move_cursor(1),
            KeyCode::Enter => self.open_selected_connection(),
            KeyCode::Char('v') => self.validate_selected_connection(),
            KeyCode::Char('x') => self.ask_revoke_selected_connection(),
            KeyCode::Char('r') => {
                let effect = self.dashboard.revalidate(RevalidateReason::Manual);
                self.run_dashboard(effect);
            }
            KeyCode::Char('n') => self.navigate(Route::Connect(None)),
            _ => {}
        }
    }

    fn handle_explorer_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.navigate(Route::Dashboard);
            return;
        }
        let Some(ref mut explorer) = self.explorer else {
            return;
        };
        let effects = match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                let tab = explorer.neighbour_tab(-1);
                explorer.switch_tab(tab)
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                let tab = explorer.neighbour_tab(1);
                explorer.switch_tab(tab)
            }
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                explorer.switch_tab(ExplorerTab::ALL[idx])
            }
            KeyCode::Up | KeyCode::Char('k') => {
                explorer.move_cursor(-1);
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                explorer.move_cursor(1);
                Vec::new()
            }
            KeyCode::Enter => explorer.activate(),
            KeyCode::Char('a') => explorer.select_container(None),
            KeyCode::Char('r') => explorer.refresh(),
            KeyCode::Char('/') => {
                let search = explorer.query.search.clone().unwrap_or_default();
                self.input.begin(InputMode::Search, &search);
                Vec::new()
            }
            KeyCode::Char('c') => {
                self.input.begin(InputMode::ItemTitle, "");
                Vec::new()
            }
            KeyCode::Char('m') if explorer.query.item_id.is_some() => {
                self.input.begin(InputMode::Comment, "");
                Vec::new()
            }
            _ => Vec::new(),
        };
        self.run_explorer(effects);
    }
}
