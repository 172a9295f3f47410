use super::*;
use crate::onboarding::{OAuthStatus, WizardStep};
use linkdeck_api::{AuthMethod, ConnectionStatus};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState,
    Tabs, Wrap,
};

fn error_line(error: &EnvelopeError) -> Line<'static> {
    Line::styled(
        format!("✗ {} ({})", error.message, error.code),
        Style::default().fg(Color::Red),
    )
}

fn load_placeholder<T>(load: &Load<T>, noun: &str) -> Option<String> {
    match load {
        Load::Idle | Load::Loading => Some(format!("Loading {noun}…")),
        Load::Failed(error) => Some(format!(
            "Could not load {noun}: {} ({})\n\nPress r to retry.",
            error.message, error.code
        )),
        Load::Loaded(_) => None,
    }
}

fn status_style(status: ConnectionStatus) -> Style {
    match status {
        ConnectionStatus::Connected => Style::default().fg(Color::Green),
        ConnectionStatus::Invalid => Style::default().fg(Color::Red),
        ConnectionStatus::Revoked => Style::default().fg(Color::DarkGray),
        ConnectionStatus::Pending | ConnectionStatus::Unknown => Style::default().fg(Color::Yellow),
    }
}

fn selected_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
}

impl App {
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let panels = self
            .layout
            .calculate_layout(area, self.input.is_active())
            .to_vec();

        for panel in panels {
            match panel.panel_type {
                PanelType::Topbar => self.render_topbar(frame, panel.rect),
                PanelType::Body => match self.screen {
                    Screen::Wizard => self.render_wizard(frame, panel.rect),
                    Screen::Dashboard => self.render_dashboard(frame, panel.rect),
                    Screen::Explorer => self.render_explorer(frame, panel.rect),
                },
                PanelType::Prompt => self.render_prompt(frame, panel.rect),
                PanelType::StatusBar => self.render_status_bar(frame, panel.rect),
            }
        }

        if let Some(ref dialog) = self.confirmation_dialog {
            self.render_confirmation_dialog(frame, area, dialog);
        }
        if self.show_help {
            self.render_help(frame, area);
        }
        if self.show_error_details {
            self.render_error_details(frame, area);
        }
    }

    fn render_topbar(&self, frame: &mut Frame, area: Rect) {
        let refreshing = match self.screen {
            Screen::Dashboard if self.dashboard.is_refreshing() => "  ↻",
            _ => "",
        };
        let text = format!(
            " ● linkdeck   {}   {}{}{}   [g] go to   [?] help",
            self.screen.title(),
            self.location(),
            refreshing,
            if self.last_error.is_some() {
                "   ⚠ error [E]"
            } else {
                ""
            },
        );
        frame.render_widget(Paragraph::new(text).block(Block::default()), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let (notice, action_error) = match self.screen {
            Screen::Dashboard => (self.dashboard.notice.as_deref(), self.dashboard.action_error.as_ref()),
            Screen::Explorer => self
                .explorer
                .as_ref()
                .map_or((None, None), |e| (e.notice.as_deref(), e.action_error.as_ref())),
            Screen::Wizard => (None, None),
        };

        let line = if let Some(error) = action_error {
            error_line(error)
        } else if let Some(notice) = notice {
            Line::styled(format!("✓ {notice}"), Style::default().fg(Color::Green))
        } else {
            let hints = match self.screen {
                Screen::Wizard => "[↑↓] move  [Enter] continue  [Esc] back  [d] dashboard",
                Screen::Dashboard => "[Enter] explore  [v] validate  [x] revoke  [r] refresh  [n] new",
                Screen::Explorer => "[←→] tabs  [Enter] open  [/] search  [c] new item  [m] comment  [Esc] back",
            };
            Line::styled(hints, Style::default().fg(Color::DarkGray))
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_prompt(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(
            Paragraph::new(self.input.buffer.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(format!(" {} ", self.input.mode.label())),
            ),
            area,
        );
        let x = area
            .x
            .saturating_add(1)
            .saturating_add(self.input.cursor() as u16)
            .min(area.right().saturating_sub(2));
        frame.set_cursor_position((x, area.y + 1));
    }

    fn render_wizard(&self, frame: &mut Frame, area: Rect) {
        let wizard = &self.wizard;
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Connect a service - {} ", wizard.step.title()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(1),
                Constraint::Length(2),
            ])
            .split(inner);

        let current = WizardStep::ALL.iter().position(|s| *s == wizard.step).unwrap_or(0);
        let steps: Vec<Span> = WizardStep::ALL
            .iter()
            .enumerate()
            .flat_map(|(i, step)| {
                let style = if i == current {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else if i < current {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                let separator = if i + 1 < WizardStep::ALL.len() { "  ›  " } else { "" };
                [
                    Span::styled(format!("{}. {}", i + 1, step.title()), style),
                    Span::raw(separator),
                ]
            })
            .collect();
        frame.render_widget(Paragraph::new(Line::from(steps)), rows[0]);

        match wizard.step {
            WizardStep::SelectConnector => {
                if wizard.connectors.is_empty() {
                    let text = if wizard.connectors_loading {
                        "Loading connectors…"
                    } else {
                        "No connectors available. Press r to reload."
                    };
                    frame.render_widget(Paragraph::new(text), rows[1]);
                } else {
                    let items: Vec<ListItem> = wizard
                        .connectors
                        .iter()
                        .map(|c| {
                            let methods: Vec<&str> = c.usable_auth_methods().map(|m| m.label()).collect();
                            let mut line = format!("{}  [{}]", c.name, methods.join(", "));
                            if let Some(ref description) = c.description {
                                line.push_str(&format!("  {description}"));
                            }
                            ListItem::new(line)
                        })
                        .collect();
                    let mut state = ListState::default();
                    state.select(Some(wizard.cursor));
                    frame.render_stateful_widget(
                        List::new(items).highlight_style(selected_style()).highlight_symbol("> "),
                        rows[1],
                        &mut state,
                    );
                }
            }
            WizardStep::SelectAuth => {
                let methods = wizard.available_methods();
                if methods.is_empty() {
                    frame.render_widget(
                        Paragraph::new("This connector offers no way to authenticate. Press Esc."),
                        rows[1],
                    );
                } else {
                    let items: Vec<ListItem> = methods.iter().map(|m| ListItem::new(m.label())).collect();
                    let mut state = ListState::default();
                    state.select(Some(wizard.cursor));
                    frame.render_stateful_widget(
                        List::new(items).highlight_style(selected_style()).highlight_symbol("> "),
                        rows[1],
                        &mut state,
                    );
                }
            }
            WizardStep::Auth => {
                let text = match wizard.auth_method {
                    Some(AuthMethod::ApiKey) => self.api_key_form_text(),
                    _ => self.oauth_text(),
                };
                frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), rows[1]);
            }
            WizardStep::Validate => {
                let target = wizard
                    .connection_id
                    .as_deref()
                    .or(wizard.selected_connector_id.as_deref())
                    .unwrap_or("-");
                let text = if wizard.busy {
                    format!("Validating {target}…")
                } else {
                    format!("Press Enter to validate {target}.\nEsc goes back to authentication.")
                };
                frame.render_widget(Paragraph::new(text), rows[1]);
            }
            WizardStep::Done => {
                let text = if wizard.redirect_scheduled() {
                    "All set. Returning to the dashboard…\n\nPress Enter to go now."
                } else {
                    "All set. Press Enter to go to the dashboard."
                };
                frame.render_widget(Paragraph::new(text), rows[1]);
            }
        }

        let message = if let Some(ref error) = wizard.error {
            error_line(error)
        } else if let Some(ref info) = wizard.info_message {
            Line::styled(info.clone(), Style::default().fg(Color::Green))
        } else {
            Line::default()
        };
        frame.render_widget(Paragraph::new(message).wrap(Wrap { trim: true }), rows[2]);
    }

    fn api_key_form_text(&self) -> String {
        use crate::onboarding::Field;

        let form = &self.wizard.api_key_form;
        let marker = |field: Field| if form.selected_field == field { " [editing]" } else { "" };
        let key = if form.api_key.is_empty() {
            "[not set]".to_string()
        } else {
            form.masked_key()
        };
        let base = form.base_url().unwrap_or("[connector default]");
        let mut text = format!(
            "API key:   {key}{}\nBase URL:  {base}{}\n\n[Tab] switch field  [Enter] submit  [Esc] back",
            marker(Field::ApiKey),
            marker(Field::ApiBaseUrl),
        );
        if self.wizard.busy {
            text.push_str("\n\nSubmitting…");
        }
        text
    }

    fn oauth_text(&self) -> String {
        let wizard = &self.wizard;
        let name = wizard
            .selected_connector()
            .map(|c| c.name.as_str())
            .unwrap_or("the service");
        match (wizard.oauth.status, wizard.oauth.auth_url.as_deref()) {
            (OAuthStatus::Initiating, _) => "Requesting an authorization link…".to_string(),
            (_, Some(url)) => format!(
                "1. Open this link and authorize {name}:\n   {url}\n\n2. Paste the address you were sent back to and press Enter:\n> {}",
                wizard.oauth.callback_input
            ),
            (OAuthStatus::Failed, None) => {
                format!("Authorization with {name} did not complete. Press Enter to try again.")
            }
            _ => format!("Press Enter to start authorizing {name}."),
        }
    }

    fn render_dashboard(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(" Connections ");
        match self.dashboard.view() {
            DashboardView::Loading => {
                frame.render_widget(Paragraph::new("Loading connections…").block(block), area);
            }
            DashboardView::Empty => {
                frame.render_widget(
                    Paragraph::new("No connections yet.\n\nPress n to connect a service.").block(block),
                    area,
                );
            }
            DashboardView::Error(error) => {
                let text = vec![
                    Line::raw("Could not load connections."),
                    error_line(error),
                    Line::default(),
                    Line::raw("Press r to retry."),
                ];
                frame.render_widget(Paragraph::new(text).block(block), area);
            }
            DashboardView::Ready(rows) => {
                let count = rows.len();
                let table_rows: Vec<Row> = rows
                    .iter()
                    .map(|row| {
                        let validated = row
                            .connection
                            .last_validated_at
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "never".to_string());
                        Row::new(vec![
                            Cell::from(row.title().to_string()),
                            Cell::from(row.connector_name().to_string()),
                            Cell::from(row.connection.status.to_string())
                                .style(status_style(row.connection.status)),
                            Cell::from(validated),
                            Cell::from(if row.busy { "working…" } else { "" }),
                        ])
                    })
                    .collect();
                let table = Table::new(
                    table_rows,
                    [
                        Constraint::Percentage(30),
                        Constraint::Percentage(20),
                        Constraint::Length(10),
                        Constraint::Length(17),
                        Constraint::Min(8),
                    ],
                )
                .header(
                    Row::new(vec!["Name", "Connector", "Status", "Last validated", ""])
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                )
                .row_highlight_style(selected_style())
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!(" Connections ({count}) ")),
                );
                let mut state = TableState::default();
                state.select(Some(self.dashboard.cursor));
                frame.render_stateful_widget(table, area, &mut state);
            }
        }
    }

    fn render_explorer(&self, frame: &mut Frame, area: Rect) {
        let Some(ref explorer) = self.explorer else {
            return;
        };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let titles: Vec<String> = ExplorerTab::ALL
            .iter()
            .enumerate()
            .map(|(i, tab)| format!("{} {}", i + 1, tab.title()))
            .collect();
        frame.render_widget(
            Tabs::new(titles)
                .select(explorer.query.tab.index())
                .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!(" {} ", explorer.connection_id)),
                ),
            rows[0],
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", explorer.query.tab.title()));
        let body = rows[1];

        match explorer.query.tab {
            ExplorerTab::Containers => match load_placeholder(&explorer.containers, "containers") {
                Some(text) => frame.render_widget(Paragraph::new(text).block(block), body),
                None => {
                    let containers = explorer.containers.loaded().map(Vec::as_slice).unwrap_or_default();
                    if containers.is_empty() {
                        frame.render_widget(Paragraph::new("No containers.").block(block), body);
                        return;
                    }
                    let items: Vec<ListItem> = containers
                        .iter()
                        .map(|c| match c.kind {
                            Some(ref kind) => ListItem::new(format!("{}  ({kind})", c.name)),
                            None => ListItem::new(c.name.clone()),
                        })
                        .collect();
                    let mut state = ListState::default();
                    state.select(Some(explorer.cursor));
                    frame.render_stateful_widget(
                        List::new(items)
                            .block(block)
                            .highlight_style(selected_style())
                            .highlight_symbol("> "),
                        body,
                        &mut state,
                    );
                }
            },
            ExplorerTab::Items => {
                let filter = format!(
                    " Items - container: {}  search: {} ",
                    explorer.query.container_id.as_deref().unwrap_or("all"),
                    explorer.query.search.as_deref().unwrap_or("-"),
                );
                let block = Block::default().borders(Borders::ALL).title(filter);
                match load_placeholder(&explorer.items, "items") {
                    Some(text) => frame.render_widget(Paragraph::new(text).block(block), body),
                    None => {
                        let items = explorer.items.loaded().map(Vec::as_slice).unwrap_or_default();
                        if items.is_empty() {
                            frame.render_widget(
                                Paragraph::new("No items match. Press c to create one.").block(block),
                                body,
                            );
                            return;
                        }
                        let list: Vec<ListItem> = items
                            .iter()
                            .map(|item| match item.status {
                                Some(ref status) => ListItem::new(format!("{}  [{status}]", item.title)),
                                None => ListItem::new(item.title.clone()),
                            })
                            .collect();
                        let mut state = ListState::default();
                        state.select(Some(explorer.cursor));
                        frame.render_stateful_widget(
                            List::new(list)
                                .block(block)
                                .highlight_style(selected_style())
                                .highlight_symbol("> "),
                            body,
                            &mut state,
                        );
                    }
                }
            }
            ExplorerTab::Item => {
                let lines: Vec<Line> = match explorer.item_view() {
                    ItemView::Placeholder => {
                        vec![Line::raw("Select an item from the Items tab to see it here.")]
                    }
                    ItemView::Loading => vec![Line::raw("Loading item…")],
                    ItemView::Failed(error) => vec![
                        Line::raw("Could not load this item."),
                        error_line(error),
                        Line::raw("Press r to retry."),
                    ],
                    ItemView::Loaded { item, comments } => {
                        let mut lines = vec![Line::styled(
                            item.title.clone(),
                            Style::default().add_modifier(Modifier::BOLD),
                        )];
                        if let Some(ref status) = item.status {
                            lines.push(Line::raw(format!("Status: {status}")));
                        }
                        if let Some(ref url) = item.url {
                            lines.push(Line::raw(format!("Link:   {url}")));
                        }
                        if let Some(ref body) = item.body {
                            lines.push(Line::default());
                            lines.extend(body.lines().map(|l| Line::raw(l.to_string())));
                        }
                        lines.push(Line::default());
                        lines.push(Line::styled("Comments", Style::default().add_modifier(Modifier::UNDERLINED)));
                        match load_placeholder(comments, "comments") {
                            Some(text) => lines.push(Line::raw(text)),
                            None => {
                                let list = comments.loaded().map(Vec::as_slice).unwrap_or_default();
                                if list.is_empty() {
                                    lines.push(Line::raw("No comments yet. Press m to add one."));
                                }
                                for comment in list {
                                    let author = comment.author.as_deref().unwrap_or("unknown");
                                    lines.push(Line::from(vec![
                                        Span::styled(format!("{author}: "), Style::default().fg(Color::Cyan)),
                                        Span::raw(comment.body.clone()),
                                    ]));
                                }
                            }
                        }
                        lines
                    }
                };
                frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), body);
            }
            ExplorerTab::Raw => {
                let text = match load_placeholder(&explorer.connection, "connection") {
                    Some(text) => text,
                    None => explorer
                        .connection
                        .loaded()
                        .map(|value| serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()))
                        .unwrap_or_default(),
                };
                frame.render_widget(Paragraph::new(text).block(block), body);
            }
        }
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 70, area);
        frame.render_widget(Clear, popup_area);
        frame.render_widget(
            Paragraph::new(self.keybinds.help_text(self.screen)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Help - Press ? to close "),
            ),
            popup_area,
        );
    }

    fn render_confirmation_dialog(&self, frame: &mut Frame, area: Rect, dialog: &ConfirmationDialog) {
        let popup_area = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup_area);
        frame.render_widget(
            Paragraph::new(format!("{}\n\n[Enter] Confirm  [Esc] Cancel", dialog.message))
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!(" {} ", dialog.title)),
                ),
            popup_area,
        );
    }

    fn render_error_details(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 30, area);
        let details = self
            .last_error
            .as_deref()
            .unwrap_or("No error details available.");
        frame.render_widget(Clear, popup_area);
        frame.render_widget(
            Paragraph::new(format!("{details}\n\n[Enter] close  [Esc] dismiss"))
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Error Details "),
                ),
            popup_area,
        );
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn item_tab_without_item_shows_placeholder() {
        let client = ResourceClient::new("http://127.0.0.1:9").unwrap();
        let mut app = App::new(Config::default(), client);
        app.navigate(Route::parse("/connections/c1?tab=item").unwrap());

        let text = screen_text(&mut app);
        assert!(text.contains("Select an item from the Items tab"));
        assert!(!text.contains("Loading item"));
    }

    #[tokio::test]
    async fn dashboard_starts_in_loading_state() {
        let client = ResourceClient::new("http://127.0.0.1:9").unwrap();
        let mut app = App::new(Config::default(), client);
        app.navigate(Route::Dashboard);

        let text = screen_text(&mut app);
        assert!(text.contains("Loading connections"));
    }
}
