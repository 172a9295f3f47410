use super::*;

impl App {
    fn remount(&mut self, screen: Screen) {
        self.mount_token.cancel();
        self.mount_token = CancellationToken::new();
        self.mount_id += 1;
        if self.screen == Screen::Dashboard && screen != Screen::Dashboard {
            self.dashboard.unmount();
        }
        if screen != Screen::Explorer {
            self.explorer = None;
        }
        self.screen = screen;
        self.input.clear();
        self.pending_item_title = None;
        self.confirmation_dialog = None;
        tracing::debug!(?screen, mount = self.mount_id, "Screen mounted");
    }

    pub fn navigate(&mut self, route: Route) {
        tracing::info!(location = %route, "Navigating");
        match route {
            Route::Dashboard => {
                if self.screen == Screen::Dashboard && self.mount_id > 0 {
                    let effect = self.dashboard.revalidate(RevalidateReason::Manual);
                    self.run_dashboard(effect);
                    return;
                }
                self.remount(Screen::Dashboard);
                let effect = self.dashboard.mount(Instant::now());
                self.run_dashboard(effect);
            }
            Route::Connect(callback) => {
                let already_here = self.screen == Screen::Wizard && self.mount_id > 0;
                if !already_here {
                    self.remount(Screen::Wizard);
                    self.wizard = WizardSession::new(self.config.redirect_delay());
                    let effect = self.wizard.load_connectors();
                    self.run_wizard(effect);
                }
                if let Some(callback) = callback {
                    self.wizard.apply_callback(callback);
                }
            }
            Route::Explorer {
                connection_id,
                query,
            } => {
                self.remount(Screen::Explorer);
                let (explorer, effects) = ExplorerState::open(connection_id, query);
                self.explorer = Some(explorer);
                self.run_explorer(effects);
            }
        }
    }

    pub(super) fn run_wizard(&self, effect: Option<WizardEffect>) {
        let Some(effect) = effect else { return };
        let client = self.client.clone();
        self.spawn_app_task(async move { AppAsyncEvent::Wizard(effect.run(&client).await) });
    }

    pub(super) fn run_dashboard(&self, effect: Option<DashboardEffect>) {
        let Some(effect) = effect else { return };
        let client = self.client.clone();
        self.spawn_app_task(async move { AppAsyncEvent::Dashboard(effect.run(&client).await) });
    }

    pub(super) fn run_explorer(&self, effects: Vec<ExplorerEffect>) {
        for effect in effects {
            let client = self.client.clone();
            self.spawn_app_task(async move { AppAsyncEvent::Explorer(effect.run(&client).await) });
        }
    }

    pub fn process_async_events(&mut self) {
        let mut async_events = Vec::new();
        while let Ok(event) = self.app_async_rx.try_recv() {
            async_events.push(event);
        }

        for (mount, event) in async_events {
            if mount != self.mount_id {
                tracing::debug!(mount, current = self.mount_id, "Dropping result for an unmounted screen");
                continue;
            }
            if let Some((context, error)) = event.failure() {
                let error = error.clone();
                self.report_error(context, &error);
            }
            let reached_backend = event.reached_backend();

            match event {
                AppAsyncEvent::Wizard(WizardEvent::RedirectElapsed) => {
                    self.navigate(Route::Dashboard);
                    continue;
                }
                AppAsyncEvent::Wizard(event) => {
                    let effect = self.wizard.handle(event);
                    self.run_wizard(effect);
                }
                AppAsyncEvent::Dashboard(event) => {
                    let effect = self.dashboard.handle(event);
                    self.run_dashboard(effect);
                }
                AppAsyncEvent::Explorer(event) => {
                    let effects = match self.explorer {
                        Some(ref mut explorer) => explorer.handle(event),
                        None => Vec::new(),
                    };
                    self.run_explorer(effects);
                }
            }

            if reached_backend && self.screen == Screen::Dashboard {
                let effect = self.dashboard.note_reachable();
                self.run_dashboard(effect);
            }
        }
    }

    /// Called once per frame.
    pub fn tick(&mut self, now: Instant) {
        if self.screen == Screen::Dashboard && self.mount_id > 0 {
            let effect = self.dashboard.tick(now);
            self.run_dashboard(effect);
        }
    }

    pub fn handle_focus_gained(&mut self) {
        if self.screen == Screen::Dashboard && self.mount_id > 0 {
            let effect = self.dashboard.revalidate(RevalidateReason::Focus);
            self.run_dashboard(effect);
        }
    }
}
