use super::*;

pub struct App {
    pub config: Config,
    pub client: ResourceClient,
    pub screen: Screen,
    pub wizard: WizardSession,
    pub dashboard: DashboardState,
    pub explorer: Option<ExplorerState>,
    pub layout: LayoutState,
    pub input: InputState,
    pub keybinds: Keybinds,
    pub show_help: bool,
    pub confirmation_dialog: Option<ConfirmationDialog>,
    pub pending_item_title: Option<String>,
    pub last_error: Option<String>,
    pub show_error_details: bool,
    pub(super) mount_id: u64,
    pub(super) mount_token: CancellationToken,
    pub(super) app_async_tx: mpsc::UnboundedSender<(u64, AppAsyncEvent)>,
    pub(super) app_async_rx: mpsc::UnboundedReceiver<(u64, AppAsyncEvent)>,
}

impl App {
    /// Nothing is mounted until the first [`App::navigate`].
    pub fn new(config: Config, client: ResourceClient) -> Self {
        let (app_async_tx, app_async_rx) = mpsc::unbounded_channel();

        Self {
            wizard: WizardSession::new(config.redirect_delay()),
            dashboard: DashboardState::new(config.poll_interval()),
            config,
            client,
            screen: Screen::Dashboard,
            explorer: None,
            layout: LayoutState::default(),
            input: InputState::new(),
            keybinds: Keybinds,
            show_help: false,
            confirmation_dialog: None,
            pending_item_title: None,
            last_error: None,
            show_error_details: false,
            mount_id: 0,
            mount_token: CancellationToken::new(),
            app_async_tx,
            app_async_rx,
        }
    }

    pub fn location(&self) -> String {
        match self.screen {
            Screen::Dashboard => Route::Dashboard.to_string(),
            Screen::Wizard => Route::Connect(None).to_string(),
            Screen::Explorer => self
                .explorer
                .as_ref()
                .map(ExplorerState::location)
                .unwrap_or_else(|| Route::Dashboard.to_string()),
        }
    }
}
