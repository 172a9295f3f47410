use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use directories::ProjectDirs;
use linkdeck::app::App;
use linkdeck::config::{Config, BASE_URL_ENV};
use linkdeck::route::Route;
use linkdeck_api::ResourceClient;
use ratatui::crossterm::event::{self, DisableFocusChange, EnableFocusChange};
use ratatui::crossterm::execute;
use ratatui::DefaultTerminal;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "linkdeck", version)]
#[command(about = "Connect third-party services and browse what they hold")]
struct Args {
    /// Config file (defaults to config.toml in the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend origin; overrides the config file and LINKDECK_API_BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    /// Location to open, e.g. /connect or /connections/<id>?tab=items
    route: Option<String>,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "linkdeck", "linkdeck")
}

/// The terminal owns stdout, so logs go to a file in the data dir.
fn init_logging(dirs: Option<&ProjectDirs>) -> Result<()> {
    let log_dir = dirs
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&log_dir)
        .wrap_err_with(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("linkdeck.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let dirs = project_dirs();
    init_logging(dirs.as_ref())?;

    let config_path = args
        .config
        .clone()
        .or_else(|| dirs.as_ref().map(|d| d.config_dir().join("config.toml")))
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let mut config = Config::load_or_default(&config_path);
    config.resolve_base_url(std::env::var(BASE_URL_ENV).ok(), args.base_url);
    tracing::info!(
        base_url = %config.backend.base_url,
        config = %config_path.display(),
        "Starting linkdeck"
    );

    let route = match args.route.as_deref() {
        Some(location) => Route::parse(location).map_err(|e| eyre!("{e:#}"))?,
        None => Route::Dashboard,
    };
    let client = ResourceClient::with_options(&config.backend.base_url, config.client_options())
        .wrap_err("Invalid backend base URL")?;

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let mut terminal = ratatui::init();
    let _ = execute!(io::stdout(), EnableFocusChange);

    let result = run(&mut terminal, App::new(config, client), route);

    let _ = execute!(io::stdout(), DisableFocusChange);
    ratatui::restore();

    result
}

fn run(terminal: &mut DefaultTerminal, mut app: App, route: Route) -> Result<()> {
    app.navigate(route);

    loop {
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(Duration::from_millis(50))? && app.handle_event(event::read()?) {
            break;
        }

        app.process_async_events();
        app.tick(Instant::now());
    }

    tracing::info!("Shutting down");
    Ok(())
}
