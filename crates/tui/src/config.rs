use anyhow::{Context, Result};
use linkdeck_api::ClientOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const BASE_URL_ENV: &str = "LINKDECK_API_BASE_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub dashboard: DashboardConfig,
    pub wizard: WizardConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub poll_interval_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    pub redirect_delay_millis: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_seconds: 20,
            connect_timeout_seconds: 5,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 15,
        }
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            redirect_delay_millis: 1500,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// A missing file is normal on first run; a broken one is logged.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("{e:#}; using defaults");
            Self::default()
        })
    }

    /// Environment first, then the command line.
    pub fn resolve_base_url(&mut self, env: Option<String>, cli: Option<String>) {
        if let Some(url) = cli.or(env).filter(|u| !u.trim().is_empty()) {
            self.backend.base_url = url.trim().to_string();
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.backend.timeout_seconds.max(1)),
            connect_timeout: Duration::from_secs(self.backend.connect_timeout_seconds.max(1)),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard.poll_interval_seconds.max(1))
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.wizard.redirect_delay_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let config = Config::from_toml(
            r#"
            [backend]
            base_url = "https://api.example.test/v1"

            [dashboard]
            poll_interval_seconds = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.base_url, "https://api.example.test/v1");
        assert_eq!(config.backend.timeout_seconds, 20);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.redirect_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn command_line_beats_environment() {
        let mut config = Config::default();
        config.resolve_base_url(Some("http://env.test".into()), None);
        assert_eq!(config.backend.base_url, "http://env.test");

        config.resolve_base_url(Some("http://env.test".into()), Some("http://cli.test".into()));
        assert_eq!(config.backend.base_url, "http://cli.test");

        config.resolve_base_url(Some("  ".into()), None);
        assert_eq!(config.backend.base_url, "http://cli.test");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("linkdeck-config-does-not-exist.toml");
        assert_eq!(Config::load_or_default(&path), Config::default());
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn broken_file_is_reported_by_load() {
        let path = std::env::temp_dir().join(format!("linkdeck-broken-{}.toml", std::process::id()));
        std::fs::write(&path, "[backend\nbase_url = 1").unwrap();
        assert!(Config::load(&path).is_err());
        assert_eq!(Config::load_or_default(&path), Config::default());
        let _ = std::fs::remove_file(&path);
    }
}
