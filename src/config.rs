use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const ENV_FILE: &str = ".env";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const BACKEND_URL_ENV: &str = "PANEL_BACKEND_URL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Socket.IO endpoint path on the backend.
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_s: u64,
}

fn default_base_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}
fn default_socket_path() -> String {
    "/socket.io/".to_string()
}
fn default_request_timeout() -> u64 { 10_000 }
fn default_reconnect_delay() -> u64 { 2 }

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            socket_path: default_socket_path(),
            request_timeout_ms: default_request_timeout(),
            reconnect_delay_s: default_reconnect_delay(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_s)
    }

    /// WebSocket URL of the Socket.IO endpoint, derived from the HTTP base URL.
    /// "http://host:5000" -> "ws://host:5000/socket.io/?EIO=4&transport=websocket"
    pub fn socket_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        let path = format!("/{}/", self.socket_path.trim_matches('/'));
        format!("{}{}?EIO=4&transport=websocket", ws_base, path)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    /// Redraw/poll interval for the terminal loop.
    #[serde(default = "default_tick")]
    pub tick_ms: u64,
}

fn default_tick() -> u64 { 100 }

impl Default for UiConfig {
    fn default() -> Self {
        Self { tick_ms: default_tick() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_file() -> String {
    "pipeline-panel.log".to_string()
}
fn default_log_filter() -> String {
    "pipeline_panel=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }

    /// Load `path` when it exists, otherwise fall back to built-in defaults.
    /// A present but malformed file is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            let url = sanitize_value(&url);
            if !url.is_empty() {
                self.backend.base_url = url;
            }
        }
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        // Strip BOM if present (common on Windows-created files)
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for line in content.lines() {
            let line = line.trim().trim_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
        }
    }
}

/// Strip carriage returns, BOM, and other invisible chars from an env value.
fn sanitize_value(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}
