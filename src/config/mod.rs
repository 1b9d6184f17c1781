//! Configuration management

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR_NAME: &str = "estate-client";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-call request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Feature flag: show the top-of-page progress bar while requests run
    #[serde(default)]
    pub progress_bar: bool,

    /// Third-party key for the map picker
    #[serde(default)]
    pub maps_api_key: Option<String>,

    /// Third-party key for the rich-text editor
    #[serde(default)]
    pub editor_api_key: Option<String>,
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            progress_bar: false,
            maps_api_key: None,
            editor_api_key: None,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Get config directory (ESTATE_CONFIG_DIR, XDG_CONFIG_HOME or platform default)
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ESTATE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library/Application Support")
                .join(APP_DIR_NAME);
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR_NAME);
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR_NAME);
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR_NAME);
        }
    }

    // Fallback to current directory
    PathBuf::from(".")
}

/// Get data directory (ESTATE_DATA_DIR, XDG_DATA_HOME or platform default)
///
/// The persisted session (token, role, remember-me) lives here.
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ESTATE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library/Application Support")
                .join(APP_DIR_NAME);
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join(APP_DIR_NAME);
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local/share").join(APP_DIR_NAME);
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("LOCALAPPDATA") {
            return PathBuf::from(appdata).join(APP_DIR_NAME);
        }
    }

    PathBuf::from("./data")
}

pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir();

    let mut builder = ::config::Config::builder()
        .set_default("api_base_url", default_api_base_url())?
        .set_default("request_timeout_ms", default_request_timeout_ms() as i64)?
        // Load from config file if it exists
        .add_source(
            ::config::File::with_name(&config_dir.join("config").to_string_lossy()).required(false),
        )
        // Override with environment variables (ESTATE_API_BASE_URL, ESTATE_REQUEST_TIMEOUT_MS, etc.)
        .add_source(
            ::config::Environment::with_prefix("ESTATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    // Legacy API_BASE_URL only applies when the prefixed variable is absent
    if std::env::var("ESTATE_API_BASE_URL").is_err() {
        if let Ok(url) = std::env::var("API_BASE_URL") {
            builder = builder.set_override("api_base_url", url)?;
        }
    }

    let config: Config = builder.build()?.try_deserialize()?;
    validate_base_url(&config.api_base_url)?;

    Ok(config)
}

/// Reject base URLs reqwest could never reach (missing scheme, relative paths)
pub fn validate_base_url(raw: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(raw).map_err(|e| anyhow!("Invalid api_base_url {:?}: {}", raw, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(anyhow!("Unsupported api_base_url scheme: {}", other)),
    }
}
