//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$PLANEMAIL_CONFIG` (environment variable)
//! 2. `~/.config/planemail/config.toml` (Linux)
//!    `~/Library/Application Support/planemail/config.toml` (macOS)
//!    `%APPDATA%\planemail\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::export::{Destination, ExportFormat};
use crate::query::{DEFAULT_KEYWORDS, DEFAULT_SUBJECT_BLACKLIST};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    /// Mailbox search settings.
    pub search: SearchConfig,
    /// Extraction reference data.
    pub extract: ExtractConfig,
    /// Gmail REST transport.
    pub gmail: GmailConfig,
    /// Export defaults.
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Override the accounts file location.
    pub accounts_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Message ids requested per page.
    pub page_size: usize,
    /// Restrict the search to Gmail's travel category.
    pub travel_category: bool,
    /// Phrases OR-ed together in the search query.
    pub keywords: Vec<String>,
    /// Subjects containing any of these (case-insensitive) are skipped.
    pub subject_blacklist: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Extra airports (`iata,name,city` CSV), merged over the built-in table.
    pub airports_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailConfig {
    /// Base URL of the Gmail REST API.
    pub api_base: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    pub destination: Destination,
    /// Directory for exported files (default: current directory).
    pub output_dir: Option<PathBuf>,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
            accounts_file: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            travel_category: true,
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            subject_blacklist: DEFAULT_SUBJECT_BLACKLIST
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            api_base: "https://gmail.googleapis.com/gmail/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("PLANEMAIL_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    config_dir().map(|d| d.join("config.toml"))
}

/// `<config dir>/planemail`.
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("planemail"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("planemail")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("planemail.log")
}

/// Return the accounts file path.
pub fn accounts_file_path(config: &Config) -> PathBuf {
    if let Some(ref path) = config.general.accounts_file {
        return path.clone();
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("accounts.json")
}
