//! Configuration for the `tasklist` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/tasklist/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.
//!
//! The remote endpoint and access key have no defaults. Their absence only
//! becomes an error when [`ClientConfig::to_remote_config`] is asked for a
//! remote connection.

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use tasklist_proto::query::DEFAULT_TABLE;
use tasklist_proto::task::{Filter, Priority, TaskError};

use crate::repository::rest::{RemoteConfig, table_url};
use crate::sync::DEFAULT_CHANNEL_CAPACITY;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// No endpoint URL was configured.
    #[error("no store endpoint configured (set --url, TASKLIST_URL or [remote] endpoint)")]
    MissingEndpoint,

    /// No access key was configured.
    #[error("no access key configured (set --key, TASKLIST_KEY or [remote] api_key)")]
    MissingApiKey,

    /// A `[ui]` value names no known priority or filter.
    #[error("invalid [ui] setting: {0}")]
    InvalidSetting(#[from] TaskError),

    /// The endpoint is not a usable http(s) URL.
    #[error("invalid store endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// Endpoint as configured.
        endpoint: String,
        /// What is wrong with it.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    remote: RemoteFileConfig,
    ui: UiFileConfig,
}

/// `[remote]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RemoteFileConfig {
    endpoint: Option<String>,
    api_key: Option<String>,
    table: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    channel_capacity: Option<usize>,
    default_priority: Option<String>,
    default_filter: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- Remote --
    /// Base URL of the hosted store.
    pub endpoint: Option<String>,
    /// Access key for the hosted store.
    pub api_key: Option<String>,
    /// Table name under `/rest/v1/`.
    pub table: String,
    /// Per-request timeout.
    pub request_timeout: Duration,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// Capacity of the sync worker's command and event channels.
    pub channel_capacity: usize,
    /// Priority preselected for new tasks.
    pub default_priority: Priority,
    /// View shown at startup.
    pub default_filter: Filter,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            table: DEFAULT_TABLE.to_string(),
            request_timeout: Duration::from_secs(10),
            poll_timeout: Duration::from_millis(50),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            default_priority: Priority::default(),
            default_filter: Filter::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, if the default config file exists but is invalid, or if a
    /// `[ui]` priority or filter name is unknown.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            endpoint: cli.url.clone().or_else(|| file.remote.endpoint.clone()),
            api_key: cli.key.clone().or_else(|| file.remote.api_key.clone()),
            table: cli
                .table
                .clone()
                .or_else(|| file.remote.table.clone())
                .unwrap_or(defaults.table),
            request_timeout: file
                .remote
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            channel_capacity: file
                .ui
                .channel_capacity
                .unwrap_or(defaults.channel_capacity),
            default_priority: file
                .ui
                .default_priority
                .as_deref()
                .map_or(Ok(defaults.default_priority), str::parse)?,
            default_filter: file
                .ui
                .default_filter
                .as_deref()
                .map_or(Ok(defaults.default_filter), str::parse)?,
        })
    }

    /// Build a [`RemoteConfig`] from this configuration.
    ///
    /// Empty values count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEndpoint`] or
    /// [`ConfigError::MissingApiKey`] if either is absent, and
    /// [`ConfigError::InvalidEndpoint`] if the endpoint is not an http(s)
    /// URL that can carry the table path.
    pub fn to_remote_config(&self) -> Result<RemoteConfig, ConfigError> {
        let raw = non_empty(self.endpoint.as_deref()).ok_or(ConfigError::MissingEndpoint)?;
        let api_key = non_empty(self.api_key.as_deref()).ok_or(ConfigError::MissingApiKey)?;

        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason,
        };
        let endpoint = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", endpoint.scheme())));
        }
        if table_url(&endpoint, &self.table).is_none() {
            return Err(invalid("cannot carry a path".to_string()));
        }

        Ok(RemoteConfig {
            endpoint,
            api_key: api_key.to_string(),
            table: self.table.clone(),
            request_timeout: self.request_timeout,
        })
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal task list synced to a hosted row store")]
pub struct CliArgs {
    /// Base URL of the hosted store.
    #[arg(long, env = "TASKLIST_URL")]
    pub url: Option<String>,

    /// Access key for the hosted store.
    #[arg(long, env = "TASKLIST_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Table name (default: `tasks`).
    #[arg(long)]
    pub table: Option<String>,

    /// Keep tasks in memory for this session instead of using the store.
    #[arg(long)]
    pub local: bool,

    /// Path to config file (default: `~/.config/tasklist/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKLIST_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/tasklist.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("tasklist").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
