//! Configuration system for the `TaskDesk` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdesk/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use taskdesk_proto::task::TextPolicy;
use url::Url;

use crate::cli::Command;
use crate::tasks::DateField;

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

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

    /// The backend URL is not a valid absolute URL.
    #[error("invalid API URL {url:?}: {source}")]
    InvalidUrl {
        /// The rejected value.
        url: String,
        /// Parser error.
        source: url::ParseError,
    },

    /// Text length limits contradict each other.
    #[error("min_text_len ({min}) must be at least 1 and not above max_text_len ({max})")]
    TextLimits {
        /// Configured minimum.
        min: usize,
        /// Configured maximum.
        max: usize,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
    session: SessionFileConfig,
    tasks: TasksFileConfig,
    ui: UiFileConfig,
}

/// `[api]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    url: Option<String>,
    timeout_secs: Option<u64>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    file: Option<PathBuf>,
}

/// `[tasks]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct TasksFileConfig {
    min_text_len: Option<usize>,
    max_text_len: Option<usize>,
    letters_only: Option<bool>,
    notice_buffer: Option<usize>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    dark_mode: Option<bool>,
    show_search: Option<bool>,
    show_stats: Option<bool>,
    date_format: Option<String>,
    filter_date_field: Option<DateField>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Display options of the task screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiOptions {
    /// Dark palette (light otherwise).
    pub dark_mode: bool,
    /// Show the search line.
    pub show_search: bool,
    /// Show the stats line.
    pub show_stats: bool,
    /// Due date display format (chrono format string).
    pub date_format: String,
    /// Date the range filter applies to.
    pub filter_date_field: DateField,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            dark_mode: true,
            show_search: true,
            show_stats: true,
            date_format: "%b %-d, %Y".to_string(),
            filter_date_field: DateField::Due,
        }
    }
}

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- API --
    /// Backend base URL.
    pub api_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,

    // -- Session --
    /// Session file; `None` means the default location.
    pub session_file: Option<PathBuf>,

    // -- Tasks --
    /// Rules for task text.
    pub text_policy: TextPolicy,
    /// Capacity of the notice channel.
    pub notice_buffer: usize,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// Display options.
    pub ui: UiOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).unwrap_or_else(|_| unreachable!()),
            request_timeout: Duration::from_secs(10),
            session_file: None,
            text_policy: TextPolicy::default(),
            notice_buffer: 64,
            poll_timeout: Duration::from_millis(50),
            ui: UiOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// CLI args and env vars are parsed via `clap`. If `--config` is given
    /// and the file does not exist, returns an error. If no `--config` is
    /// given, the default path (`~/.config/taskdesk/config.toml`) is tried
    /// and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read,
    /// a file cannot be parsed, or a resolved value is invalid.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = match cli.api_url.as_deref().or(file.api.url.as_deref()) {
            Some(raw) => Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
                url: raw.to_string(),
                source,
            })?,
            None => defaults.api_url,
        };

        let text_policy = TextPolicy {
            min_chars: file
                .tasks
                .min_text_len
                .unwrap_or(defaults.text_policy.min_chars),
            max_chars: file
                .tasks
                .max_text_len
                .unwrap_or(defaults.text_policy.max_chars),
            letters_only: file
                .tasks
                .letters_only
                .unwrap_or(defaults.text_policy.letters_only),
        };
        if text_policy.min_chars == 0 || text_policy.min_chars > text_policy.max_chars {
            return Err(ConfigError::TextLimits {
                min: text_policy.min_chars,
                max: text_policy.max_chars,
            });
        }

        Ok(Self {
            api_url,
            request_timeout: cli
                .timeout_secs
                .or(file.api.timeout_secs)
                .map_or(defaults.request_timeout, Duration::from_secs),
            session_file: cli
                .session_file
                .clone()
                .or_else(|| file.session.file.clone()),
            text_policy,
            notice_buffer: file
                .tasks
                .notice_buffer
                .unwrap_or(defaults.notice_buffer),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            ui: UiOptions {
                dark_mode: file.ui.dark_mode.unwrap_or(defaults.ui.dark_mode),
                show_search: file.ui.show_search.unwrap_or(defaults.ui.show_search),
                show_stats: file.ui.show_stats.unwrap_or(defaults.ui.show_stats),
                date_format: file
                    .ui
                    .date_format
                    .clone()
                    .unwrap_or(defaults.ui.date_format),
                filter_date_field: file
                    .ui
                    .filter_date_field
                    .unwrap_or(defaults.ui.filter_date_field),
            },
        })
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal client for a REST task-management backend")]
pub struct CliArgs {
    /// Base URL of the backend.
    #[arg(long, global = true, env = "TASKDESK_API_URL")]
    pub api_url: Option<String>,

    /// Path to config file (default: `~/.config/taskdesk/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Session file (default: `<data dir>/taskdesk/session.json`).
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Run the task screen against an in-memory backend with demo data.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info", env = "TASKDESK_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskdesk.log`).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// What to do; opens the task screen when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskdesk").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
