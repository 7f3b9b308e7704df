//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.threadview/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use clap::ValueEnum;
use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::SinkKind;
use crate::thread::render::DEFAULT_RATE_LIMIT_MARKER;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ThreadviewConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub trace_id: Option<String>,
    pub log_level: Option<String>,
    /// How often the snapshot file is checked for changes.
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RenderConfig {
    pub rate_limit_markers: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SinkConfig {
    pub kind: Option<SinkKind>,
    pub outbox_path: Option<String>,
    pub webhook_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
/// Floor for the snapshot poll; anything lower spins the event loop.
pub const MIN_POLL_INTERVAL_MS: u64 = 50;
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;
const OUTBOX_FILE: &str = "outbox.jsonl";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub trace_id: Option<String>,
    pub log_level: LevelFilter,
    pub poll_interval_ms: u64,
    pub rate_limit_markers: Vec<String>,
    pub sink: SinkKind,
    pub outbox_path: PathBuf,
    pub webhook_url: Option<String>,
    pub webhook_timeout_secs: u64,
}

/// Values that came in on the command line (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides<'a> {
    pub trace_id: Option<&'a str>,
    pub sink: Option<SinkKind>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.threadview`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".threadview"))
}

/// Returns the path to `~/.threadview/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.threadview/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ThreadviewConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ThreadviewConfig, ConfigError> {
    let Some(path) = config_path() else {
        warn!("Could not determine home directory, using default config");
        return Ok(ThreadviewConfig::default());
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(ThreadviewConfig::default());
    }

    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<ThreadviewConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ThreadviewConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# threadview configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# trace_id = "..."                   # Or THREADVIEW_TRACE_ID / --trace-id
# log_level = "info"                 # "error", "warn", "info", "debug", "trace"
# poll_interval_ms = 500             # Snapshot change polling

# [render]
# rate_limit_markers = ["usage limit"]   # Failures mentioning these get no retry button

# [sink]
# kind = "jsonl"                     # "jsonl", "webhook" or "none"
# outbox_path = "~/.threadview/outbox.jsonl"
# webhook_url = "https://example.com/hooks/thread-events"
# timeout_secs = 10
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &ThreadviewConfig, cli: &CliOverrides<'_>) -> ResolvedConfig {
    // Trace id: CLI → env → config
    let trace_id = cli
        .trace_id
        .map(str::to_string)
        .or_else(|| std::env::var("THREADVIEW_TRACE_ID").ok())
        .or_else(|| config.general.trace_id.clone())
        .filter(|t| !t.is_empty());

    // Sink: CLI → env → config → default
    let sink = cli
        .sink
        .clone()
        .or_else(|| {
            std::env::var("THREADVIEW_SINK")
                .ok()
                .and_then(|s| <SinkKind as ValueEnum>::from_str(&s, true).ok())
        })
        .or_else(|| config.sink.kind.clone())
        .unwrap_or_default();

    // Webhook URL: env → config
    let webhook_url = std::env::var("THREADVIEW_WEBHOOK_URL")
        .ok()
        .or_else(|| config.sink.webhook_url.clone());

    let outbox_path = config
        .sink
        .outbox_path
        .as_deref()
        .map(expand_home)
        .or_else(|| config_dir().map(|d| d.join(OUTBOX_FILE)))
        .unwrap_or_else(|| PathBuf::from(OUTBOX_FILE));

    let log_level = match config.general.log_level.as_deref() {
        Some(level) => LevelFilter::from_str(level).unwrap_or_else(|_| {
            warn!("Unknown log level '{}', using {}", level, DEFAULT_LOG_LEVEL);
            DEFAULT_LOG_LEVEL
        }),
        None => DEFAULT_LOG_LEVEL,
    };

    let poll_interval_ms = match config.general.poll_interval_ms {
        Some(ms) if ms < MIN_POLL_INTERVAL_MS => {
            warn!(
                "poll_interval_ms = {} is too low, using {}",
                ms, MIN_POLL_INTERVAL_MS
            );
            MIN_POLL_INTERVAL_MS
        }
        Some(ms) => ms,
        None => DEFAULT_POLL_INTERVAL_MS,
    };

    ResolvedConfig {
        trace_id,
        log_level,
        poll_interval_ms,
        rate_limit_markers: config
            .render
            .rate_limit_markers
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_RATE_LIMIT_MARKER.to_string()]),
        sink,
        outbox_path,
        webhook_url,
        webhook_timeout_secs: config
            .sink
            .timeout_secs
            .unwrap_or(DEFAULT_WEBHOOK_TIMEOUT_SECS),
    }
}

/// Expands a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
