//! Configuration loader.
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SLOTWISE_DB_PATH`: SQLite database file path (required)
//! - `SLOTWISE_DB_POOL_SIZE`: Connection pool size
//! - `SLOTWISE_CALENDAR_URL`: External busy-calendar base URL (optional)
//! - `SLOTWISE_CALENDAR_TIMEOUT`: Calendar request timeout in seconds
//! - `SLOTWISE_WEBHOOK_POLL_INTERVAL`: Delivery worker poll interval in seconds
//! - `SLOTWISE_WEBHOOK_BATCH_SIZE`: Deliveries processed per worker tick
//! - `SLOTWISE_BIND_ADDR`: HTTP listen address

use std::path::{Path, PathBuf};

use slotwise_domain::{
    CalendarConfig, Config, DatabaseConfig, Result, ServerConfig, SlotwiseError, WebhookConfig,
};

/// Load configuration: environment first, then config-file probing.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "environment configuration incomplete, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// `SLOTWISE_DB_PATH` is required; every other variable falls back to its
/// [`Config::default`] value.
pub fn load_from_env() -> Result<Config> {
    let defaults = Config::default();

    let db_path = env_var("SLOTWISE_DB_PATH")?;
    let pool_size = env_parsed("SLOTWISE_DB_POOL_SIZE", defaults.database.pool_size)?;

    let calendar_url = std::env::var("SLOTWISE_CALENDAR_URL").ok();
    let calendar_timeout =
        env_parsed("SLOTWISE_CALENDAR_TIMEOUT", defaults.calendar.timeout_seconds)?;

    let poll_interval =
        env_parsed("SLOTWISE_WEBHOOK_POLL_INTERVAL", defaults.webhooks.poll_interval_seconds)?;
    let batch_size = env_parsed("SLOTWISE_WEBHOOK_BATCH_SIZE", defaults.webhooks.batch_size)?;

    let bind_addr =
        std::env::var("SLOTWISE_BIND_ADDR").unwrap_or(defaults.server.bind_addr);

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size },
        calendar: CalendarConfig { base_url: calendar_url, timeout_seconds: calendar_timeout },
        webhooks: WebhookConfig {
            poll_interval_seconds: poll_interval,
            batch_size,
            delivery_timeout_seconds: defaults.webhooks.delivery_timeout_seconds,
        },
        server: ServerConfig { bind_addr },
    })
}

/// Load configuration from a file, probing standard locations when `path`
/// is `None`. Format is detected by extension (`.json` or `.toml`).
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SlotwiseError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SlotwiseError::Config("no config file found in any standard location".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SlotwiseError::Config(format!("failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SlotwiseError::Config(format!("invalid TOML config: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SlotwiseError::Config(format!("invalid JSON config: {e}"))),
        other => Err(SlotwiseError::Config(format!("unsupported config format: {other}"))),
    }
}

/// Probe the working directory, its parents, and the executable directory
/// for `config.{json,toml}` / `slotwise.{json,toml}`. First hit wins.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("slotwise.json"),
            cwd.join("slotwise.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("slotwise.json"),
                exe_dir.join("slotwise.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| SlotwiseError::Config(format!("missing required environment variable {key}")))
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| SlotwiseError::Config(format!("invalid value for {key}: {e}"))),
    }
}
