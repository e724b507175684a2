use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 4400;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// REST API port (default: 4400).
    port: Option<u16>,
    /// Log level filter string, e.g. "debug", "info,hived=trace" (default: "info").
    log: Option<String>,
    /// Bind address for the REST server (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Path to the SQLite database file (default: `{data_dir}/hived.db`).
    database_path: Option<PathBuf>,
    /// Bearer token required to call the API. None = auth disabled
    /// (local-only, trusted loopback use).
    api_token: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json" (structured for log aggregators).
    log_format: Option<String>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

/// Immutable server configuration, built once at startup and passed by
/// reference — never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub log: String,
    /// Bind address for the REST server (HIVED_BIND env var, default: "127.0.0.1").
    pub bind_address: String,
    /// SQLite database file location.
    pub database_path: PathBuf,
    /// Bearer token for the API. Set via `HIVED_API_TOKEN` env var or
    /// `api_token` in config.toml. None = authentication disabled.
    pub api_token: Option<String>,
    /// Log output format: "pretty" (default) | "json".
    pub log_format: String,
}

impl AppConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let bind_address = bind_address
            .or(std::env::var("HIVED_BIND").ok().filter(|s| !s.is_empty()))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let database_path = std::env::var("HIVED_DATABASE_PATH")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .or(toml.database_path)
            .unwrap_or_else(|| data_dir.join("hived.db"));

        let api_token = std::env::var("HIVED_API_TOKEN")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.api_token);

        let log_format = std::env::var("HIVED_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        Self {
            port,
            data_dir,
            log,
            bind_address,
            database_path,
            api_token,
            log_format,
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/hived
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("hived");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/hived or ~/.local/share/hived
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("hived");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local").join("share").join("hived");
        }
    }
    #[cfg(target_os = "windows")]
    {
        // %APPDATA%\hived
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("hived");
        }
    }
    // Fallback
    PathBuf::from(".hived")
}
