//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use solace_turn::{AudioLimits, FacialConfig, GenerationConfig, SentimentConfig, SpeechConfig};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upload and reply-audio storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Audio upload bounds.
    #[serde(default)]
    pub audio: AudioLimits,

    /// External speech tool paths.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Optional external sentiment classifier.
    #[serde(default)]
    pub sentiment: SentimentConfig,

    /// Optional external facial-emotion analyzer.
    #[serde(default)]
    pub facial: FacialConfig,

    /// Text-generation capability settings. The credential comes from the
    /// `GEMINI_API_KEY` environment variable, never from the file.
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "solace_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Storage configuration for uploads and stored reply audio.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding temp uploads and stored reply audio.
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,

    /// How long stored reply audio is retained before the reaper deletes
    /// it, in seconds.
    #[serde(default = "default_artifact_ttl_secs")]
    pub artifact_ttl_secs: u64,

    /// Interval between retention sweeps, in seconds.
    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_storage_dir() -> PathBuf {
    std::env::temp_dir().join("solace")
}

fn default_artifact_ttl_secs() -> u64 {
    3600
}

fn default_reap_interval_secs() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            artifact_ttl_secs: default_artifact_ttl_secs(),
            reap_interval_secs: default_reap_interval_secs(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `SOLACE_HOST` overrides `server.host`
/// - `SOLACE_PORT` overrides `server.port`
/// - `SOLACE_LOG_LEVEL` overrides `logging.level`
/// - `SOLACE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `SOLACE_UPLOAD_DIR` overrides `storage.dir`
/// - `GEMINI_API_KEY` populates `generation.api_key`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("SOLACE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("SOLACE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(level) = std::env::var("SOLACE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("SOLACE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(dir) = std::env::var("SOLACE_UPLOAD_DIR") {
        config.storage.dir = PathBuf::from(dir);
    }
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.trim().is_empty() {
            config.generation.api_key = Some(key);
        }
    }

    Ok(config)
}
