//! Configuration for the parley server.
//!
//! Settings come from a JSON configuration file, command-line arguments,
//! or both. CLI arguments take precedence over config file values; the
//! port and the protocol log path are required and must be resolvable
//! from one of the two sources.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(version = "0.1.0")]
#[command(about = "A minimal TCP request/response server", long_about = None)]
pub struct CliArgs {
    /// Path to JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on (1-65535)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to the protocol log file
    #[arg(short = 'f', long)]
    pub log_file: Option<PathBuf>,

    /// Log level for operator diagnostics (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// JSON configuration file structure.
///
/// `port` and `log_file_path` are required; a file missing either fails to
/// parse.
#[derive(Debug, Deserialize)]
pub struct FileConfig {
    /// Port to listen on.
    pub port: u16,
    /// Path to the protocol log file.
    pub log_file_path: PathBuf,
    /// Log level for operator diagnostics.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration, immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub log_file_path: PathBuf,
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from CLI args and optional JSON file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve(CliArgs::parse())
    }

    /// Merge CLI args with the file they point at (CLI takes precedence).
    pub fn resolve(cli: CliArgs) -> Result<Self, ConfigError> {
        let file_config = match cli.config {
            Some(ref path) => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::FileRead(path.clone(), e))?;
                let parsed: FileConfig = serde_json::from_str(&contents)
                    .map_err(|e| ConfigError::JsonParse(path.clone(), e))?;
                Some(parsed)
            }
            None => None,
        };

        let port = cli
            .port
            .or_else(|| file_config.as_ref().map(|f| f.port))
            .ok_or(ConfigError::MissingPort)?;
        if port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        let log_file_path = cli
            .log_file
            .or_else(|| file_config.as_ref().map(|f| f.log_file_path.clone()))
            .ok_or(ConfigError::MissingLogFile)?;

        let log_level = cli
            .log_level
            .or_else(|| file_config.map(|f| f.log_level))
            .unwrap_or_else(default_log_level);

        Ok(ServerConfig {
            port,
            log_file_path,
            log_level,
        })
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    JsonParse(PathBuf, serde_json::Error),
    MissingPort,
    MissingLogFile,
    InvalidPort,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::JsonParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::MissingPort => {
                write!(f, "No port configured: pass --port or set \"port\" in the config file")
            }
            ConfigError::MissingLogFile => {
                write!(
                    f,
                    "No log file configured: pass --log-file or set \"log_file_path\" in the config file"
                )
            }
            ConfigError::InvalidPort => write!(f, "Port must be in the range 1-65535"),
        }
    }
}

impl std::error::Error for ConfigError {}
