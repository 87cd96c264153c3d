//! Centralized configuration for api-server.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than at request time.

use std::env;
use std::fmt;
use std::path::PathBuf;

/// Storage backend provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost on restart)
    Memory,
    /// SQLite file-based storage
    Sqlite,
}

impl StorageProvider {
    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(ConfigError {
                field: "STORAGE_PROVIDER",
                message: format!("Unknown provider '{}', expected 'memory' or 'sqlite'", s),
            }),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Server configuration loaded from environment variables.
///
/// All fields are validated at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 8080)
    pub port: u16,
    /// Storage provider (default: memory)
    pub storage_provider: StorageProvider,
    /// SQLite database path (default: ./data/petclinic.db)
    pub db_path: PathBuf,
    /// Log format
    pub log_format: LogFormat,
    /// Seed a demo owner on startup (default: true)
    pub seed_demo_data: bool,
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// Fails fast on invalid configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(s) => parse_port(&s)?,
            Err(_) => 8080,
        };

        let storage_provider = StorageProvider::from_str(
            &env::var("STORAGE_PROVIDER").unwrap_or_else(|_| "memory".into()),
        )?;

        let db_path = env::var("DB_PATH")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/petclinic.db"));

        let log_format =
            LogFormat::from_str(&env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into()));

        let seed_demo_data = match env::var("SEED_DEMO_DATA") {
            Ok(s) => parse_flag("SEED_DEMO_DATA", &s)?,
            Err(_) => true,
        };

        Ok(Self {
            port,
            storage_provider,
            db_path,
            log_format,
            seed_demo_data,
        })
    }

    /// Log warnings about configuration that loses data.
    pub fn warn_if_ephemeral(&self) {
        if self.storage_provider == StorageProvider::Memory {
            tracing::warn!("STORAGE_PROVIDER=memory: all owners and pets are lost on restart.");
        }
    }
}

fn parse_port(s: &str) -> Result<u16, ConfigError> {
    s.trim().parse().map_err(|e| ConfigError {
        field: "PORT",
        message: format!("Invalid port '{}': {}", s, e),
    })
}

fn parse_flag(field: &'static str, s: &str) -> Result<bool, ConfigError> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            field,
            message: format!("Expected a boolean, got '{}'", s),
        }),
    }
}
