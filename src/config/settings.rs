//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub limits: LimitsConfig,
    pub realtime: RealtimeConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Workflow limits configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Maximum applications a user may create per calendar day
    pub daily_application_limit: u32,
    /// Default page size for listing endpoints
    pub default_page_size: i64,
    /// Hard cap on page size from untrusted parameters
    pub max_page_size: i64,
}

/// Realtime channel configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RealtimeConfig {
    /// Buffer size of the broadcast ("everyone") channel
    pub broadcast_capacity: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("EVENTRA").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::EventraError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/eventra".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            limits: LimitsConfig {
                daily_application_limit: 5,
                default_page_size: 10,
                max_page_size: 100,
            },
            realtime: RealtimeConfig {
                broadcast_capacity: 256,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/eventra".to_string(),
            },
        }
    }
}
