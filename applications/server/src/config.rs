/// Server configuration
use crate::error::{Result, ServerError};
use encore_core::AnalyticsConfig;
use encore_storage::plays::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_batch_tracks")]
    pub max_batch_tracks: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// Reads `path` when given, otherwise `config.toml` in the working
    /// directory if it exists. `ENCORE_`-prefixed variables override both,
    /// e.g. `ENCORE_STORAGE__DATABASE_URL`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from("config.toml");
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("ENCORE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.is_empty() {
            return Err(ServerError::Config(
                "Database URL is required (set ENCORE_STORAGE__DATABASE_URL)".to_string(),
            ));
        }

        if self.server.max_batch_tracks == 0 {
            return Err(ServerError::Config(
                "server.max_batch_tracks must be greater than zero".to_string(),
            ));
        }

        if self.storage.max_connections == 0 {
            return Err(ServerError::Config(
                "storage.max_connections must be greater than zero".to_string(),
            ));
        }

        if self.storage.insert_batch_size == 0 || self.storage.insert_batch_size > MAX_BATCH_SIZE {
            return Err(ServerError::Config(format!(
                "storage.insert_batch_size must be between 1 and {MAX_BATCH_SIZE}"
            )));
        }

        self.analytics
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_batch_tracks() -> usize {
    crate::state::DEFAULT_MAX_BATCH_TRACKS
}

fn default_database_url() -> String {
    "sqlite://./data/encore.db".to_string()
}

fn default_max_connections() -> u32 {
    encore_storage::DEFAULT_MAX_CONNECTIONS
}

fn default_insert_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_batch_tracks: default_max_batch_tracks(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            insert_batch_size: default_insert_batch_size(),
        }
    }
}
