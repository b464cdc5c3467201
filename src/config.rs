use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded song files
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
    /// Largest accepted request body, in bytes
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_db_path() -> String {
    "data/tuneful.db".to_string()
}

fn default_upload_path() -> String {
    "data/uploads".to_string()
}

fn default_max_upload_size() -> usize {
    32 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_path: default_upload_path(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides(|key| env::var(key).ok());
        config.ensure_directories()?;
        Ok(config)
    }

    fn load_from_file() -> anyhow::Result<Self> {
        let config_paths = [
            "tuneful.toml",
            "config.toml",
            "data/tuneful.toml",
            "data/config.toml",
        ];

        for path in config_paths {
            if Path::new(path).exists() {
                let content = fs::read_to_string(path)?;
                let config: Config = toml::from_str(&content)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Apply environment variable overrides
    /// Format: TUNEFUL_CONF_<SECTION>_<KEY>
    fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("TUNEFUL_CONF_SERVER_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("TUNEFUL_CONF_SERVER_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid TUNEFUL_CONF_SERVER_PORT: {}", val),
            }
        }

        if let Some(val) = var("TUNEFUL_CONF_DATABASE_PATH") {
            self.database.path = val;
        }

        if let Some(val) = var("TUNEFUL_CONF_STORAGE_UPLOAD_PATH") {
            if !val.trim().is_empty() {
                self.storage.upload_path = val;
            }
        }
        if let Some(val) = var("TUNEFUL_CONF_STORAGE_MAX_UPLOAD_SIZE") {
            match val.parse() {
                Ok(size) => self.storage.max_upload_size = size,
                Err(_) => tracing::warn!("Ignoring invalid TUNEFUL_CONF_STORAGE_MAX_UPLOAD_SIZE: {}", val),
            }
        }
    }

    /// Ensure required directories exist
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        if let Some(parent) = Path::new(&self.database.path).parent() {
            fs::create_dir_all(parent)?;
        }

        fs::create_dir_all(&self.storage.upload_path)?;

        Ok(())
    }
}
