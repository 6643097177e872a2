//! Runtime configuration, sourced from the environment (`.env` via
//! `dotenv`) or a `config.toml` file — never hardcoded at the call site,
//! matching the teacher crate's split between `from_env` and `from_file`.

use config::{Config, File};
use serde::Deserialize;
use std::convert::TryFrom;
use std::error::Error;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub storage_path: String,
    pub api_port: u16,
    pub log_level: String,
    pub embedding_model: String,
    /// Embedding dimensionality; fixes the width of every stored vector
    /// for the lifetime of the store.
    pub dimensions: usize,
    /// Default extra candidates pulled past `k` during a reordered binary
    /// search.
    pub overshoot: usize,
    /// Default `reorder` flag for binary search requests that don't
    /// specify one explicitly.
    pub reorder: bool,
}

impl TryFrom<Config> for AppConfig {
    type Error = Box<dyn Error>;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        Ok(Self {
            storage_path: config.get::<String>("storage_path")?,
            api_port: config.get::<u16>("api_port")?,
            log_level: config.get::<String>("log_level")?,
            embedding_model: config.get::<String>("embedding_model")?,
            dimensions: config.get::<usize>("dimensions")?,
            overshoot: config.get::<usize>("overshoot")?,
            reorder: config.get::<bool>("reorder")?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            storage_path: std::env::var("STORAGE_PATH").unwrap_or_else(|_| "./data".to_string()),
            api_port: std::env::var("API_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            embedding_model: std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "hashing".to_string()),
            dimensions: std::env::var("DIMENSIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
            overshoot: std::env::var("OVERSHOOT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(200),
            reorder: std::env::var("REORDER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }

    #[allow(deprecated)]
    pub fn from_file(path: &str) -> Result<Self, Box<dyn Error>> {
        let mut settings = Config::default();
        settings.merge(File::with_name(path))?;
        Self::try_from(settings)
    }

    pub fn default() -> Self {
        Self {
            storage_path: "./data".to_string(),
            api_port: 8080,
            log_level: "info".to_string(),
            embedding_model: "hashing".to_string(),
            dimensions: 256,
            overshoot: 200,
            reorder: true,
        }
    }
}
