//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field has a sensible default, so the service also runs with no
//! config file at all (the public price feed needs no credentials).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Upstream price feed endpoints and cache TTLs.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    /// The wiki asks every consumer to identify itself.
    pub user_agent: String,
    /// Official guide-price catalogue endpoint (separate host).
    pub guide_url: String,
    pub request_timeout_secs: u64,
    /// The item catalog changes on game updates only.
    pub mapping_ttl_secs: u64,
    pub latest_ttl_secs: u64,
    pub volumes_ttl_secs: u64,
    pub timeseries_ttl_secs: u64,
    pub guide_ttl_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://prices.runescape.wiki/api/v1/osrs".to_string(),
            user_agent: "flipscout/0.1 (flip recommendation service)".to_string(),
            guide_url: "https://services.runescape.com/m=itemdb_oldschool/api/catalogue/detail.json"
                .to_string(),
            request_timeout_secs: 30,
            mapping_ttl_secs: 3600,
            latest_ttl_secs: 30,
            volumes_ttl_secs: 60,
            timeseries_ttl_secs: 60,
            guide_ttl_secs: 30,
        }
    }
}

/// HTTP API server settings.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8280,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file doesn't
    /// exist. A malformed file is still an error.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            info!(path, "No config file found, using defaults");
            return Ok(AppConfig::default());
        }
        Self::load(path)
    }
}
