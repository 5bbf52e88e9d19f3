use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::tiering::FeeSchedule;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub zones: ZonesConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Optional courier fee schedule
    pub fees: Option<FeeSchedule>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZonesConfig {
    /// JSON export of zone records
    pub path: PathBuf,
    /// How long a snapshot is reused before reloading; 0 reloads per call
    #[serde(default = "default_ttl_secs")]
    pub refresh_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// Default filter directive, overridden by RUST_LOG
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_ttl_secs() -> u64 {
    30
}

fn default_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Defaults for everything except the zone file
    pub fn for_zones(path: PathBuf) -> Self {
        Self {
            server: ServerConfig::default(),
            zones: ZonesConfig {
                path,
                refresh_ttl_secs: default_ttl_secs(),
            },
            log: LogConfig::default(),
            fees: None,
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.zones.refresh_ttl_secs)
    }
}
