use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: Option<String>,
    pub rpc: Option<String>,
    pub ws: Option<String>,
    pub ipc: Option<String>,
}

/// Extra Greeter deployment, e.g. on a local dev chain
#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
    pub chain_id: u64,
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    #[serde(default)]
    pub contracts: Vec<ContractConfig>,

    pub poll_interval_ms: Option<u64>,

    pub log_level: Option<String>,
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config file")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.poll_interval_ms
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        )
    }

    /// Parsed `[[contracts]]` entries; malformed addresses are skipped
    pub fn extra_contracts(&self) -> Vec<(u64, Address)> {
        self.contracts
            .iter()
            .filter_map(|entry| match entry.address.trim().parse::<Address>() {
                Ok(address) => Some((entry.chain_id, address)),
                Err(err) => {
                    warn!(chain_id = entry.chain_id, address = %entry.address, "skipping contract entry: {err}");
                    None
                }
            })
            .collect()
    }
}

/// Load the config file; a missing file yields defaults
pub fn load() -> Result<Config> {
    let Some(path) = config_path() else {
        return Ok(Config::default());
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", path.display()))
        }
    };
    Config::parse(&content).with_context(|| format!("Failed to load {}", path.display()))
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("GREETER_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("greeter").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("greeter").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "greeter", "greeter")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("greeter"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("greeter"));
    }
    directories::ProjectDirs::from("io", "greeter", "greeter")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("greeter.log"))
}
