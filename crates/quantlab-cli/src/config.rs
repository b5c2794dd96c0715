//! CLI configuration
//!
//! Service URL and stream tuning, resolved flag > environment > config
//! file > default. The config file lives at
//! `~/.config/quantlab/config.toml`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use quantlab_core::api::BacktestClient;
use serde::Deserialize;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const API_URL_ENV: &str = "QUANTLAB_API_URL";

/// On-disk config file shape; every field optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
    idle_timeout_secs: Option<u64>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub idle_timeout: Option<Duration>,
}

impl Config {
    pub fn load(api_url_flag: Option<String>) -> Result<Self> {
        let file = read_file_config()?;
        let api_url = api_url_flag
            .or_else(|| std::env::var(API_URL_ENV).ok())
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            idle_timeout: file.idle_timeout_secs.map(Duration::from_secs),
        })
    }

    /// Build a service client from this configuration
    pub fn client(&self) -> BacktestClient {
        let client = BacktestClient::new(&self.api_url);
        match self.idle_timeout {
            Some(timeout) => client.with_idle_timeout(timeout),
            None => client,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("quantlab").join("config.toml"))
}

fn read_file_config() -> Result<FileConfig> {
    let Some(path) = config_path() else {
        return Ok(FileConfig::default());
    };
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config in {}", path.display()))
}
