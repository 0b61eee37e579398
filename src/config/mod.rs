use crate::encoder::EncoderProgram;
use crate::global;
use crate::stream::{Device, StreamConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Read-only settings. The file is optional and never written back.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub encoder: EncoderProgram,
    pub stream: StreamDefaults,
    pub api: ApiConfig,
}

/// Devices the CLI falls back to when none are given on the command line.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamDefaults {
    pub mic_device: String,
    pub system_device: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3838,
        }
    }
}

impl ApiConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StreamDefaults {
    /// Build a stream config, preferring explicit devices over the configured ones.
    pub fn stream_config(
        &self,
        stream_key: impl Into<String>,
        mic: Option<String>,
        system: Option<String>,
    ) -> StreamConfig {
        let mic = mic.unwrap_or_else(|| self.mic_device.clone());
        let system = system.unwrap_or_else(|| self.system_device.clone());
        StreamConfig::new(stream_key)
            .with_mic(Some(Device::from(mic)))
            .with_system(Some(Device::from(system)))
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            info!("No config file at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config = Self::parse(&content)?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
