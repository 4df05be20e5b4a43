//! Configuration for the courier server.
//!
//! Loaded from the YAML file named by `COURIER_CONFIG` when set, with the
//! listen address overridable through `LISTEN`.
//!
//! ```yaml
//! listen_addr: 0.0.0.0:8080
//! file: ./video.mp4
//! content_type: video/mp4
//! stream:
//!   chunk_size: 65536
//!   flush: true
//! ```

use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

use crate::stream::{StreamConfig, DEFAULT_CHUNK_SIZE};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    /// File served to every request.
    pub file: PathBuf,
    pub content_type: String,
    pub stream: StreamSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            file: PathBuf::from("index.html"),
            content_type: "application/octet-stream".to_string(),
            stream: StreamSettings::default(),
        }
    }
}

/// Streaming options applied to every served body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    pub chunk_size: usize,
    pub flush: bool,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            flush: false,
        }
    }
}

impl From<&StreamSettings> for StreamConfig {
    fn from(settings: &StreamSettings) -> Self {
        let config = StreamConfig::new().with_chunk_size(settings.chunk_size);

        if settings.flush {
            config.with_flush()
        } else {
            config
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("COURIER_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config file {}", path))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
