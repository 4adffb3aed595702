use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::http::connection::ConnectionSettings;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Deadline for each individual read while parsing a request.
    pub read_timeout_secs: u64,
    /// Product name sent in the `server` header and on error pages.
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
    /// Directory holding `error.html`.
    pub template_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:1440".to_string(),
            read_timeout_secs: 10,
            name: "Segaline".to_string(),
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./public"),
            template_root: PathBuf::from("./templates"),
        }
    }
}

impl Config {
    /// Default configuration, with `LISTEN` from the environment applied.
    pub fn load() -> Self {
        Self::default().with_env()
    }

    /// Reads a YAML config file. Missing keys fall back to their defaults
    /// and `LISTEN` from the environment still wins.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let cfg = Self::from_yaml(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(cfg.with_env())
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    fn with_env(mut self) -> Self {
        if let Ok(listen_addr) = std::env::var("LISTEN") {
            self.server.listen_addr = listen_addr;
        }
        self
    }

    /// `name/version`, as sent in the `server` header.
    pub fn server_identity(&self) -> String {
        format!("{}/{}", self.server.name, env!("CARGO_PKG_VERSION"))
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            read_timeout: Duration::from_secs(self.server.read_timeout_secs),
            server_identity: self.server_identity().into(),
        }
    }
}
