//! Server configuration

use anyhow::Context;
use railsight_classifiers::ModelConfig;
use railsight_storage::ArtifactConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Complete Railsight configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RailsightConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Model artifact location
    #[serde(default)]
    pub artifact: ArtifactConfig,

    /// Model specification
    #[serde(default)]
    pub model: ModelConfig,
}

impl RailsightConfig {
    /// Load configuration from `path`, or use defaults when the file does not exist
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            warn!(
                "Configuration file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.model.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded values
    pub fn apply_overrides(&mut self, address: Option<String>, port: Option<u16>) {
        if let Some(address) = address {
            self.server.address = address;
        }

        if let Some(port) = port {
            self.server.port = port;
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_address")]
    pub address: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Directory served under `/static`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Directory holding `index.html`
    #[serde(default = "default_view_dir")]
    pub view_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            static_dir: default_static_dir(),
            view_dir: default_view_dir(),
        }
    }
}

impl ServerConfig {
    /// Socket address to bind
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.address, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.address, self.port))
    }

    /// Path of the index page
    pub fn index_path(&self) -> PathBuf {
        self.view_dir.join("index.html")
    }
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("app/static")
}

fn default_view_dir() -> PathBuf {
    PathBuf::from("app/view")
}
