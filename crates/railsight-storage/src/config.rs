//! Artifact configuration

use crate::credentials::{CredentialsConfig, TokenProvider};
use crate::gcs::{GcsStore, DEFAULT_ENDPOINT};
use crate::huggingface::HuggingFaceStore;
use crate::store::{ArtifactStore, LocalStore};
use railsight_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Where the model artifact lives and where it is cached locally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Local path of the artifact
    #[serde(default = "default_artifact_path")]
    pub path: PathBuf,

    /// Timeout for each network request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Remote source
    #[serde(default)]
    pub source: SourceConfig,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            path: default_artifact_path(),
            timeout_secs: default_timeout_secs(),
            source: SourceConfig::default(),
        }
    }
}

impl ArtifactConfig {
    /// Build an HTTP client honouring the configured timeout
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
    }
}

/// Source of the artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Google Cloud Storage
    Gcs {
        #[serde(default = "default_bucket")]
        bucket: String,

        #[serde(default = "default_object")]
        object: String,

        #[serde(default)]
        credentials: CredentialsConfig,

        #[serde(default = "default_endpoint")]
        endpoint: String,
    },

    /// Hugging Face Hub
    HuggingFace {
        repo: String,

        #[serde(default = "default_revision")]
        revision: String,

        #[serde(default = "default_object")]
        filename: String,
    },

    /// Local directory
    Local {
        dir: PathBuf,

        #[serde(default = "default_object")]
        filename: String,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Gcs {
            bucket: default_bucket(),
            object: default_object(),
            credentials: CredentialsConfig::default(),
            endpoint: default_endpoint(),
        }
    }
}

impl SourceConfig {
    /// Instantiate the configured store
    pub fn build_store(&self, client: reqwest::Client) -> Result<Arc<dyn ArtifactStore>> {
        let store: Arc<dyn ArtifactStore> = match self {
            Self::Gcs {
                bucket,
                object,
                credentials,
                endpoint,
            } => {
                let tokens = TokenProvider::from_config(credentials, client.clone())?;
                Arc::new(GcsStore::new(
                    client,
                    endpoint,
                    bucket.clone(),
                    object.clone(),
                    tokens,
                )?)
            }
            Self::HuggingFace {
                repo,
                revision,
                filename,
            } => Arc::new(HuggingFaceStore::new(
                repo.clone(),
                revision.clone(),
                filename.clone(),
            )),
            Self::Local { dir, filename } => {
                Arc::new(LocalStore::new(dir.clone(), filename.clone()))
            }
        };

        Ok(store)
    }
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("app/models/model.safetensors")
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_bucket() -> String {
    "dg-storage-bucket".to_string()
}

fn default_object() -> String {
    "model.safetensors".to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_revision() -> String {
    "main".to_string()
}
