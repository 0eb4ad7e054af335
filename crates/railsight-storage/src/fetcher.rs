//! Idempotent artifact retrieval

use crate::config::ArtifactConfig;
use crate::store::ArtifactStore;
use railsight_core::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What [`ArtifactFetcher::ensure`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The destination already existed; nothing was downloaded
    AlreadyPresent,

    /// The artifact was downloaded
    Downloaded { bytes: u64 },
}

/// Store given directly, or built from configuration on first download
enum StoreSource {
    Built(Arc<dyn ArtifactStore>),
    Configured(ArtifactConfig),
}

/// Ensures the artifact exists at a local destination
pub struct ArtifactFetcher {
    source: StoreSource,
    destination: PathBuf,
}

impl ArtifactFetcher {
    /// Create a fetcher placing the artifact from `store` at `destination`
    pub fn new(store: Arc<dyn ArtifactStore>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: StoreSource::Built(store),
            destination: destination.into(),
        }
    }

    /// Create a fetcher from configuration.
    ///
    /// The HTTP client, credentials and store are only resolved when a
    /// download is actually needed.
    pub fn from_config(config: &ArtifactConfig) -> Self {
        Self {
            source: StoreSource::Configured(config.clone()),
            destination: config.path.clone(),
        }
    }

    fn store(&self) -> Result<Arc<dyn ArtifactStore>> {
        match &self.source {
            StoreSource::Built(store) => Ok(Arc::clone(store)),
            StoreSource::Configured(config) => config.source.build_store(config.http_client()?),
        }
    }

    /// Local path of the artifact
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Download the artifact unless the destination already exists.
    ///
    /// Presence is sufficient: the existing file is not checked for
    /// integrity or freshness. Downloads land in a `.part` sibling first and
    /// are renamed into place only on success.
    pub async fn ensure(&self) -> Result<FetchOutcome> {
        if tokio::fs::try_exists(&self.destination).await? {
            debug!("Artifact already present at {}", self.destination.display());
            return Ok(FetchOutcome::AlreadyPresent);
        }

        let store = self.store()?;

        if let Some(parent) = self.destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let location = store.location();
        info!(
            "Downloading artifact {} to {}",
            location,
            self.destination.display()
        );

        let partial = self.partial_path();
        let start = Instant::now();

        let bytes = match store.download(&partial).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Download of {} failed: {}", location, e);
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove {}: {}", partial.display(), cleanup);
                    }
                }
                metrics::counter!("railsight_artifact_downloads_total", "outcome" => "failure")
                    .increment(1);
                return Err(e);
            }
        };

        tokio::fs::rename(&partial, &self.destination).await?;
        metrics::counter!("railsight_artifact_downloads_total", "outcome" => "success")
            .increment(1);

        info!(
            "Downloaded {} bytes from {} in {:.2?}",
            bytes,
            location,
            start.elapsed()
        );

        Ok(FetchOutcome::Downloaded { bytes })
    }

    fn partial_path(&self) -> PathBuf {
        let mut name = self
            .destination
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "artifact".into());
        name.push(".part");
        self.destination.with_file_name(name)
    }
}
