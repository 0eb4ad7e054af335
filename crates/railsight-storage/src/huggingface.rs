//! Hugging Face Hub downloads

use crate::store::ArtifactStore;
use async_trait::async_trait;
use hf_hub::{api::sync::Api, Repo, RepoType};
use railsight_core::{Error, Result};
use std::path::{Path, PathBuf};

/// One file in a Hugging Face model repository
#[derive(Debug, Clone)]
pub struct HuggingFaceStore {
    repo_id: String,
    revision: String,
    filename: String,
}

impl HuggingFaceStore {
    /// Create a store for `filename` in `repo_id` at `revision`
    pub fn new(
        repo_id: impl Into<String>,
        revision: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            repo_id: repo_id.into(),
            revision: revision.into(),
            filename: filename.into(),
        }
    }

    /// Fetch into the hf-hub cache and return the cached path
    fn fetch_cached(&self) -> Result<PathBuf> {
        let api = Api::new().map_err(|e| {
            Error::artifact(format!("Failed to initialize HuggingFace API: {}", e))
        })?;

        let repo = api.repo(Repo::with_revision(
            self.repo_id.clone(),
            RepoType::Model,
            self.revision.clone(),
        ));

        repo.get(&self.filename).map_err(|e| {
            Error::artifact(format!(
                "Failed to download {} from HuggingFace: {}",
                self.location(),
                e
            ))
        })
    }
}

#[async_trait]
impl ArtifactStore for HuggingFaceStore {
    async fn download(&self, dest: &Path) -> Result<u64> {
        tracing::info!("Downloading model from HuggingFace: {}", self.location());

        // hf-hub's sync client blocks on network I/O
        let store = self.clone();
        let cached = tokio::task::spawn_blocking(move || store.fetch_cached())
            .await
            .map_err(|e| Error::internal(format!("HuggingFace download task failed: {}", e)))??;

        tracing::debug!("Copying {} into place", cached.display());
        let bytes = tokio::fs::copy(&cached, dest).await?;
        Ok(bytes)
    }

    fn location(&self) -> String {
        format!("hf://{}@{}/{}", self.repo_id, self.revision, self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location() {
        let store = HuggingFaceStore::new("railsight/resnet34-trains", "main", "model.safetensors");
        assert_eq!(
            store.location(),
            "hf://railsight/resnet34-trains@main/model.safetensors"
        );
    }
}
