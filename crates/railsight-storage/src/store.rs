//! Artifact store trait and the local-directory implementation

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use railsight_core::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// A remote (or local) location holding one model artifact.
///
/// Implementations write the artifact's bytes to the path they are given.
/// Atomic placement and cleanup of partial files is handled by
/// [`crate::ArtifactFetcher`], so stores may write incrementally.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write the artifact to `dest`, returning the number of bytes written
    async fn download(&self, dest: &Path) -> Result<u64>;

    /// Location of the artifact, for logs (e.g. `gs://bucket/object`)
    fn location(&self) -> String;
}

/// Copies the artifact out of a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
    filename: String,
}

impl LocalStore {
    /// Create a store reading `filename` from `dir`
    pub fn new(dir: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            filename: filename.into(),
        }
    }

    fn source_path(&self) -> PathBuf {
        self.dir.join(&self.filename)
    }
}

#[async_trait]
impl ArtifactStore for LocalStore {
    async fn download(&self, dest: &Path) -> Result<u64> {
        let source = self.source_path();
        if !tokio::fs::try_exists(&source).await? {
            return Err(Error::artifact(format!(
                "Artifact not found: {}",
                source.display()
            )));
        }

        let bytes = tokio::fs::copy(&source, dest).await?;
        Ok(bytes)
    }

    fn location(&self) -> String {
        format!("file://{}", self.source_path().display())
    }
}

/// Drain a byte stream into a new file at `dest`
pub(crate) async fn write_stream<S, E>(stream: S, dest: &Path) -> Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut file = tokio::fs::File::create(dest).await?;
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::artifact(format!("Transfer interrupted: {}", e)))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

/// Map a transport error onto the core error type
pub(crate) fn transport_error(context: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::artifact(format!("{}: {}", context, err))
    }
}
