//! Google Cloud Storage media downloads

use crate::credentials::TokenProvider;
use crate::store::{transport_error, write_stream, ArtifactStore};
use async_trait::async_trait;
use railsight_core::{Error, Result};
use std::path::Path;
use url::Url;

/// Default JSON API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// One object in a Cloud Storage bucket
pub struct GcsStore {
    client: reqwest::Client,
    endpoint: Url,
    bucket: String,
    object: String,
    tokens: TokenProvider,
}

impl GcsStore {
    /// Create a store for `gs://{bucket}/{object}` served from `endpoint`
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        bucket: impl Into<String>,
        object: impl Into<String>,
        tokens: TokenProvider,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::config(format!("Invalid storage endpoint '{}': {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::config(format!(
                "Invalid storage endpoint '{}'",
                endpoint
            )));
        }

        Ok(Self {
            client,
            endpoint,
            bucket: bucket.into(),
            object: object.into(),
            tokens,
        })
    }

    /// `{endpoint}/storage/v1/b/{bucket}/o/{object}?alt=media`, with the
    /// object name percent-encoded as a single path segment
    pub fn media_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "storage",
                "v1",
                "b",
                self.bucket.as_str(),
                "o",
                self.object.as_str(),
            ]);
        }
        url.query_pairs_mut().append_pair("alt", "media");
        url
    }
}

#[async_trait]
impl ArtifactStore for GcsStore {
    async fn download(&self, dest: &Path) -> Result<u64> {
        let mut request = self.client.get(self.media_url());
        if let Some(token) = self.tokens.token().await? {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(&format!("GET {}", self.location()), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::artifact(format!(
                "GET {} returned {}: {}",
                self.location(),
                status,
                body.trim()
            )));
        }

        write_stream(response.bytes_stream(), dest).await
    }

    fn location(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.object)
    }
}
