//! Railsight Storage
//!
//! Makes sure the model artifact exists on local disk before the model is
//! loaded. The artifact is downloaded at most once: if the destination file
//! is already present the fetcher returns without touching the network.
//!
//! Supported sources:
//! - Google Cloud Storage (JSON API media download, see [`gcs`])
//! - Hugging Face Hub (via `hf-hub`)
//! - A local directory (air-gapped deployments and tests)

pub mod config;
pub mod credentials;
pub mod fetcher;
pub mod gcs;
pub mod huggingface;
pub mod store;

pub use config::{ArtifactConfig, SourceConfig};
pub use credentials::{CredentialsConfig, TokenProvider};
pub use fetcher::{ArtifactFetcher, FetchOutcome};
pub use gcs::GcsStore;
pub use huggingface::HuggingFaceStore;
pub use store::{ArtifactStore, LocalStore};
