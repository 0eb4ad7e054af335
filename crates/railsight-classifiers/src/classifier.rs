//! Classifier trait and model description

use crate::preprocessing::decode_image;
use image::DynamicImage;
use railsight_core::{Prediction, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Trait for all image classifiers.
///
/// Implementations are immutable after construction so one instance can
/// serve any number of concurrent callers. `classify` is CPU-bound; async
/// callers should run it on a blocking thread.
pub trait ImageClassifier: Send + Sync {
    /// Classify a decoded image
    fn classify(&self, image: &DynamicImage) -> Result<Prediction>;

    /// Decode `bytes` (any supported image format) and classify the result
    fn classify_bytes(&self, bytes: &[u8]) -> Result<Prediction> {
        let image = decode_image(bytes)?;
        self.classify(&image)
    }

    /// Description of the loaded model
    fn info(&self) -> &ModelInfo;

    /// Labels in output order
    fn labels(&self) -> &[String] {
        &self.info().labels
    }
}

/// Description of a loaded model, as reported by the readiness endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    /// Model name
    pub name: String,

    /// Network architecture
    pub architecture: String,

    /// Labels in output order
    pub labels: Vec<String>,

    /// Square input size in pixels
    pub image_size: u32,

    /// Device inference runs on
    pub device: String,

    /// Weights file the model was loaded from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights_path: Option<PathBuf>,
}
