//! ResNet image classifier

use crate::classifier::{ImageClassifier, ModelInfo};
use crate::model_config::ModelConfig;
use crate::preprocessing::image_to_tensor;
use candle_core::{Device, Module, D};
use candle_nn::{Func, VarBuilder};
use image::DynamicImage;
use railsight_core::{Error, Prediction, Result};
use std::time::Instant;

/// ResNet with a linear classification head over the configured labels
pub struct ResNetClassifier {
    model: Func<'static>,
    device: Device,
    info: ModelInfo,
}

impl ResNetClassifier {
    /// Build the network described by `config` from the weights in `vb`
    pub fn from_var_builder(config: &ModelConfig, vb: VarBuilder<'static>, device: Device) -> Result<Self> {
        config.validate()?;

        let model = config
            .architecture
            .build(config.labels.len(), vb)
            .map_err(|e| {
                Error::model(format!(
                    "Failed to build {} with {} labels: {}",
                    config.architecture,
                    config.labels.len(),
                    e
                ))
            })?;

        Ok(Self {
            model,
            device,
            info: ModelInfo {
                name: config.name.clone(),
                architecture: config.architecture.to_string(),
                labels: config.labels.clone(),
                image_size: config.image_size,
                device: config.device.to_string(),
                weights_path: None,
            },
        })
    }

    /// Record where the weights came from
    pub fn with_weights_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.info.weights_path = Some(path.into());
        self
    }

    /// Per-class probabilities for one image, in label order
    pub fn probabilities(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let input = image_to_tensor(image, self.info.image_size, &self.device)?;

        let logits = self
            .model
            .forward(&input)
            .map_err(|e| Error::model(format!("Model forward pass failed: {}", e)))?;

        candle_nn::ops::softmax(&logits, D::Minus1)
            .and_then(|probs| probs.squeeze(0))
            .and_then(|probs| probs.to_vec1::<f32>())
            .map_err(|e| Error::model(format!("Failed to read model output: {}", e)))
    }
}

impl ImageClassifier for ResNetClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Prediction> {
        let start = Instant::now();
        let probabilities = self.probabilities(image)?;
        let prediction = Prediction::from_probabilities(&self.info.labels, &probabilities)?;

        Ok(prediction.with_latency_us(start.elapsed().as_micros() as u64))
    }

    fn info(&self) -> &ModelInfo {
        &self.info
    }
}
