//! Railsight Classifiers
//!
//! Image classification on top of Candle.
//!
//! A classifier is built once from a weights artifact and a [`ModelConfig`]
//! (architecture, label set, input size, device), then shared read-only
//! between request handlers. Classification decodes the image, resizes and
//! normalizes it the way ImageNet-pretrained networks expect, runs a single
//! forward pass and returns the softmax distribution over the labels.

pub mod classifier;
pub mod model_config;
pub mod model_loader;
pub mod preprocessing;
pub mod resnet;

pub use classifier::{ImageClassifier, ModelInfo};
pub use model_config::{Architecture, DeviceSpec, ModelConfig, WeightsFormat};
pub use model_loader::{discover_weights, load_classifier};
pub use preprocessing::{decode_image, image_to_tensor};
pub use resnet::ResNetClassifier;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{ImageClassifier, ModelInfo};
    pub use crate::model_config::{Architecture, DeviceSpec, ModelConfig};
    pub use crate::model_loader::load_classifier;
    pub use railsight_core::Prediction;
}
