//! Model configuration

use candle_core::Device;
use candle_nn::{Func, VarBuilder};
use candle_transformers::models::resnet;
use railsight_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Configuration for the served model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name
    #[serde(default = "default_name")]
    pub name: String,

    /// Network architecture the weights belong to
    #[serde(default)]
    pub architecture: Architecture,

    /// Class labels, in the order of the network's outputs
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,

    /// Square input size images are resized to
    #[serde(default = "default_image_size")]
    pub image_size: u32,

    /// Device to run on
    #[serde(default)]
    pub device: DeviceSpec,

    /// Weights format; detected from the file extension when unset
    #[serde(default)]
    pub format: Option<WeightsFormat>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            architecture: Architecture::default(),
            labels: default_labels(),
            image_size: default_image_size(),
            device: DeviceSpec::default(),
            format: None,
        }
    }
}

impl ModelConfig {
    /// Check invariants that do not depend on the weights file
    pub fn validate(&self) -> Result<()> {
        if self.labels.len() < 2 {
            return Err(Error::config(format!(
                "model '{}' needs at least two labels, got {}",
                self.name,
                self.labels.len()
            )));
        }
        if self.image_size < 32 {
            return Err(Error::config(format!(
                "image_size must be at least 32 pixels, got {}",
                self.image_size
            )));
        }
        Ok(())
    }

    /// Weights format for `path`, honouring an explicit setting
    pub fn weights_format(&self, path: &Path) -> WeightsFormat {
        self.format.unwrap_or_else(|| WeightsFormat::detect(path))
    }
}

fn default_name() -> String {
    "trains".to_string()
}

fn default_labels() -> Vec<String> {
    vec!["amtrak train".to_string(), "british train".to_string()]
}

fn default_image_size() -> u32 {
    224
}

/// Supported network architectures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Resnet18,
    #[default]
    Resnet34,
    Resnet50,
}

impl Architecture {
    /// Build the network with a `num_classes`-way head, reading weights from `vb`
    pub fn build(self, num_classes: usize, vb: VarBuilder<'static>) -> candle_core::Result<Func<'static>> {
        match self {
            Self::Resnet18 => resnet::resnet18(num_classes, vb),
            Self::Resnet34 => resnet::resnet34(num_classes, vb),
            Self::Resnet50 => resnet::resnet50(num_classes, vb),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resnet18 => "resnet18",
            Self::Resnet34 => "resnet34",
            Self::Resnet50 => "resnet50",
        };
        f.write_str(name)
    }
}

/// Device for inference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSpec {
    /// CPU inference (always available)
    #[default]
    Cpu,
    /// CUDA GPU 0
    Cuda,
    /// Metal (Apple Silicon)
    Metal,
}

impl DeviceSpec {
    /// Create the Candle device
    pub fn create(self) -> Result<Device> {
        match self {
            Self::Cpu => Ok(Device::Cpu),
            Self::Cuda => Device::new_cuda(0)
                .map_err(|e| Error::config(format!("Failed to create CUDA device: {}", e))),
            Self::Metal => Device::new_metal(0)
                .map_err(|e| Error::config(format!("Failed to create Metal device: {}", e))),
        }
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
            Self::Metal => "metal",
        };
        f.write_str(name)
    }
}

/// Model file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightsFormat {
    /// SafeTensors format (recommended)
    SafeTensors,
    /// PyTorch format
    PyTorch,
}

impl WeightsFormat {
    /// Guess the format from the file extension
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("pt" | "pth" | "bin") => Self::PyTorch,
            _ => Self::SafeTensors,
        }
    }
}
