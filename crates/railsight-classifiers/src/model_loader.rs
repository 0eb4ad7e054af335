//! Model loading from a weights artifact

use crate::classifier::ImageClassifier;
use crate::model_config::{ModelConfig, WeightsFormat};
use crate::resnet::ResNetClassifier;
use candle_core::DType;
use candle_nn::VarBuilder;
use railsight_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Load a classifier from `path`.
///
/// `path` is either the weights file itself or a model directory, in which
/// case the weights file is discovered inside it.
pub fn load_classifier(config: &ModelConfig, path: &Path) -> Result<Arc<dyn ImageClassifier>> {
    let start = Instant::now();
    config.validate()?;

    let weights_path = resolve_weights(path)?;
    let device = config.device.create()?;
    let format = config.weights_format(&weights_path);

    tracing::info!(
        "Loading {} model '{}' from {} ({:?})",
        config.architecture,
        config.name,
        weights_path.display(),
        format
    );

    let var_builder = match format {
        WeightsFormat::SafeTensors => {
            // The file is not modified while mapped: artifacts are written
            // once and renamed into place before loading
            unsafe {
                VarBuilder::from_mmaped_safetensors(&[&weights_path], DType::F32, &device)
                    .map_err(|e| Error::model(format!("Failed to load SafeTensors: {}", e)))?
            }
        }
        WeightsFormat::PyTorch => VarBuilder::from_pth(&weights_path, DType::F32, &device)
            .map_err(|e| Error::model(format!("Failed to load PyTorch weights: {}", e)))?,
    };

    let classifier = ResNetClassifier::from_var_builder(config, var_builder, device)?
        .with_weights_path(&weights_path);

    tracing::info!(
        "Loaded model '{}' with {} labels in {:.2?}",
        config.name,
        config.labels.len(),
        start.elapsed()
    );

    Ok(Arc::new(classifier))
}

fn resolve_weights(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    if path.is_dir() {
        let mut candidates = discover_weights(path)?;
        candidates.sort();
        return candidates.into_iter().next().ok_or_else(|| {
            Error::model(format!("No weights file found in {}", path.display()))
        });
    }

    Err(Error::model(format!(
        "Model file not found: {}",
        path.display()
    )))
}

/// Find weight files (SafeTensors or PyTorch) in a directory
pub fn discover_weights(models_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut model_paths = Vec::new();

    let entries = std::fs::read_dir(models_dir.as_ref())
        .map_err(|e| Error::config(format!("Failed to read models directory: {}", e)))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| Error::config(format!("Failed to read directory entry: {}", e)))?;
        let path = entry.path();

        if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
            if ext == "safetensors" || ext == "pt" || ext == "pth" || ext == "bin" {
                model_paths.push(path);
            }
        }
    }

    Ok(model_paths)
}
