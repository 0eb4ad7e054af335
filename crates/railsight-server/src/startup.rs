//! Initialization phase: fetch the artifact, load the model, publish it

use crate::config::RailsightConfig;
use crate::state::ModelService;
use railsight_classifiers::{load_classifier, ImageClassifier};
use railsight_core::{Error, Result};
use railsight_storage::{ArtifactFetcher, FetchOutcome};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Run the initialization phase and publish its outcome to `service`.
///
/// On success the loaded predictor is published as ready; on failure the
/// service records the reason and the error is returned.
pub async fn initialize(
    config: &RailsightConfig,
    service: &ModelService,
) -> Result<Arc<dyn ImageClassifier>> {
    let start = Instant::now();

    match load_model(config).await {
        Ok(classifier) => {
            service.publish(Arc::clone(&classifier));
            info!(
                "Model '{}' ready after {:.2?}",
                classifier.info().name,
                start.elapsed()
            );
            Ok(classifier)
        }
        Err(e) => {
            error!("Model initialization failed: {}", e);
            service.fail(e.to_string());
            Err(e)
        }
    }
}

/// Ensure the artifact is on disk and load the predictor from it
pub async fn load_model(config: &RailsightConfig) -> Result<Arc<dyn ImageClassifier>> {
    config.model.validate()?;

    let fetcher = ArtifactFetcher::from_config(&config.artifact);
    match fetcher.ensure().await? {
        FetchOutcome::AlreadyPresent => {
            info!("Using cached artifact {}", fetcher.destination().display())
        }
        FetchOutcome::Downloaded { bytes } => info!(
            "Fetched artifact to {} ({} bytes)",
            fetcher.destination().display(),
            bytes
        ),
    }

    let model_config = config.model.clone();
    let weights = fetcher.destination().to_path_buf();

    tokio::task::spawn_blocking(move || load_classifier(&model_config, &weights))
        .await
        .map_err(|e| Error::internal(format!("Model loading task failed: {}", e)))?
}
