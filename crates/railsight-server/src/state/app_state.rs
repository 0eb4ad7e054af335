use crate::config::ServerConfig;
use crate::state::ModelService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Owner of the predictor
    pub service: Arc<ModelService>,

    /// Prometheus handle for rendering `/metrics`; absent when no recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: ServerConfig, service: Arc<ModelService>) -> Self {
        Self {
            config: Arc::new(config),
            service,
            metrics: None,
        }
    }

    /// Expose metrics rendered by `handle`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
