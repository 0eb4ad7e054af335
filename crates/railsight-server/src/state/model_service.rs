//! Ownership and readiness of the predictor

use parking_lot::RwLock;
use railsight_classifiers::ImageClassifier;
use std::fmt;
use std::sync::Arc;

/// Lifecycle of the predictor
#[derive(Clone)]
pub enum ServiceStatus {
    /// Initialization has not finished
    Loading,

    /// The predictor is loaded and serving
    Ready(Arc<dyn ImageClassifier>),

    /// Initialization failed; the reason is reported to callers
    Failed(String),
}

impl ServiceStatus {
    /// Short name, as reported by `/ready`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Debug for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str("Loading"),
            Self::Ready(classifier) => f
                .debug_tuple("Ready")
                .field(&classifier.info().name)
                .finish(),
            Self::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
        }
    }
}

/// Why the predictor cannot be used
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Unavailable {
    #[error("model is still loading")]
    Loading,

    #[error("model failed to load: {0}")]
    Failed(String),
}

/// Holds the single predictor for the process.
///
/// Starts in [`ServiceStatus::Loading`]; the startup phase publishes either
/// the loaded predictor or the failure reason exactly once.
pub struct ModelService {
    status: RwLock<ServiceStatus>,
}

impl ModelService {
    pub fn new() -> Self {
        Self {
            status: RwLock::new(ServiceStatus::Loading),
        }
    }

    /// A service that is ready from the start
    pub fn with_classifier(classifier: Arc<dyn ImageClassifier>) -> Self {
        Self {
            status: RwLock::new(ServiceStatus::Ready(classifier)),
        }
    }

    /// Make `classifier` available to request handlers
    pub fn publish(&self, classifier: Arc<dyn ImageClassifier>) {
        *self.status.write() = ServiceStatus::Ready(classifier);
    }

    /// Record that initialization failed
    pub fn fail(&self, reason: impl Into<String>) {
        *self.status.write() = ServiceStatus::Failed(reason.into());
    }

    /// Snapshot of the current status
    pub fn status(&self) -> ServiceStatus {
        self.status.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.status.read(), ServiceStatus::Ready(_))
    }

    /// The predictor, if it is ready
    pub fn classifier(&self) -> Result<Arc<dyn ImageClassifier>, Unavailable> {
        match &*self.status.read() {
            ServiceStatus::Ready(classifier) => Ok(Arc::clone(classifier)),
            ServiceStatus::Loading => Err(Unavailable::Loading),
            ServiceStatus::Failed(reason) => Err(Unavailable::Failed(reason.clone())),
        }
    }
}

impl Default for ModelService {
    fn default() -> Self {
        Self::new()
    }
}
