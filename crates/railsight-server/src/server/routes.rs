//! HTTP handlers

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::server::static_files::FALLBACK_HTML;
use crate::state::{AppState, ServiceStatus, Unavailable};

/// Multipart field carrying the uploaded image
pub const FILE_FIELD: &str = "file";

// ============================================================================
// Pages
// ============================================================================

/// Index page, read from the view directory on each request
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let path = state.config.index_path();
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html),
        Err(e) => {
            debug!("Serving built-in index page ({}: {})", path.display(), e);
            Html(FALLBACK_HTML.to_string())
        }
    }
}

// ============================================================================
// Inference
// ============================================================================

/// Response body of `/analyze`
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub result: String,
}

/// Classify the image uploaded in the `file` field
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    metrics::counter!("railsight_requests_total", "route" => "analyze").increment(1);

    let classifier = state.service.classifier()?;
    let mut multipart = multipart.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let bytes = read_file_field(&mut multipart).await?;
    debug!("Received upload of {} bytes", bytes.len());

    let prediction = tokio::task::spawn_blocking(move || classifier.classify_bytes(&bytes))
        .await
        .map_err(|e| AppError::Internal(format!("Inference task failed: {}", e)))??;

    metrics::counter!("railsight_predictions_total", "label" => prediction.label.clone())
        .increment(1);
    metrics::histogram!("railsight_inference_latency_us").record(prediction.latency_us as f64);
    info!(
        "Classified upload as '{}' ({:.4}) in {}us",
        prediction.label, prediction.probability, prediction.latency_us
    );

    Ok(Json(AnalyzeResponse {
        result: prediction.summary(),
    }))
}

/// Find the `file` field and read it whole; other fields are skipped
async fn read_file_field(multipart: &mut Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            return Ok(field.bytes().await?);
        }
    }

    Err(AppError::InvalidRequest(format!(
        "missing multipart field '{}'",
        FILE_FIELD
    )))
}

// ============================================================================
// Health, readiness and metrics
// ============================================================================

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// 200 once the model is loaded, 503 while loading or after a failure
pub async fn ready(State(state): State<AppState>) -> Response {
    let status = state.service.status();
    let name = status.name();

    match status {
        ServiceStatus::Ready(classifier) => (
            StatusCode::OK,
            Json(json!({ "status": name, "model": classifier.info() })),
        )
            .into_response(),
        ServiceStatus::Loading => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": name })),
        )
            .into_response(),
        ServiceStatus::Failed(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": name, "error": reason })),
        )
            .into_response(),
    }
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors returned by the handlers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    InvalidImage(String),

    #[error(transparent)]
    Unavailable(#[from] Unavailable),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvalidImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request_error",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::InvalidImage(_) => "invalid_image",
            AppError::Unavailable(_) => "model_unavailable",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::InvalidRequest(err.body_text())
        }
    }
}

impl From<railsight_core::Error> for AppError {
    fn from(err: railsight_core::Error) -> Self {
        if err.is_client_error() {
            AppError::InvalidImage(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_type = self.error_type();
        metrics::counter!("railsight_errors_total", "kind" => error_type).increment(1);

        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Rejected request: {}", self);
        }

        let body = json!({
            "error": {
                "message": self.to_string(),
                "type": error_type,
            }
        });

        (status, Json(body)).into_response()
    }
}
