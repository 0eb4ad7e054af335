use crate::config::RailsightConfig;
use crate::server::routes;
use crate::startup::initialize;
use crate::state::{AppState, ModelService};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Build the Axum application
pub fn build_app(state: AppState) -> Router {
    // Any origin; only the headers the upload page sends
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
        ]);

    let static_files = ServeDir::new(&state.config.static_dir);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(routes::index))
        .route("/analyze", post(routes::analyze))
        .route("/health", get(routes::health))
        .route("/ready", get(routes::ready))
        .route("/metrics", get(routes::metrics))
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve on `listener` while the model initializes in the background.
///
/// `/health` and `/ready` answer immediately; `/analyze` returns 503 until
/// the model is published. With `fail_fast`, a failed initialization stops
/// the server and is returned as an error.
pub async fn run_server<F>(
    config: RailsightConfig,
    listener: TcpListener,
    metrics: Option<PrometheusHandle>,
    fail_fast: bool,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let service = Arc::new(ModelService::new());
    let mut state = AppState::new(config.server.clone(), Arc::clone(&service));
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }
    let app = build_app(state);

    let (failed_tx, failed_rx) = oneshot::channel::<String>();
    tokio::spawn(async move {
        if let Err(e) = initialize(&config, &service).await {
            if fail_fast {
                let _ = failed_tx.send(e.to_string());
            } else {
                warn!("Serving without a model; /analyze will answer 503");
            }
        }
    });

    let init_failure = Arc::new(Mutex::new(None::<String>));
    let failure_slot = Arc::clone(&init_failure);
    let graceful = async move {
        tokio::select! {
            _ = shutdown => warn!("Shutdown signal received, stopping server..."),
            Ok(reason) = failed_rx => {
                error!("Stopping server after failed initialization");
                *failure_slot.lock() = Some(reason);
            }
        }
    };

    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(graceful)
        .await?;

    if let Some(reason) = init_failure.lock().take() {
        anyhow::bail!("model initialization failed: {}", reason);
    }

    info!("Server shutdown complete");
    Ok(())
}
