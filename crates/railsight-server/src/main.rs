//! Railsight
//!
//! Classifies train photos uploaded over HTTP with a pre-trained model that
//! is fetched from object storage on first start.

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use railsight_classifiers::ImageClassifier;
use railsight_server::cli::{Cli, Commands};
use railsight_server::startup::load_model;
use railsight_server::{run_server, RailsightConfig};
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let mut config = RailsightConfig::load(&cli.config)?;

    match cli.command {
        Commands::Serve {
            address,
            port,
            fail_fast,
        } => {
            config.apply_overrides(address, port);
            let addr = config.server.socket_addr()?;

            let metrics_handle = init_metrics()?;

            info!("Starting Railsight");
            info!("Model: {} ({})", config.model.name, config.model.architecture);
            info!("Artifact: {}", config.artifact.path.display());

            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;

            run_server(
                config,
                listener,
                Some(metrics_handle),
                fail_fast,
                shutdown_signal(),
            )
            .await?;
        }

        Commands::Load => {
            let classifier = load_model(&config).await?;
            let info = classifier.info();
            println!(
                "Loaded {} model '{}' with labels: {}",
                info.architecture,
                info.name,
                info.labels.join(", ")
            );
        }

        Commands::Predict { image } => {
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("Failed to read {}", image.display()))?;

            let classifier = load_model(&config).await?;
            let prediction =
                tokio::task::spawn_blocking(move || classifier.classify_bytes(&bytes)).await??;

            println!("{}", prediction.summary());
            for score in prediction.top_k(prediction.scores.len()) {
                println!("  {:<24} {:.4}", score.label, score.probability);
            }
        }
    }

    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("railsight=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("railsight=info,tower_http=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "railsight_requests_total",
        "Total number of classification requests"
    );
    metrics::describe_counter!(
        "railsight_predictions_total",
        "Total number of predictions by label"
    );
    metrics::describe_counter!("railsight_errors_total", "Total number of errors by kind");
    metrics::describe_histogram!(
        "railsight_inference_latency_us",
        metrics::Unit::Microseconds,
        "Inference latency in microseconds"
    );
    metrics::describe_counter!(
        "railsight_artifact_downloads_total",
        "Artifact downloads by outcome"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
