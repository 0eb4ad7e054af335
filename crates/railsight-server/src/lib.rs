//! Railsight Server
//!
//! Serves one image classifier over HTTP:
//!
//! - `GET /` upload page
//! - `POST /analyze` classify the multipart `file` field
//! - `GET /static/*` static assets
//! - `GET /health`, `GET /ready`, `GET /metrics` for deployment tooling
//!
//! The predictor is owned by a [`ModelService`] injected into every handler.
//! It is loaded once by [`startup::initialize`], which fetches the artifact
//! if needed, loads it and publishes the result.

pub mod cli;
pub mod config;
pub mod server;
pub mod startup;
pub mod state;

pub use config::{RailsightConfig, ServerConfig};
pub use server::{build_app, run_server};
pub use startup::initialize;
pub use state::{AppState, ModelService, ServiceStatus};
