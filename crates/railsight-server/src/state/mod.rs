pub mod app_state;
pub mod model_service;

pub use app_state::AppState;
pub use model_service::{ModelService, ServiceStatus, Unavailable};
