//! Railsight Core
//!
//! Types shared across the Railsight crates.
//!
//! This crate provides:
//! - The error type and result alias used by the storage, classifier and
//!   server crates
//! - Prediction results produced by image classifiers

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ClassScore, Prediction};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{ClassScore, Prediction};
}
