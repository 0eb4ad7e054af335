//! Error types for Railsight

/// Result type alias using Railsight's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Railsight operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Artifact retrieval errors (object store, transfer, local copy)
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Credential acquisition errors
    #[error("credentials error: {0}")]
    Credentials(String),

    /// Model loading and inference errors
    #[error("model error: {0}")]
    Model(String),

    /// Input image could not be decoded
    #[error("image error: {0}")]
    Image(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new artifact error
    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::Artifact(msg.into())
    }

    /// Create a new credentials error
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }

    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new image error
    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error was caused by the caller's input rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    /// Short machine-readable name of the variant, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Artifact(_) => "artifact",
            Self::Credentials(_) => "credentials",
            Self::Model(_) => "model",
            Self::Image(_) => "image",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Timeout => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}
