//! Error types for the cf-app service layer.

use cf_space::StatusCode;

use crate::config::ConfigError;

/// Startup and runtime errors of the server.
///
/// Per-request failures never show up here; they travel back to the client
/// as status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Binding failed: {0}")]
    Bind(#[from] cf_bind::BindError),

    #[error("Model error: {0}")]
    Model(#[from] cf_model::ModelError),

    #[error("Failed to create folder '{name}': {status}")]
    Folder { name: String, status: StatusCode },

    #[error("Failed to register the model tick: {0}")]
    Schedule(StatusCode),

    #[error("Failed to open endpoint on {addr}")]
    Endpoint {
        addr: String,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cf-app operations.
pub type AppResult<T> = Result<T, AppError>;
