//! Error types shared across Meltview crates.

use std::path::PathBuf;

/// Top-level error type for Meltview operations.
///
/// Out-of-range seeks have no variant: playback resolves them by clamping
/// and never reports them.
#[derive(Debug, thiserror::Error)]
pub enum MeltviewError {
    #[error("Failed to load {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("Shape mismatch: {message}")]
    ShapeMismatch { message: String },

    #[error("Sensor stream is empty; at least one reading is required for alignment")]
    EmptySensorStream,

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Display error: {message}")]
    Display { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using MeltviewError.
pub type MeltviewResult<T> = Result<T, MeltviewError>;

impl MeltviewError {
    pub fn load(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn display(msg: impl Into<String>) -> Self {
        Self::Display {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}
