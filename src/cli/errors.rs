use std::path::PathBuf;

use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Output already exists: {path:?} (use --force to overwrite)")]
    OutputExists { path: PathBuf },

    #[error("Input not found: {path:?}")]
    InputNotFound { path: PathBuf },

    #[error("Invalid pattern: {pattern}")]
    InvalidPattern { pattern: String },

    #[error("Processing failed: {message}")]
    ProcessingFailed { message: String },

    #[error("Batch finished with {errors} failed image(s)")]
    BatchFailed { errors: usize },

    #[error("Landmark engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Lib(#[from] mosaicpro::Error),
}
