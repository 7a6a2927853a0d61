//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Session-level failures (I/O, configuration, engine acquisition) live in [`Error`];
//! per-image stage failures live in [`RedactError`] and are folded into a
//! [`crate::ProcessingOutcome`] at the pipeline boundary.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Landmark engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("No input: nothing to process")]
    NoInput,

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn external<E: std::fmt::Display>(e: E) -> Self {
        Error::External(e.to_string())
    }
}

/// Failure of a single image at one of the pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedactError {
    #[error("failed to read image: {0}")]
    Read(String),

    #[error("detection failed: {0}")]
    DetectionFailed(String),

    #[error("failed to write image: {0}")]
    Write(String),
}
