//! Shared types and enums used across MOSAICPRO.
//! Includes `OutputFormat`, the per-image `ProcessingOutcome` (`OutcomeKind`),
//! and the batch item lifecycle (`ItemState`).
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::RedactError;

#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    /// Map a file extension (with or without the leading dot, any case) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.');
        if ext.eq_ignore_ascii_case("png") {
            Some(OutputFormat::Png)
        } else if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") {
            Some(OutputFormat::Jpeg)
        } else {
            None
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Png => write!(f, "png"),
            OutputFormat::Jpeg => write!(f, "jpeg"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum OutcomeKind {
    Success,
    DetectionFailed,
    ReadError,
    WriteError,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeKind::Success => write!(f, "Success"),
            OutcomeKind::DetectionFailed => write!(f, "DetectionFailed"),
            OutcomeKind::ReadError => write!(f, "ReadError"),
            OutcomeKind::WriteError => write!(f, "WriteError"),
        }
    }
}

/// Exactly one of these is produced per input image.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    pub kind: OutcomeKind,
    pub message: Option<String>,
}

impl ProcessingOutcome {
    pub fn success() -> Self {
        Self {
            kind: OutcomeKind::Success,
            message: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }

    pub fn from_result<T>(result: &Result<T, RedactError>) -> Self {
        match result {
            Ok(_) => Self::success(),
            Err(e) => Self::from(e.clone()),
        }
    }
}

impl From<RedactError> for ProcessingOutcome {
    fn from(err: RedactError) -> Self {
        let kind = match &err {
            RedactError::Read(_) => OutcomeKind::ReadError,
            RedactError::DetectionFailed(_) => OutcomeKind::DetectionFailed,
            RedactError::Write(_) => OutcomeKind::WriteError,
        };
        Self {
            kind,
            message: Some(err.to_string()),
        }
    }
}

impl std::fmt::Display for ProcessingOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {}", self.kind, msg),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Lifecycle of a batch item: Pending -> Processing -> Success | Error.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ItemState {
    Pending,
    Processing,
    Success,
    Error,
}

impl ItemState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemState::Success | ItemState::Error)
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemState::Pending => write!(f, "Pending"),
            ItemState::Processing => write!(f, "Processing"),
            ItemState::Success => write!(f, "Success"),
            ItemState::Error => write!(f, "Error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(OutputFormat::from_extension("PNG"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_extension(".JpEg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension("jpg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension("gif"), None);
    }

    #[test]
    fn redact_error_maps_to_outcome_kind() {
        let outcome = ProcessingOutcome::from(RedactError::DetectionFailed("no hips".into()));
        assert_eq!(outcome.kind, OutcomeKind::DetectionFailed);
        assert!(outcome.message.unwrap().contains("no hips"));

        let outcome = ProcessingOutcome::from(RedactError::Write("disk full".into()));
        assert_eq!(outcome.kind, OutcomeKind::WriteError);
    }
}
