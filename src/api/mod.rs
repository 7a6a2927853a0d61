//! High-level, ergonomic library API: redact a single file, drive batches over
//! files, folders, or in-memory uploads. Prefer these entrypoints over the
//! low-level processing modules when integrating MOSAICPRO.
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::config::Config;
use crate::core::processing::pipeline::RedactionPipeline;
use crate::detect::{
    EngineError, EngineLifecycle, EngineOptions, EngineStatus, LandmarkProvider, SidecarProvider,
};
use crate::error::{Error, Result};
use crate::io::reader::ImageSource;
use crate::types::ProcessingOutcome;

pub mod batch;
pub mod folder;
pub mod upload;

pub use batch::{
    BatchItem, BatchJob, BatchResult, BatchRunner, BatchSink, JobTarget, OutputNames, Progress,
    ProgressFn,
};
pub use folder::{FolderLayout, run_folder};
pub use upload::{ProcessedUpload, Upload, UploadReport, UploadResponse, process_uploads};

/// Options handed to providers, derived from the detection settings.
pub fn engine_options(config: &Config) -> EngineOptions {
    EngineOptions {
        model_complexity: config.detection.model_complexity,
        min_confidence: config.detection.confidence,
    }
}

/// Factory for the bundled sidecar provider, usable by every batch worker.
pub fn sidecar_factory(
    pose_dir: Option<PathBuf>,
    config: &Config,
) -> impl Fn() -> std::result::Result<SidecarProvider, EngineError> + Sync + use<> {
    let options = engine_options(config);
    move || SidecarProvider::open(pose_dir.as_deref(), options)
}

/// Redact one file to `output`.
///
/// Returns `Err(Error::EngineUnavailable)` when the landmark engine cannot be
/// acquired, so callers can tell a broken session from an image without a subject.
/// Every other failure is reported through the returned outcome.
pub fn redact_file<P, F>(
    input: &Path,
    output: &Path,
    config: &Config,
    factory: F,
) -> Result<ProcessingOutcome>
where
    P: LandmarkProvider,
    F: FnOnce() -> std::result::Result<P, EngineError>,
{
    let engine = EngineLifecycle::acquire(factory);
    if let EngineStatus::Unavailable(reason) = engine.status() {
        return Err(Error::EngineUnavailable(reason.clone()));
    }
    let mut pipeline = RedactionPipeline::new(engine, config.clone());
    let outcome = pipeline.process(&ImageSource::File(input.to_path_buf()), output);
    pipeline.cleanup();
    info!("{:?}: {}", input, outcome);
    Ok(outcome)
}
