//! Upload mode: named in-memory buffers in, processed buffers (or failure
//! reasons) out. Nothing touches the filesystem.
use serde::Serialize;
use tracing::{info, warn};

use crate::api::batch::{BatchJob, BatchResult, BatchRunner, BatchSink, JobTarget, Progress};
use crate::detect::{EngineError, LandmarkProvider};
use crate::error::{Error, Result};
use crate::io::reader::{ImageSource, is_accepted_extension};
use crate::types::{OutputFormat, ProcessingOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    /// Declared extension, e.g. `"jpg"`
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, extension: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedUpload {
    /// `processed_<original name>`
    pub file_name: String,
    pub media_type: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResponse {
    pub name: String,
    pub result: std::result::Result<ProcessedUpload, String>,
}

/// Per-upload responses in input order. `batch` covers only uploads with an
/// accepted extension; rejected ones carry their reason in `responses`.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub responses: Vec<UploadResponse>,
    pub batch: BatchResult,
}

pub fn processed_name(original: &str) -> String {
    format!("processed_{}", original)
}

struct UploadSink<'a> {
    uploads: &'a [Upload],
    /// Upload index of each job
    indices: Vec<usize>,
    responses: Vec<Option<UploadResponse>>,
    progress: &'a mut dyn FnMut(&Progress),
}

impl BatchSink for UploadSink<'_> {
    fn finished(
        &mut self,
        index: usize,
        job: &BatchJob,
        outcome: &ProcessingOutcome,
        output: Option<Vec<u8>>,
    ) {
        let index = self.indices[index];
        let upload = &self.uploads[index];
        let result = match (outcome.is_success(), output, &job.target) {
            (true, Some(bytes), JobTarget::Memory(format)) => Ok(ProcessedUpload {
                file_name: processed_name(&upload.name),
                media_type: format.media_type(),
                bytes,
            }),
            _ => Err(outcome.to_string()),
        };
        self.responses[index] = Some(UploadResponse {
            name: upload.name.clone(),
            result,
        });
    }

    fn progress(&mut self, progress: &Progress) {
        (self.progress)(progress)
    }
}

/// Redact a set of uploads. An empty set is rejected before any engine is acquired.
pub fn process_uploads<P, F>(
    runner: &BatchRunner,
    uploads: &[Upload],
    factory: F,
    progress: &mut dyn FnMut(&Progress),
) -> Result<UploadReport>
where
    P: LandmarkProvider,
    F: Fn() -> std::result::Result<P, EngineError> + Sync,
{
    if uploads.is_empty() {
        return Err(Error::NoInput);
    }
    let mut responses: Vec<Option<UploadResponse>> = vec![None; uploads.len()];
    let mut indices = Vec::new();
    let mut jobs = Vec::new();
    for (index, upload) in uploads.iter().enumerate() {
        let format = is_accepted_extension(&upload.extension)
            .then(|| OutputFormat::from_extension(&upload.extension))
            .flatten();
        let Some(format) = format else {
            warn!("{}: unsupported file type {:?}", upload.name, upload.extension);
            responses[index] = Some(UploadResponse {
                name: upload.name.clone(),
                result: Err(format!("unsupported file type: {:?}", upload.extension)),
            });
            continue;
        };
        indices.push(index);
        jobs.push(BatchJob {
            source: ImageSource::Memory {
                name: upload.name.clone(),
                bytes: upload.bytes.clone(),
            },
            target: JobTarget::Memory(format),
        });
    }
    info!(
        "Upload mode: {} file(s), {} rejected",
        uploads.len(),
        uploads.len() - jobs.len()
    );

    let mut sink = UploadSink {
        uploads,
        indices,
        responses,
        progress,
    };
    let batch = runner.run(&jobs, factory, &mut sink);
    let responses = sink
        .responses
        .into_iter()
        .zip(uploads)
        .map(|(response, upload)| {
            response.unwrap_or_else(|| UploadResponse {
                name: upload.name.clone(),
                result: Err("not processed".to_string()),
            })
        })
        .collect();
    Ok(UploadReport { responses, batch })
}
