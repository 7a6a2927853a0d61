//! Folder mode: `input/` is drained into `output/` (successes) and `error/` (failures).
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::api::batch::{
    BatchJob, BatchResult, BatchRunner, BatchSink, JobTarget, OutputNames, Progress,
};
use crate::detect::{EngineError, LandmarkProvider};
use crate::error::Result;
use crate::io::reader::{ImageSource, is_accepted_image};
use crate::types::ProcessingOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLayout {
    pub input: PathBuf,
    pub output: PathBuf,
    pub error: PathBuf,
}

impl FolderLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            input: root.join("input"),
            output: root.join("output"),
            error: root.join("error"),
        }
    }

    /// Create the three directories if absent.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.input, &self.output, &self.error] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Accepted images directly inside `input/`, sorted by name.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.input)? {
            let path = entry?.path();
            if path.is_file() && is_accepted_image(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Destination in `error/`; a timestamp suffix avoids clobbering an earlier failure.
    pub fn error_path(&self, input: &Path) -> PathBuf {
        let file_name = input.file_name().map(PathBuf::from).unwrap_or_default();
        let candidate = self.error.join(&file_name);
        if !candidate.exists() {
            return candidate;
        }
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S%3f");
        let name = match input.extension() {
            Some(ext) => format!("{}_{}.{}", stem, stamp, ext.to_string_lossy()),
            None => format!("{}_{}", stem, stamp),
        };
        self.error.join(name)
    }
}

/// Move a file, falling back to copy + delete across filesystems.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

struct FolderSink<'a> {
    layout: &'a FolderLayout,
    progress: &'a mut dyn FnMut(&Progress),
}

impl BatchSink for FolderSink<'_> {
    fn finished(
        &mut self,
        _index: usize,
        job: &BatchJob,
        outcome: &ProcessingOutcome,
        _output: Option<Vec<u8>>,
    ) {
        let ImageSource::File(input) = &job.source else {
            return;
        };
        if outcome.is_success() {
            if let Err(e) = fs::remove_file(input) {
                warn!("Processed {:?} but could not remove it from input: {}", input, e);
            }
        } else {
            let target = self.layout.error_path(input);
            match move_file(input, &target) {
                Ok(()) => info!("Moved failed input {:?} -> {:?}", input, target),
                Err(e) => warn!("Could not move failed input {:?} to error/: {}", input, e),
            }
        }
    }

    fn progress(&mut self, progress: &Progress) {
        (self.progress)(progress)
    }
}

/// Process every image in `layout.input`. Successes land in `output/` and are
/// removed from `input/`; failures are moved to `error/`.
pub fn run_folder<P, F>(
    runner: &BatchRunner,
    layout: &FolderLayout,
    factory: F,
    progress: &mut dyn FnMut(&Progress),
) -> Result<BatchResult>
where
    P: LandmarkProvider,
    F: Fn() -> std::result::Result<P, EngineError> + Sync,
{
    layout.ensure()?;
    let format = runner.config().output.format;
    let mut names = OutputNames::new();
    let jobs: Vec<BatchJob> = layout
        .scan()?
        .into_iter()
        .map(|input| BatchJob {
            target: JobTarget::File(names.assign(&layout.output, &input, format)),
            source: ImageSource::File(input),
        })
        .collect();
    info!("Folder mode: {} image(s) in {:?}", jobs.len(), layout.input);

    let mut sink = FolderSink { layout, progress };
    Ok(runner.run(&jobs, factory, &mut sink))
}
