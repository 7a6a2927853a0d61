//! Batch driver: runs the redaction pipeline over an ordered list of jobs,
//! isolating per-item failures and reporting progress as items finish.
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::config::Config;
use crate::core::processing::pipeline::RedactionPipeline;
use crate::detect::{EngineError, EngineLifecycle, EngineStatus, LandmarkProvider};
use crate::io::reader::ImageSource;
use crate::types::{ItemState, OutputFormat, ProcessingOutcome};

/// Where a job's result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobTarget {
    File(PathBuf),
    Memory(OutputFormat),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub source: ImageSource,
    pub target: JobTarget,
}

impl BatchJob {
    pub fn to_file(input: PathBuf, output: PathBuf) -> Self {
        Self {
            source: ImageSource::File(input),
            target: JobTarget::File(output),
        }
    }
}

/// Hands out output paths for one batch so that no two jobs share a target.
///
/// `photo.jpg` normally becomes `photo.<ext>`. When a sibling such as `photo.png`
/// already claimed that name, the source extension is kept: `photo.png.<ext>`.
#[derive(Debug, Default)]
pub struct OutputNames {
    taken: HashSet<PathBuf>,
}

impl OutputNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
        let ext = format.extension();
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let file_name = input
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| stem.clone());

        let mut candidate = dir.join(format!("{}.{}", stem, ext));
        if self.taken.contains(&candidate) {
            candidate = dir.join(format!("{}.{}", file_name, ext));
        }
        let mut n = 1;
        while self.taken.contains(&candidate) {
            candidate = dir.join(format!("{}_{}.{}", file_name, n, ext));
            n += 1;
        }
        if candidate != dir.join(format!("{}.{}", stem, ext)) {
            debug!("{:?}: output name taken, using {:?}", input, candidate);
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

/// Status of one input. Created `Pending`, moves to `Processing`, then to a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub id: String,
    pub state: ItemState,
    pub outcome: Option<ProcessingOutcome>,
}

impl BatchItem {
    pub fn message(&self) -> Option<&str> {
        self.outcome.as_ref().and_then(|o| o.message.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Position of the item in the input list
    pub index: usize,
    /// Items finished so far, this one included
    pub completed: usize,
    pub total: usize,
    pub id: String,
    pub state: ItemState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub items: Vec<BatchItem>,
    pub success_count: usize,
    pub error_count: usize,
    pub engine: EngineStatus,
    pub cancelled: bool,
}

impl BatchResult {
    fn pending(jobs: &[BatchJob]) -> Self {
        Self {
            items: jobs
                .iter()
                .map(|job| BatchItem {
                    id: job.source.id(),
                    state: ItemState::Pending,
                    outcome: None,
                })
                .collect(),
            success_count: 0,
            error_count: 0,
            engine: EngineStatus::Ready,
            cancelled: false,
        }
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Reason the landmark engine could not be acquired, if it could not.
    pub fn engine_unavailable(&self) -> Option<&str> {
        match &self.engine {
            EngineStatus::Unavailable(reason) => Some(reason),
            EngineStatus::Ready => None,
        }
    }

    fn record(&mut self, index: usize, outcome: ProcessingOutcome) -> ItemState {
        let state = if outcome.is_success() {
            self.success_count += 1;
            ItemState::Success
        } else {
            self.error_count += 1;
            ItemState::Error
        };
        let item = &mut self.items[index];
        item.state = state;
        item.outcome = Some(outcome);
        state
    }
}

/// Receives per-item results on the thread that called [`BatchRunner::run`].
pub trait BatchSink {
    /// Called once per finished item, before its progress signal. `index` is the
    /// job's position in the input list.
    fn finished(
        &mut self,
        _index: usize,
        _job: &BatchJob,
        _outcome: &ProcessingOutcome,
        _output: Option<Vec<u8>>,
    ) {
    }

    fn progress(&mut self, _progress: &Progress) {}
}

/// Sink that forwards progress to a closure and drops everything else.
pub struct ProgressFn<F: FnMut(&Progress)>(pub F);

impl<F: FnMut(&Progress)> BatchSink for ProgressFn<F> {
    fn progress(&mut self, progress: &Progress) {
        (self.0)(progress)
    }
}

enum WorkerEvent {
    Engine(EngineStatus),
    Started(usize),
    Finished(usize, ProcessingOutcome, Option<Vec<u8>>),
}

pub struct BatchRunner {
    config: Config,
    parallel: usize,
    cancel: Arc<AtomicBool>,
}

impl BatchRunner {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            parallel: 1,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Number of workers; each owns its own landmark engine.
    pub fn parallel(mut self, workers: usize) -> Self {
        self.parallel = workers.max(1);
        self
    }

    /// Share a flag that stops the batch before the next item starts.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Run every job. Failures are recorded per item and never stop the batch.
    ///
    /// No engine is acquired when `jobs` is empty.
    pub fn run<P, F>(&self, jobs: &[BatchJob], factory: F, sink: &mut dyn BatchSink) -> BatchResult
    where
        P: LandmarkProvider,
        F: Fn() -> Result<P, EngineError> + Sync,
    {
        let mut result = BatchResult::pending(jobs);
        if jobs.is_empty() {
            return result;
        }
        let workers = self.parallel.min(jobs.len());
        info!("Batch of {} item(s) on {} worker(s)", jobs.len(), workers);

        if workers == 1 {
            self.run_sequential(jobs, &factory, sink, &mut result);
        } else {
            self.run_parallel(jobs, &factory, workers, sink, &mut result);
        }

        result.cancelled = result.items.iter().any(|item| !item.state.is_terminal());
        if result.cancelled {
            warn!("Batch cancelled before all items started");
        }
        info!(
            "Batch complete: {} succeeded, {} failed",
            result.success_count, result.error_count
        );
        result
    }

    fn run_sequential<P, F>(
        &self,
        jobs: &[BatchJob],
        factory: &F,
        sink: &mut dyn BatchSink,
        result: &mut BatchResult,
    ) where
        P: LandmarkProvider,
        F: Fn() -> Result<P, EngineError> + Sync,
    {
        let engine = EngineLifecycle::acquire(factory);
        result.engine = engine.status().clone();
        let mut pipeline = RedactionPipeline::new(engine, self.config.clone());
        let mut completed = 0;

        for (index, job) in jobs.iter().enumerate() {
            if self.cancelled() {
                break;
            }
            result.items[index].state = ItemState::Processing;
            let (outcome, output) = run_job(&mut pipeline, job);
            completed += 1;
            finish(result, sink, jobs, index, completed, outcome, output);
        }
        pipeline.cleanup();
    }

    fn run_parallel<P, F>(
        &self,
        jobs: &[BatchJob],
        factory: &F,
        workers: usize,
        sink: &mut dyn BatchSink,
        result: &mut BatchResult,
    ) where
        P: LandmarkProvider,
        F: Fn() -> Result<P, EngineError> + Sync,
    {
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<WorkerEvent>();

        std::thread::scope(|scope| {
            for worker in 0..workers {
                let tx = tx.clone();
                let next = &next;
                let config = self.config.clone();
                scope.spawn(move || {
                    let engine = EngineLifecycle::acquire(factory);
                    if tx.send(WorkerEvent::Engine(engine.status().clone())).is_err() {
                        return;
                    }
                    let mut pipeline = RedactionPipeline::new(engine, config);
                    loop {
                        if self.cancelled() {
                            break;
                        }
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(job) = jobs.get(index) else {
                            break;
                        };
                        if tx.send(WorkerEvent::Started(index)).is_err() {
                            break;
                        }
                        let (outcome, output) = run_job(&mut pipeline, job);
                        if tx.send(WorkerEvent::Finished(index, outcome, output)).is_err() {
                            break;
                        }
                    }
                    pipeline.cleanup();
                    debug!("Worker {} done", worker);
                });
            }
            drop(tx);

            let mut completed = 0;
            for event in rx {
                match event {
                    WorkerEvent::Engine(status @ EngineStatus::Unavailable(_)) => {
                        result.engine = status;
                    }
                    WorkerEvent::Engine(EngineStatus::Ready) => {}
                    WorkerEvent::Started(index) => {
                        result.items[index].state = ItemState::Processing;
                    }
                    WorkerEvent::Finished(index, outcome, output) => {
                        completed += 1;
                        finish(result, sink, jobs, index, completed, outcome, output);
                    }
                }
            }
        });
    }
}

fn run_job<P: LandmarkProvider>(
    pipeline: &mut RedactionPipeline<P>,
    job: &BatchJob,
) -> (ProcessingOutcome, Option<Vec<u8>>) {
    match &job.target {
        JobTarget::File(output) => (pipeline.process(&job.source, output), None),
        JobTarget::Memory(format) => match pipeline.redact_to_bytes(&job.source, *format) {
            Ok(bytes) => (ProcessingOutcome::success(), Some(bytes)),
            Err(e) => {
                warn!("{}: {}", job.source.id(), e);
                (ProcessingOutcome::from(e), None)
            }
        },
    }
}

fn finish(
    result: &mut BatchResult,
    sink: &mut dyn BatchSink,
    jobs: &[BatchJob],
    index: usize,
    completed: usize,
    outcome: ProcessingOutcome,
    output: Option<Vec<u8>>,
) {
    sink.finished(index, &jobs[index], &outcome, output);
    let state = result.record(index, outcome);
    sink.progress(&Progress {
        index,
        completed,
        total: jobs.len(),
        id: result.items[index].id.clone(),
        state,
    });
}
