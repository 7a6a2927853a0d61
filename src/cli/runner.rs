use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mosaicpro::api::{
    BatchJob, BatchRunner, FolderLayout, OutputNames, ProgressFn, redact_file, run_folder,
    sidecar_factory,
};
use mosaicpro::{BatchResult, Config, Error, Progress};

use super::args::{CliArgs, Command};
use super::errors::AppError;
use super::pattern::{Pattern, collect_matches};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn log_progress(progress: &Progress) {
    info!(
        "[{}/{}] {}: {}",
        progress.completed, progress.total, progress.id, progress.state
    );
}

fn process_single_file(
    input: &Path,
    output: &Path,
    mut config: Config,
    poses: Option<PathBuf>,
    mosaic_size: Option<u32>,
    force: bool,
) -> Result<(), AppError> {
    if !input.is_file() {
        return Err(AppError::InputNotFound {
            path: input.to_path_buf(),
        });
    }
    if output.exists() && !force {
        return Err(AppError::OutputExists {
            path: output.to_path_buf(),
        });
    }
    if let Some(size) = mosaic_size {
        if size == 0 {
            return Err(Error::InvalidArgument {
                arg: "--mosaic-size",
                value: size.to_string(),
            }
            .into());
        }
        config.mosaic.min_size = size;
    }
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    info!("Processing: {:?} -> {:?}", input, output);
    let factory = sidecar_factory(poses, &config);
    let outcome = match redact_file(input, output, &config, factory) {
        Ok(outcome) => outcome,
        Err(Error::EngineUnavailable(reason)) => return Err(AppError::EngineUnavailable(reason)),
        Err(e) => return Err(e.into()),
    };
    if !outcome.is_success() {
        return Err(AppError::ProcessingFailed {
            message: outcome.to_string(),
        });
    }
    info!("Successfully processed: {:?}", output);
    Ok(())
}

/// Directory under `output_dir` mirroring the input's place under `input_dir`.
fn mirrored_dir(input: &Path, input_dir: &Path, output_dir: &Path) -> PathBuf {
    let relative = input.strip_prefix(input_dir).unwrap_or(input);
    match relative.parent() {
        Some(parent) => output_dir.join(parent),
        None => output_dir.to_path_buf(),
    }
}

#[allow(clippy::too_many_arguments)]
fn process_batch(
    input_dir: &Path,
    output_dir: &Path,
    pattern: &str,
    recursive: bool,
    parallel: usize,
    force: bool,
    config: Config,
    poses: Option<PathBuf>,
) -> Result<(), AppError> {
    if !input_dir.is_dir() {
        return Err(AppError::InputNotFound {
            path: input_dir.to_path_buf(),
        });
    }
    if parallel == 0 {
        return Err(Error::InvalidArgument {
            arg: "--parallel",
            value: parallel.to_string(),
        }
        .into());
    }
    let pattern = Pattern::parse(pattern)?;
    fs::create_dir_all(output_dir)?;

    info!("Starting batch processing from directory: {:?}", input_dir);
    info!("Output directory: {:?}", output_dir);

    let format = config.output.format;
    let mut names = OutputNames::new();
    let mut skipped = 0;
    let mut jobs = Vec::new();
    for input in collect_matches(input_dir, &pattern, recursive)? {
        let output = names.assign(&mirrored_dir(&input, input_dir, output_dir), &input, format);
        if output.exists() && !force {
            info!("Skipping {:?}: output exists", input);
            skipped += 1;
            continue;
        }
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        jobs.push(BatchJob::to_file(input, output));
    }

    if jobs.is_empty() {
        info!("Nothing to process ({} skipped)", skipped);
        return Ok(());
    }

    let factory = sidecar_factory(poses, &config);
    let runner = BatchRunner::new(config).parallel(parallel);
    let result = runner.run(&jobs, factory, &mut ProgressFn(log_progress));
    summarize(&result, skipped)
}

fn summarize(result: &BatchResult, skipped: usize) -> Result<(), AppError> {
    for item in result
        .items
        .iter()
        .filter(|item| item.outcome.as_ref().is_some_and(|o| !o.is_success()))
    {
        warn!("Error processing {}: {}", item.id, item.message().unwrap_or("failed"));
    }
    info!("Batch processing complete!");
    info!("Processed: {}", result.success_count);
    info!("Skipped: {}", skipped);
    info!("Errors: {}", result.error_count);

    if let Some(reason) = result.engine_unavailable() {
        return Err(AppError::EngineUnavailable(reason.to_string()));
    }
    if result.error_count > 0 {
        return Err(AppError::BatchFailed {
            errors: result.error_count,
        });
    }
    Ok(())
}

fn process_folder(
    root: &Path,
    parallel: usize,
    config: Config,
    poses: Option<PathBuf>,
) -> Result<(), AppError> {
    let layout = FolderLayout::new(root);
    let factory = sidecar_factory(poses, &config);
    let runner = BatchRunner::new(config).parallel(parallel);
    let result = run_folder(&runner, &layout, factory, &mut |p: &Progress| log_progress(p))?;
    summarize(&result, 0)
}

/// Write the effective configuration (defaults merged with `--config`).
fn init_config(path: &Path, config: &Config, force: bool) -> Result<(), AppError> {
    if path.exists() && !force {
        return Err(AppError::OutputExists {
            path: path.to_path_buf(),
        });
    }
    config.write_to(path)?;
    info!("Wrote configuration to {:?}", path);
    Ok(())
}

fn print_info(
    config: &Config,
    config_path: Option<&Path>,
    poses: Option<&Path>,
) -> Result<(), AppError> {
    println!("mosaicpro {}", env!("CARGO_PKG_VERSION"));
    match config_path {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: built-in defaults"),
    }
    match poses {
        Some(dir) => println!("poses: {}", dir.display()),
        None => println!("poses: next to each image"),
    }
    println!("{}", config.to_json_pretty()?);
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.verbose);

    let config = Config::load_or_default(args.config.as_deref());

    match args.command {
        Command::Process {
            input,
            output,
            mosaic_size,
            force,
        } => process_single_file(&input, &output, config, args.poses, mosaic_size, force)?,
        Command::Batch {
            input_dir,
            output_dir,
            pattern,
            recursive,
            parallel,
            force,
        } => process_batch(
            &input_dir,
            &output_dir,
            &pattern,
            recursive,
            parallel,
            force,
            config,
            args.poses,
        )?,
        Command::Folder { root, parallel } => process_folder(&root, parallel, config, args.poses)?,
        Command::InitConfig { path, force } => init_config(&path, &config, force)?,
        Command::Info => print_info(&config, args.config.as_deref(), args.poses.as_deref())?,
    }

    Ok(())
}
