#![doc = r#"
MOSAICPRO: compliance-grade mosaic redaction for still images.

This crate derives a region to obscure from body-landmark estimates, sizes the mosaic
block from the image's long side (`max(min_size, floor(long_side / 100))`), pixelates
the region, blends the seam, and reports one outcome per image. It powers the
MOSAICPRO CLI and can be embedded in your own Rust applications.

Landmark estimation is pluggable: implement [`LandmarkProvider`] for your pose
engine, or use the bundled [`SidecarProvider`], which reads `<stem>.pose.json`
estimates written by an external tool.

Add dependency
--------------
```toml
[dependencies]
mosaicpro = "0.1"
```

Quick start: redact one file
----------------------------
```rust,no_run
use std::path::Path;
use mosaicpro::{Config, redact_file, sidecar_factory};

fn main() -> mosaicpro::Result<()> {
    let config = Config::default();
    let outcome = redact_file(
        Path::new("/photos/cover.jpg"),
        Path::new("/out/cover.png"),
        &config,
        sidecar_factory(None, &config),
    )?;
    println!("{outcome}");
    Ok(())
}
```

Batch helpers
-------------
```rust,no_run
use std::path::Path;
use mosaicpro::{BatchRunner, Config, FolderLayout, run_folder, sidecar_factory};

fn main() -> mosaicpro::Result<()> {
    let config = Config::default();
    let factory = sidecar_factory(None, &config);
    let runner = BatchRunner::new(config).parallel(2);

    let report = run_folder(
        &runner,
        &FolderLayout::new(Path::new("/work")),
        factory,
        &mut |p| println!("{}/{} {} {}", p.completed, p.total, p.id, p.state),
    )?;

    println!("success={} errors={}", report.success_count, report.error_count);
    Ok(())
}
```

Error handling
--------------
Session-level functions return `mosaicpro::Result<T>`. Per-image failures never
surface as `Err`; they are reported as a [`ProcessingOutcome`] (`Success`,
`DetectionFailed`, `ReadError`, `WriteError`). A landmark engine that cannot be
acquired is reported distinctly, as [`Error::EngineUnavailable`] or through
[`BatchResult::engine_unavailable`].

Useful modules
--------------
- [`api`]: high-level entry points, batch runner, folder and upload modes.
- [`core`]: configuration and the processing stages.
- [`detect`]: landmark data model, provider seam, engine lifecycle.
- [`io`]: image decoding, encoding, atomic persist.
- [`error`]: crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod detect;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use core::config::{Config, DetectionConfig, MosaicConfig, OutputConfig};
pub use core::processing::region::RedactionRegion;
pub use error::{Error, RedactError, Result};
pub use types::{ItemState, OutcomeKind, OutputFormat, ProcessingOutcome};

// Detection
pub use detect::{
    DetectionFrame, EngineError, EngineLifecycle, EngineStatus, Landmark, LandmarkName,
    LandmarkProvider, PoseEstimate, SidecarProvider,
};

// Pipeline stages
pub use core::processing::pipeline::{Redacted, RedactionPipeline};
pub use core::processing::sizer::mosaic_size;

// High-level API re-exports
pub use api::{
    BatchItem, BatchJob, BatchResult, BatchRunner, BatchSink, FolderLayout, JobTarget, OutputNames,
    Progress, ProgressFn, Upload, UploadReport, UploadResponse, process_uploads, redact_file, run_folder,
    sidecar_factory,
};
pub use io::reader::ImageSource;
