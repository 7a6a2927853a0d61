use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use image::{ImageFormat, Rgb, RgbImage};

use mosaicpro::api::{BatchJob, BatchRunner, FolderLayout, ProgressFn, Upload};
use mosaicpro::{
    Config, DetectionFrame, EngineError, EngineLifecycle, EngineStatus, Error, ImageSource,
    ItemState, Landmark, LandmarkName, LandmarkProvider, OutcomeKind, PoseEstimate,
    RedactionPipeline, RedactionRegion, process_uploads, redact_file, run_folder,
};

/// Landmark engine stand-in: answers from a table keyed by file stem.
struct ScriptedProvider {
    poses: HashMap<String, PoseEstimate>,
    released: Arc<AtomicUsize>,
}

impl LandmarkProvider for ScriptedProvider {
    fn estimate(&mut self, frame: &DetectionFrame<'_>) -> Result<Option<PoseEstimate>, EngineError> {
        let stem = Path::new(frame.id)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.poses.get(&stem).cloned())
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct Script {
    poses: HashMap<String, PoseEstimate>,
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl Script {
    fn with_subject(mut self, stem: &str) -> Self {
        self.poses.insert(stem.to_string(), standing_subject());
        self
    }

    fn factory(&self) -> impl Fn() -> Result<ScriptedProvider, EngineError> + Sync + '_ {
        move || {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(ScriptedProvider {
                poses: self.poses.clone(),
                released: self.released.clone(),
            })
        }
    }
}

fn failing_factory() -> Result<ScriptedProvider, EngineError> {
    Err(EngineError::Acquire("model file missing".to_string()))
}

/// Hips at 30% / 70% width, half height.
fn standing_subject() -> PoseEstimate {
    PoseEstimate::default()
        .with_landmark(LandmarkName::LeftHip, Landmark::new(0.3, 0.5, 0.9))
        .with_landmark(LandmarkName::RightHip, Landmark::new(0.7, 0.5, 0.9))
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * 7 + y * 3) % 256) as u8])
    })
}

fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn write_png(path: &Path, img: &RgbImage) {
    fs::write(path, png_bytes(img)).unwrap();
}

#[test]
fn pipeline_pixelates_region_and_leaves_rest_untouched() {
    let script = Script::default().with_subject("subject");
    let original = gradient(200, 200);
    let mut pipeline =
        RedactionPipeline::new(EngineLifecycle::acquire(script.factory()), Config::default());
    assert!(pipeline.engine_status().is_ready());

    let redacted = pipeline
        .redact(&ImageSource::Memory {
            name: "subject.png".to_string(),
            bytes: png_bytes(&original),
        })
        .unwrap();

    // 200px long side is below the small-image threshold
    assert_eq!(redacted.mosaic_size, 4);
    // hips at x=60/140, y=100, margin 25
    assert_eq!(redacted.regions, vec![RedactionRegion::new(35, 165, 100, 200)]);

    let out = redacted.canvas.to_rgb();
    for (x, y) in [(10, 10), (20, 150), (185, 150), (100, 50), (100, 95)] {
        assert_eq!(out.get_pixel(x, y), original.get_pixel(x, y), "({x}, {y})");
    }

    // Away from the blended seams the region holds at most size*size colours.
    let mut colours = HashSet::new();
    for y in 105..200 {
        for x in 40..160 {
            colours.insert(out.get_pixel(x, y).0);
        }
    }
    assert!(colours.len() <= 16, "{} colours", colours.len());
    assert!(colours.len() > 1);

    pipeline.cleanup();
    assert_eq!(script.released.load(Ordering::SeqCst), 1);
}

#[test]
fn image_without_subject_is_detection_failure() {
    let script = Script::default();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.png");
    let output = dir.path().join("out.png");
    write_png(&input, &gradient(64, 64));

    let outcome = redact_file(&input, &output, &Config::default(), script.factory()).unwrap();
    assert_eq!(outcome.kind, OutcomeKind::DetectionFailed);
    assert!(!output.exists());
    assert_eq!(script.released.load(Ordering::SeqCst), 1);
}

#[test]
fn redact_file_writes_format_of_output_extension() {
    let script = Script::default().with_subject("person");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("person.png");
    let output = dir.path().join("person_out.jpg");
    write_png(&input, &gradient(120, 160));

    let outcome = redact_file(&input, &output, &Config::default(), script.factory()).unwrap();
    assert!(outcome.is_success(), "{outcome}");
    let written = image::open(&output).unwrap();
    assert_eq!((written.width(), written.height()), (120, 160));
    assert_eq!(
        image::ImageFormat::from_path(&output).unwrap(),
        ImageFormat::Jpeg
    );
}

#[test]
fn redact_file_reports_unavailable_engine() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a.png");
    write_png(&input, &gradient(32, 32));
    let result = redact_file(&input, &dir.path().join("b.png"), &Config::default(), failing_factory);
    assert!(matches!(result, Err(Error::EngineUnavailable(_))));
}

/// N inputs, k of them without a subject: every item ends terminal and the
/// counters add up.
#[test]
fn batch_counts_add_up() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();

    let mut script = Script::default();
    let mut jobs = Vec::new();
    for i in 0..6 {
        let stem = format!("img{i}");
        let input = dir.path().join(format!("{stem}.png"));
        write_png(&input, &gradient(80, 60));
        if i % 3 != 0 {
            script = script.with_subject(&stem);
        }
        jobs.push(BatchJob::to_file(input, out_dir.join(format!("{stem}.png"))));
    }
    // unreadable input
    let broken = dir.path().join("broken.png");
    fs::write(&broken, b"not an image").unwrap();
    jobs.push(BatchJob::to_file(broken, out_dir.join("broken.png")));

    let mut seen = Vec::new();
    let result = BatchRunner::new(Config::default()).run(
        &jobs,
        script.factory(),
        &mut ProgressFn(|p: &mosaicpro::Progress| seen.push((p.index, p.completed, p.state))),
    );

    assert_eq!(result.total(), 7);
    assert_eq!(result.success_count + result.error_count, 7);
    assert_eq!(result.error_count, 3);
    assert!(result.items.iter().all(|item| item.state.is_terminal()));
    assert_eq!(result.items[6].outcome.as_ref().unwrap().kind, OutcomeKind::ReadError);
    assert_eq!(result.items[0].outcome.as_ref().unwrap().kind, OutcomeKind::DetectionFailed);
    assert!(!result.cancelled);

    // progress arrives once per item, in order, with a running count
    assert_eq!(seen.len(), 7);
    for (n, (index, completed, _)) in seen.iter().enumerate() {
        assert_eq!((*index, *completed), (n, n + 1));
    }
    assert_eq!(script.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(script.released.load(Ordering::SeqCst), 1);
    assert!(out_dir.join("img1.png").exists());
    assert!(!out_dir.join("img0.png").exists());
}

#[test]
fn parallel_batch_gives_each_worker_an_engine() {
    let dir = tempfile::tempdir().unwrap();
    let mut script = Script::default();
    let mut jobs = Vec::new();
    for i in 0..8 {
        let stem = format!("p{i}");
        let input = dir.path().join(format!("{stem}.png"));
        write_png(&input, &gradient(50, 70));
        if i % 2 == 0 {
            script = script.with_subject(&stem);
        }
        jobs.push(BatchJob::to_file(input, dir.path().join(format!("{stem}_out.png"))));
    }

    let mut progress_calls = 0;
    let result = BatchRunner::new(Config::default()).parallel(3).run(
        &jobs,
        script.factory(),
        &mut ProgressFn(|_: &mosaicpro::Progress| progress_calls += 1),
    );

    assert_eq!(progress_calls, 8);
    assert_eq!(result.success_count, 4);
    assert_eq!(result.error_count, 4);
    for (i, item) in result.items.iter().enumerate() {
        let expected = if i % 2 == 0 { ItemState::Success } else { ItemState::Error };
        assert_eq!(item.state, expected, "{}", item.id);
    }
    assert_eq!(script.acquired.load(Ordering::SeqCst), 3);
    assert_eq!(script.released.load(Ordering::SeqCst), 3);
}

#[test]
fn cancelled_batch_leaves_remaining_items_pending() {
    let dir = tempfile::tempdir().unwrap();
    let script = Script::default().with_subject("c0");
    let mut jobs = Vec::new();
    for i in 0..4 {
        let input = dir.path().join(format!("c{i}.png"));
        write_png(&input, &gradient(40, 40));
        jobs.push(BatchJob::to_file(input, dir.path().join(format!("c{i}_out.png"))));
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    let runner = BatchRunner::new(Config::default()).cancel_flag(cancel);
    let result = runner.run(
        &jobs,
        script.factory(),
        &mut ProgressFn(move |p: &mosaicpro::Progress| {
            if p.completed == 2 {
                flag.store(true, Ordering::SeqCst);
            }
        }),
    );

    assert!(result.cancelled);
    assert_eq!(result.success_count + result.error_count, 2);
    assert_eq!(result.items[2].state, ItemState::Pending);
    assert_eq!(result.items[3].state, ItemState::Pending);
    assert_eq!(script.released.load(Ordering::SeqCst), 1);
}

#[test]
fn unavailable_engine_fails_every_item_distinctly() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a.png");
    write_png(&input, &gradient(30, 30));
    let jobs = vec![BatchJob::to_file(input, dir.path().join("a_out.png"))];

    let result = BatchRunner::new(Config::default()).run(
        &jobs,
        failing_factory,
        &mut ProgressFn(|_: &mosaicpro::Progress| {}),
    );
    assert_eq!(result.engine_unavailable(), Some("engine acquisition failed: model file missing"));
    assert!(matches!(result.engine, EngineStatus::Unavailable(_)));
    assert_eq!(result.error_count, 1);
    let message = result.items[0].message().unwrap();
    assert!(message.contains("landmark engine unavailable"), "{message}");
}

#[test]
fn empty_upload_is_rejected_before_engine_acquisition() {
    let script = Script::default();
    let runner = BatchRunner::new(Config::default());
    let result = process_uploads(&runner, &[], script.factory(), &mut |_| {});
    assert!(matches!(result, Err(Error::NoInput)));
    assert_eq!(script.acquired.load(Ordering::SeqCst), 0);
}

#[test]
fn uploads_are_named_and_typed() {
    let script = Script::default().with_subject("front");
    let img = gradient(90, 120);
    let mut jpeg = Cursor::new(Vec::new());
    img.write_to(&mut jpeg, ImageFormat::Jpeg).unwrap();
    let uploads = vec![
        Upload::new("front.png", "png", png_bytes(&img)),
        Upload::new("back.png", "png", png_bytes(&img)),
        Upload::new("front.jpg", "JPG", jpeg.into_inner()),
    ];

    let runner = BatchRunner::new(Config::default());
    let report = process_uploads(&runner, &uploads, script.factory(), &mut |_| {}).unwrap();

    assert_eq!(report.responses.len(), 3);
    let first = report.responses[0].result.as_ref().unwrap();
    assert_eq!(first.file_name, "processed_front.png");
    assert_eq!(first.media_type, "image/png");
    assert_eq!(image::load_from_memory(&first.bytes).unwrap().width(), 90);

    assert_eq!(report.responses[1].name, "back.png");
    assert!(report.responses[1].result.is_err());

    let third = report.responses[2].result.as_ref().unwrap();
    assert_eq!(third.file_name, "processed_front.jpg");
    assert_eq!(third.media_type, "image/jpeg");

    assert_eq!(report.batch.success_count, 2);
    assert_eq!(report.batch.error_count, 1);
}

#[test]
fn folder_mode_routes_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let layout = FolderLayout::new(dir.path());
    layout.ensure().unwrap();
    write_png(&layout.input.join("ok.png"), &gradient(60, 80));
    write_png(&layout.input.join("nobody.png"), &gradient(60, 80));
    fs::write(layout.input.join("readme.txt"), b"ignored").unwrap();

    let script = Script::default().with_subject("ok");
    let runner = BatchRunner::new(Config::default());
    let mut ticks = 0;
    let result = run_folder(&runner, &layout, script.factory(), &mut |_| ticks += 1).unwrap();

    assert_eq!(ticks, 2);
    assert_eq!((result.success_count, result.error_count), (1, 1));
    assert!(layout.output.join("ok.png").exists());
    assert!(!layout.input.join("ok.png").exists());
    assert!(layout.error.join("nobody.png").exists());
    assert!(!layout.input.join("nobody.png").exists());
    assert!(layout.input.join("readme.txt").exists());
}

#[test]
fn sidecar_poses_drive_the_default_provider() {
    let dir = tempfile::tempdir().unwrap();
    let poses = dir.path().join("poses");
    fs::create_dir(&poses).unwrap();
    let input = dir.path().join("model.png");
    write_png(&input, &gradient(100, 100));
    fs::write(
        poses.join("model.pose.json"),
        serde_json::to_string(&standing_subject()).unwrap(),
    )
    .unwrap();

    let config = Config::default();
    let output: PathBuf = dir.path().join("model_out.png");
    let outcome = redact_file(
        &input,
        &output,
        &config,
        mosaicpro::sidecar_factory(Some(poses), &config),
    )
    .unwrap();
    assert!(outcome.is_success(), "{outcome}");
    assert_ne!(
        image::open(&output).unwrap().to_rgb8(),
        gradient(100, 100)
    );
}

#[test]
fn folder_mode_keeps_results_for_inputs_sharing_a_stem() {
    let dir = tempfile::tempdir().unwrap();
    let layout = FolderLayout::new(dir.path());
    layout.ensure().unwrap();
    gradient(60, 80).save(layout.input.join("a.jpg")).unwrap();
    write_png(&layout.input.join("a.png"), &gradient(70, 90));

    let script = Script::default().with_subject("a");
    let runner = BatchRunner::new(Config::default());
    let result = run_folder(&runner, &layout, script.factory(), &mut |_| {}).unwrap();

    assert_eq!((result.success_count, result.error_count), (2, 0));
    let from_jpg = image::open(layout.output.join("a.png")).unwrap();
    let from_png = image::open(layout.output.join("a.png.png")).unwrap();
    assert_eq!((from_jpg.width(), from_jpg.height()), (60, 80));
    assert_eq!((from_png.width(), from_png.height()), (70, 90));
    assert_eq!(fs::read_dir(&layout.input).unwrap().count(), 0);
}

#[test]
fn failed_persist_is_write_error_and_leaves_nothing_behind() {
    let script = Script::default().with_subject("subject");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("subject.png");
    write_png(&input, &gradient(100, 100));
    let output = dir.path().join("missing").join("subject.png");

    let mut pipeline =
        RedactionPipeline::new(EngineLifecycle::acquire(script.factory()), Config::default());
    let outcome = pipeline.process(&ImageSource::File(input.clone()), &output);
    pipeline.cleanup();

    assert_eq!(outcome.kind, OutcomeKind::WriteError);
    assert!(outcome.message.is_some());
    assert!(!output.exists());
    let left: Vec<PathBuf> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(left, vec![input]);
}

#[test]
fn large_image_region_maps_back_to_full_resolution() {
    let script = Script::default().with_subject("wide");
    let original = gradient(2000, 1000);
    let mut pipeline =
        RedactionPipeline::new(EngineLifecycle::acquire(script.factory()), Config::default());

    let redacted = pipeline
        .redact(&ImageSource::Memory {
            name: "wide.png".to_string(),
            bytes: png_bytes(&original),
        })
        .unwrap();

    // detection ran on a 1024x512 copy; hips land at x=600/1400, y=500
    assert_eq!(redacted.mosaic_size, 20);
    assert_eq!(redacted.regions, vec![RedactionRegion::new(575, 1425, 500, 1000)]);

    let out = redacted.canvas.to_rgb();
    assert_eq!((out.width(), out.height()), (2000, 1000));
    for (x, y) in [(100, 100), (560, 800), (1440, 800), (1000, 480)] {
        assert_eq!(out.get_pixel(x, y), original.get_pixel(x, y), "({x}, {y})");
    }
    assert_ne!(out.get_pixel(1000, 750), original.get_pixel(1000, 750));
}

#[test]
fn uploads_with_unsupported_type_are_rejected_per_item() {
    let script = Script::default().with_subject("front");
    let img = gradient(50, 50);
    let uploads = vec![
        Upload::new("front.gif", "gif", png_bytes(&img)),
        Upload::new("front.png", ".PNG", png_bytes(&img)),
    ];

    let runner = BatchRunner::new(Config::default());
    let report = process_uploads(&runner, &uploads, script.factory(), &mut |_| {}).unwrap();

    assert_eq!(report.responses.len(), 2);
    assert_eq!(report.responses[0].name, "front.gif");
    let reason = report.responses[0].result.as_ref().unwrap_err();
    assert!(reason.contains("unsupported file type"), "{reason}");

    let ok = report.responses[1].result.as_ref().unwrap();
    assert_eq!(ok.file_name, "processed_front.png");
    assert_eq!(ok.media_type, "image/png");
    assert_eq!(report.batch.total(), 1);
}

#[test]
fn only_unsupported_uploads_never_start_the_engine() {
    let script = Script::default();
    let uploads = vec![Upload::new("clip.webp", "webp", vec![1, 2, 3])];
    let runner = BatchRunner::new(Config::default());
    let report = process_uploads(&runner, &uploads, script.factory(), &mut |_| {}).unwrap();
    assert!(report.responses[0].result.is_err());
    assert_eq!(script.acquired.load(Ordering::SeqCst), 0);
}
