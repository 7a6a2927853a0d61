use std::path::Path;

use tracing::{debug, info, trace, warn};

use crate::core::canvas::Canvas;
use crate::core::config::Config;
use crate::core::processing::pixelate::pixelate_region;
use crate::core::processing::region::{RedactionRegion, estimate_regions};
use crate::core::processing::resize::prepare_detection_image;
use crate::core::processing::sizer::mosaic_size;
use crate::core::processing::smooth::smooth_boundaries;
use crate::detect::{DetectionFrame, EngineLifecycle, EngineStatus, LandmarkProvider};
use crate::error::RedactError;
use crate::io::reader::{ImageSource, load_canvas};
use crate::io::writers::{encode_canvas, persist_atomic};
use crate::types::{OutputFormat, ProcessingOutcome};

/// A fully redacted image, not yet persisted.
#[derive(Debug, Clone)]
pub struct Redacted {
    pub canvas: Canvas,
    pub mosaic_size: u32,
    pub regions: Vec<RedactionRegion>,
}

/// Load -> size -> detect -> pixelate -> smooth -> persist, one image at a time.
///
/// Owns its landmark engine; the engine is released by [`RedactionPipeline::cleanup`]
/// or when the pipeline is dropped.
pub struct RedactionPipeline<P: LandmarkProvider> {
    engine: EngineLifecycle<P>,
    config: Config,
}

impl<P: LandmarkProvider> RedactionPipeline<P> {
    pub fn new(engine: EngineLifecycle<P>, config: Config) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine_status(&self) -> &EngineStatus {
        self.engine.status()
    }

    /// Redact `source` in memory. No bytes are written anywhere.
    pub fn redact(&mut self, source: &ImageSource) -> Result<Redacted, RedactError> {
        let id = source.id();
        let mut canvas = load_canvas(source)?;
        let (width, height) = (canvas.width(), canvas.height());
        trace!("{}: loaded", id);

        let size = mosaic_size(width, height, &self.config.mosaic);
        trace!("{}: mosaic size {}", id, size);

        if let EngineStatus::Unavailable(reason) = self.engine.status() {
            return Err(RedactError::DetectionFailed(format!(
                "landmark engine unavailable: {}",
                reason
            )));
        }

        let (detection_rgb, scale) =
            prepare_detection_image(canvas.to_rgb(), self.config.detection.max_image_size)
                .map_err(|e| RedactError::DetectionFailed(e.to_string()))?;
        let pose = self
            .engine
            .estimate(&DetectionFrame {
                id: &id,
                pixels: &detection_rgb,
            })
            .map_err(|e| RedactError::DetectionFailed(e.to_string()))?;
        drop(detection_rgb);

        let regions = estimate_regions(pose.as_ref(), width, height, scale, &self.config.detection);
        if regions.is_empty() {
            warn!("{}: no redaction region found", id);
            return Err(RedactError::DetectionFailed(
                "no subject with visible hip landmarks".to_string(),
            ));
        }

        let mut applied = Vec::with_capacity(regions.len());
        for region in &regions {
            let Some(clamped) = pixelate_region(&mut canvas.pixels_mut(), region, size) else {
                continue;
            };
            smooth_boundaries(&mut canvas, &clamped, size, self.config.mosaic.blur_radius);
            applied.push(clamped);
        }
        trace!("{}: pixelated and smoothed {} region(s)", id, applied.len());

        Ok(Redacted {
            canvas,
            mosaic_size: size,
            regions: applied,
        })
    }

    /// Redact and encode to `format`.
    pub fn redact_to_bytes(
        &mut self,
        source: &ImageSource,
        format: OutputFormat,
    ) -> Result<Vec<u8>, RedactError> {
        let redacted = self.redact(source)?;
        encode_canvas(&redacted.canvas, format, self.config.output.quality)
            .map_err(|e| RedactError::Write(e.to_string()))
    }

    /// Redact `source` and persist it at `output`.
    ///
    /// The output format follows the extension of `output`, falling back to the
    /// configured format. Nothing is written unless every stage succeeded.
    pub fn process(&mut self, source: &ImageSource, output: &Path) -> ProcessingOutcome {
        info!("Processing: {} -> {:?}", source.id(), output);
        let format = output
            .extension()
            .and_then(|e| e.to_str())
            .and_then(OutputFormat::from_extension)
            .unwrap_or(self.config.output.format);

        let result = self.redact_to_bytes(source, format).and_then(|bytes| {
            persist_atomic(&bytes, output).map_err(|e| RedactError::Write(e.to_string()))
        });
        match &result {
            Ok(()) => debug!("{}: persisted", source.id()),
            Err(e) => warn!("{}: {}", source.id(), e),
        }
        ProcessingOutcome::from_result(&result)
    }

    /// Release the landmark engine.
    pub fn cleanup(&mut self) {
        self.engine.cleanup();
    }
}
