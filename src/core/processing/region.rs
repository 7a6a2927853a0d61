use tracing::{debug, info};

use crate::core::config::DetectionConfig;
use crate::detect::{LandmarkName, PoseEstimate};

/// Axis-aligned rectangle in pixel coordinates; `x_max`/`y_max` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedactionRegion {
    pub x_min: i64,
    pub x_max: i64,
    pub y_min: i64,
    pub y_max: i64,
}

impl RedactionRegion {
    pub fn new(x_min: i64, x_max: i64, y_min: i64, y_max: i64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn width(&self) -> i64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> i64 {
        self.y_max - self.y_min
    }

    /// Intersect with a `width` x `height` image; `None` if nothing non-empty remains.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        let clamped = Self {
            x_min: self.x_min.clamp(0, width as i64),
            x_max: self.x_max.clamp(0, width as i64),
            y_min: self.y_min.clamp(0, height as i64),
            y_max: self.y_max.clamp(0, height as i64),
        };
        (clamped.x_min < clamped.x_max && clamped.y_min < clamped.y_max).then_some(clamped)
    }
}

/// Geometry of the copy the estimate was computed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionScale {
    pub scaled_width: u32,
    pub scaled_height: u32,
    /// `scaled_long_side / original_long_side`; 1.0 when no resize happened
    pub factor: f64,
}

impl DetectionScale {
    pub fn identity(width: u32, height: u32) -> Self {
        Self {
            scaled_width: width,
            scaled_height: height,
            factor: 1.0,
        }
    }
}

/// Derive the regions to redact from a pose estimate.
///
/// Both hips must be visible at `config.confidence`. The region spans the hips
/// horizontally (plus `config.margin` on each side) and runs from hip height to
/// the bottom of the image. An empty result means detection failed.
pub fn estimate_regions(
    pose: Option<&PoseEstimate>,
    width: u32,
    height: u32,
    scale: DetectionScale,
    config: &DetectionConfig,
) -> Vec<RedactionRegion> {
    let Some(pose) = pose else {
        debug!("No pose estimate");
        return Vec::new();
    };
    let (Some(left_hip), Some(right_hip)) = (
        pose.visible(LandmarkName::LeftHip, config.confidence),
        pose.visible(LandmarkName::RightHip, config.confidence),
    ) else {
        debug!(
            "Hip landmarks missing or below confidence {}",
            config.confidence
        );
        return Vec::new();
    };

    let factor = if scale.factor > 0.0 { scale.factor } else { 1.0 };
    let sw = scale.scaled_width as f64;
    let sh = scale.scaled_height as f64;

    // Detection space -> original resolution
    let hip_y = left_hip.y as f64 * sh / factor;
    let left_x = left_hip.x as f64 * sw / factor;
    let right_x = right_hip.x as f64 * sw / factor;
    let margin = config.margin as f64;

    let region = RedactionRegion::new(
        (left_x.min(right_x) - margin).round() as i64,
        (left_x.max(right_x) + margin).round() as i64,
        hip_y.round() as i64,
        height as i64,
    );

    match region.clamp_to(width, height) {
        Some(region) => {
            info!(
                "Redaction region: x=[{}, {}), y=[{}, {})",
                region.x_min, region.x_max, region.y_min, region.y_max
            );
            vec![region]
        }
        None => {
            debug!("Discarding degenerate region {:?}", region);
            Vec::new()
        }
    }
}
