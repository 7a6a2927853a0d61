//! Landmark detection boundary.
//!
//! The pose estimator itself is an external collaborator. This module defines the
//! data it hands back ([`PoseEstimate`]), the seam it plugs into
//! ([`LandmarkProvider`]), the resource wrapper that owns it ([`EngineLifecycle`]),
//! and a bundled provider that reads estimates written by an external tool
//! ([`SidecarProvider`]).
use std::collections::BTreeMap;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod engine;
pub mod sidecar;

pub use engine::{EngineLifecycle, EngineStatus};
pub use sidecar::SidecarProvider;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine acquisition failed: {0}")]
    Acquire(String),

    #[error("estimation failed: {0}")]
    Estimate(String),
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkName {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

/// A keypoint in normalized image coordinates.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Visibility confidence in [0, 1]
    #[serde(default)]
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }
}

/// Pose of a single subject. Produced per image, never mutated afterwards.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct PoseEstimate {
    pub landmarks: BTreeMap<LandmarkName, Landmark>,
}

impl PoseEstimate {
    pub fn with_landmark(mut self, name: LandmarkName, landmark: Landmark) -> Self {
        self.landmarks.insert(name, landmark);
        self
    }

    pub fn get(&self, name: LandmarkName) -> Option<&Landmark> {
        self.landmarks.get(&name)
    }

    /// Landmark `name` if present and at least `confidence` visible.
    pub fn visible(&self, name: LandmarkName, confidence: f32) -> Option<&Landmark> {
        self.get(name).filter(|l| l.visibility >= confidence)
    }
}

/// What a provider sees: the RGB pixels (possibly downsampled) and the input id.
#[derive(Debug, Clone, Copy)]
pub struct DetectionFrame<'a> {
    pub id: &'a str,
    pub pixels: &'a RgbImage,
}

/// Options forwarded to providers at acquisition time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    pub model_complexity: u8,
    pub min_confidence: f32,
}

/// Pluggable pose estimation backend.
///
/// Providers hold native resources that are not safe to share between threads;
/// each worker owns its own instance through an [`EngineLifecycle`].
pub trait LandmarkProvider: Send {
    /// Estimate the pose of the (single) subject, `None` when nobody was found.
    fn estimate(&mut self, frame: &DetectionFrame<'_>) -> Result<Option<PoseEstimate>, EngineError>;

    /// Release the underlying resource. Called exactly once by [`EngineLifecycle`].
    fn release(&mut self) {}
}

impl<P: LandmarkProvider + ?Sized> LandmarkProvider for Box<P> {
    fn estimate(&mut self, frame: &DetectionFrame<'_>) -> Result<Option<PoseEstimate>, EngineError> {
        (**self).estimate(frame)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
