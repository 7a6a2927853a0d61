use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{DetectionFrame, EngineError, EngineOptions, LandmarkProvider, PoseEstimate};

pub const SIDECAR_SUFFIX: &str = ".pose.json";

/// Reads pose estimates produced by an external estimator.
///
/// For an input `photo.jpg` the estimate is `photo.pose.json`, looked up in the
/// configured pose directory, or next to the image when no directory is set.
/// A missing sidecar means no subject was found.
#[derive(Debug, Clone)]
pub struct SidecarProvider {
    pose_dir: Option<PathBuf>,
    options: EngineOptions,
}

impl SidecarProvider {
    /// Fails when `pose_dir` is set but is not a directory.
    pub fn open(pose_dir: Option<&Path>, options: EngineOptions) -> Result<Self, EngineError> {
        if let Some(dir) = pose_dir {
            if !dir.is_dir() {
                return Err(EngineError::Acquire(format!(
                    "pose directory {:?} does not exist",
                    dir
                )));
            }
        }
        debug!(
            "Sidecar provider ready (dir={:?}, model_complexity={})",
            pose_dir, options.model_complexity
        );
        Ok(Self {
            pose_dir: pose_dir.map(Path::to_path_buf),
            options,
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Where the estimate for input `id` is expected.
    pub fn sidecar_path(&self, id: &str) -> PathBuf {
        let id_path = Path::new(id);
        let stem = id_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.to_string());
        let file_name = format!("{}{}", stem, SIDECAR_SUFFIX);
        match &self.pose_dir {
            Some(dir) => dir.join(file_name),
            None => id_path.with_file_name(file_name),
        }
    }
}

impl LandmarkProvider for SidecarProvider {
    fn estimate(&mut self, frame: &DetectionFrame<'_>) -> Result<Option<PoseEstimate>, EngineError> {
        let path = self.sidecar_path(frame.id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No pose sidecar at {:?}", path);
                return Ok(None);
            }
            Err(e) => return Err(EngineError::Estimate(format!("{:?}: {}", path, e))),
        };
        match serde_json::from_str::<PoseEstimate>(&text) {
            Ok(pose) if pose.landmarks.is_empty() => Ok(None),
            Ok(pose) => Ok(Some(pose)),
            Err(e) => {
                warn!("Ignoring malformed pose sidecar {:?}: {}", path, e);
                Ok(None)
            }
        }
    }
}
