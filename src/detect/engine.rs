use tracing::{debug, info, warn};

use super::{DetectionFrame, EngineError, LandmarkProvider, PoseEstimate};

/// Whether the landmark engine behind a session is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Ready,
    Unavailable(String),
}

impl EngineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineStatus::Ready)
    }
}

/// Owns a provider from acquisition to release.
///
/// If acquisition fails the lifecycle is degraded: every estimate is empty and
/// [`EngineLifecycle::status`] reports why. Release runs once, either through
/// [`EngineLifecycle::cleanup`] or on drop.
pub struct EngineLifecycle<P: LandmarkProvider> {
    provider: Option<P>,
    status: EngineStatus,
}

impl<P: LandmarkProvider> EngineLifecycle<P> {
    pub fn acquire<F>(factory: F) -> Self
    where
        F: FnOnce() -> Result<P, EngineError>,
    {
        match factory() {
            Ok(provider) => {
                info!("Landmark engine acquired");
                Self {
                    provider: Some(provider),
                    status: EngineStatus::Ready,
                }
            }
            Err(e) => {
                warn!("Landmark engine unavailable, detection disabled: {}", e);
                Self {
                    provider: None,
                    status: EngineStatus::Unavailable(e.to_string()),
                }
            }
        }
    }

    /// Wrap an already constructed provider.
    pub fn from_provider(provider: P) -> Self {
        Self::acquire(|| Ok(provider))
    }

    pub fn status(&self) -> &EngineStatus {
        &self.status
    }

    pub fn is_available(&self) -> bool {
        self.status.is_ready() && self.provider.is_some()
    }

    /// Run the provider. Degraded or released engines report no estimate.
    pub fn estimate(&mut self, frame: &DetectionFrame<'_>) -> Result<Option<PoseEstimate>, EngineError> {
        match self.provider.as_mut() {
            Some(provider) => provider.estimate(frame),
            None => Ok(None),
        }
    }

    /// Release the provider. Safe to call more than once.
    pub fn cleanup(&mut self) {
        if let Some(mut provider) = self.provider.take() {
            provider.release();
            debug!("Landmark engine released");
        }
    }
}

impl<P: LandmarkProvider> Drop for EngineLifecycle<P> {
    fn drop(&mut self) {
        self.cleanup();
    }
}
