use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::OutputFormat;

/// Mosaic block settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// Smallest block size ever emitted
    pub min_size: u32,
    /// Block edge per long-side pixel (0.01 = one block pixel per 100 image pixels)
    pub scale_factor: f64,
    /// Upper bound for the boundary strip half-width and blur radius
    pub blur_radius: u32,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            min_size: 4,
            scale_factor: 0.01,
            blur_radius: 3,
        }
    }
}

/// Landmark detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum landmark visibility accepted for the hip landmarks
    pub confidence: f32,
    /// Forwarded to providers that support several model sizes
    pub model_complexity: u8,
    /// Long side cap of the copy handed to the landmark provider
    pub max_image_size: u32,
    /// Horizontal margin (pixels) added on both sides of the hips
    pub margin: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            model_complexity: 1,
            max_image_size: 1024,
            margin: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// JPEG quality, 1..=100
    pub quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            quality: 95,
        }
    }
}

/// Full configuration document. Each group merges over its defaults key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mosaic: MosaicConfig,
    pub detection: DetectionConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Parse a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        Ok(config.sanitized())
    }

    /// Load configuration from `path`, falling back to defaults.
    ///
    /// A missing path yields defaults silently; an unreadable or malformed
    /// document logs a warning and yields defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        let parsed = fs::read_to_string(path)
            .map_err(Error::from)
            .and_then(|text| Self::from_json(&text));
        match parsed {
            Ok(config) => {
                info!("Loaded configuration: {:?}", path);
                config
            }
            Err(e) => {
                warn!("Failed to load configuration {:?}, using defaults: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Write this configuration as a JSON document, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    fn sanitized(mut self) -> Self {
        self.mosaic.min_size = self.mosaic.min_size.max(1);
        if !(self.mosaic.scale_factor.is_finite() && self.mosaic.scale_factor > 0.0) {
            warn!(
                "mosaic.scale_factor={} is not positive, using default",
                self.mosaic.scale_factor
            );
            self.mosaic.scale_factor = MosaicConfig::default().scale_factor;
        }
        self.detection.confidence = self.detection.confidence.clamp(0.0, 1.0);
        self.detection.max_image_size = self.detection.max_image_size.max(1);
        self.output.quality = self.output.quality.clamp(1, 100);
        self
    }
}
