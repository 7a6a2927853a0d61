use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::canvas::Canvas;
use crate::error::RedactError;

/// Extensions accepted as input, compared case-insensitively.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Extension check for a declared extension, with or without the leading dot.
pub fn is_accepted_extension(ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    ACCEPTED_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(ext))
}

pub fn is_accepted_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(is_accepted_extension)
}

/// Where an image comes from: a file on disk or an in-memory upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(PathBuf),
    Memory { name: String, bytes: Vec<u8> },
}

impl ImageSource {
    /// Identifier used for logging, status tracking and pose lookup.
    pub fn id(&self) -> String {
        match self {
            ImageSource::File(path) => path.to_string_lossy().into_owned(),
            ImageSource::Memory { name, .. } => name.clone(),
        }
    }
}

pub fn load_canvas(source: &ImageSource) -> Result<Canvas, RedactError> {
    let decoded = match source {
        ImageSource::File(path) => image::ImageReader::open(path)
            .map_err(|e| RedactError::Read(format!("{:?}: {}", path, e)))?
            .with_guessed_format()
            .map_err(|e| RedactError::Read(format!("{:?}: {}", path, e)))?
            .decode(),
        ImageSource::Memory { bytes, .. } => image::load_from_memory(bytes),
    };
    let image = decoded.map_err(|e| RedactError::Read(format!("{}: {}", source.id(), e)))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(RedactError::Read(format!("{}: image has no pixels", source.id())));
    }
    debug!(
        "Loaded {} ({}x{}, {:?})",
        source.id(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(Canvas::from_dynamic(image))
}
