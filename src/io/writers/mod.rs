//! Encoders for redacted output and the atomic persist step.
pub mod jpeg;
pub mod png;

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::core::canvas::Canvas;
use crate::error::Result;
use crate::types::OutputFormat;

pub fn encode_canvas(canvas: &Canvas, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Png => png::encode_png(canvas),
        OutputFormat::Jpeg => jpeg::encode_jpeg(canvas, quality),
    }
}

/// Write `bytes` to `output` all at once: a temp file in the same directory is
/// renamed over the target, so readers never observe a partial image.
pub fn persist_atomic(bytes: &[u8], output: &Path) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(output).map_err(|e| e.error)?;
    debug!("Persisted {} bytes to {:?}", bytes.len(), output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn persist_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.png");
        std::fs::write(&target, b"old").unwrap();
        persist_atomic(b"new contents", &target).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"new contents");
        // no temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn persist_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("out.png");
        assert!(persist_atomic(b"x", &target).is_err());
    }

    #[test]
    fn encoded_formats_have_magic_bytes() {
        let canvas = Canvas::Rgb(RgbImage::from_pixel(8, 6, Rgb([1, 2, 3])));
        let png = encode_canvas(&canvas, OutputFormat::Png, 90).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let jpeg = encode_canvas(&canvas, OutputFormat::Jpeg, 90).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }
}
