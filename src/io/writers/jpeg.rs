use jpeg_encoder::{ColorType, Encoder};

use crate::core::canvas::Canvas;
use crate::error::{Error, Result};

/// Encode as baseline JPEG. Alpha, if any, is dropped.
pub fn encode_jpeg(canvas: &Canvas, quality: u8) -> Result<Vec<u8>> {
    let (cols, rows) = (canvas.width(), canvas.height());
    let (cols, rows) = match (u16::try_from(cols), u16::try_from(rows)) {
        (Ok(c), Ok(r)) => (c, r),
        _ => {
            return Err(Error::Encode(format!(
                "{}x{} exceeds the JPEG dimension limit",
                cols, rows
            )));
        }
    };
    let color = match canvas {
        Canvas::Rgb(_) => ColorType::Rgb,
        Canvas::Rgba(_) => ColorType::Rgba,
    };

    let mut buffer = Vec::new();
    let encoder = Encoder::new(&mut buffer, quality.clamp(1, 100));
    encoder
        .encode(canvas.raw(), cols, rows, color)
        .map_err(|e| Error::Encode(e.to_string()))?;
    Ok(buffer)
}
