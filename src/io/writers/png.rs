use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::core::canvas::Canvas;
use crate::error::Result;

pub fn encode_png(canvas: &Canvas) -> Result<Vec<u8>> {
    let color = match canvas {
        Canvas::Rgb(_) => ExtendedColorType::Rgb8,
        Canvas::Rgba(_) => ExtendedColorType::Rgba8,
    };
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer).write_image(canvas.raw(), canvas.width(), canvas.height(), color)?;
    Ok(buffer)
}
