use image::{ImageBuffer, Pixel, imageops};
use tracing::trace;

use crate::core::canvas::Canvas;
use crate::core::processing::region::RedactionRegion;

pub const MIN_STRIP_HALF_WIDTH: u32 = 2;
pub const MAX_STRIP_HALF_WIDTH: u32 = 5;

/// Half-width of the strip blurred on each side of a region edge.
pub fn strip_half_width(size: u32, blur_radius: u32) -> u32 {
    let upper = blur_radius.clamp(MIN_STRIP_HALF_WIDTH, MAX_STRIP_HALF_WIDTH);
    (size / 2).clamp(MIN_STRIP_HALF_WIDTH, upper)
}

/// Pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Strip {
    x0: u32,
    x1: u32,
    y0: u32,
    y1: u32,
}

/// Gaussian sigma matching a `(2r+1)`-tap kernel with automatic sigma.
pub fn kernel_sigma(radius: u32) -> f32 {
    0.3 * (radius.max(1) as f32 - 1.0) + 0.8
}

/// Blur thin strips straddling the four edges of an already clamped region.
///
/// Each strip spans `half` pixels on both sides of its edge and is blurred as
/// a detached patch, so no sample is taken from outside it. An edge whose strip
/// would leave the image is skipped. Returns the number of edges smoothed.
pub fn smooth_boundaries(
    canvas: &mut Canvas,
    region: &RedactionRegion,
    size: u32,
    blur_radius: u32,
) -> usize {
    let Some(region) = region.clamp_to(canvas.width(), canvas.height()) else {
        return 0;
    };
    let half = strip_half_width(size, blur_radius) as i64;
    let radius = blur_radius.max(1).min(half as u32);
    let sigma = kernel_sigma(radius);
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);

    let straddle = |edge: i64, limit: i64| -> Option<(u32, u32)> {
        (edge - half >= 0 && edge + half <= limit)
            .then(|| ((edge - half) as u32, (edge + half) as u32))
    };

    let mut strips = Vec::with_capacity(4);
    for edge in [region.y_min, region.y_max] {
        if let Some((y0, y1)) = straddle(edge, h) {
            strips.push(Strip {
                x0: region.x_min as u32,
                x1: region.x_max as u32,
                y0,
                y1,
            });
        }
    }
    for edge in [region.x_min, region.x_max] {
        if let Some((x0, x1)) = straddle(edge, w) {
            strips.push(Strip {
                x0,
                x1,
                y0: region.y_min as u32,
                y1: region.y_max as u32,
            });
        }
    }

    for strip in &strips {
        match canvas {
            Canvas::Rgb(img) => blur_strip(img, *strip, sigma),
            Canvas::Rgba(img) => blur_strip(img, *strip, sigma),
        }
    }
    trace!(
        "Smoothed {} region edges (half-width {}, sigma {:.2})",
        strips.len(),
        half,
        sigma
    );
    strips.len()
}

fn blur_strip<P>(img: &mut ImageBuffer<P, Vec<u8>>, strip: Strip, sigma: f32)
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (sw, sh) = (strip.x1 - strip.x0, strip.y1 - strip.y0);
    if sw == 0 || sh == 0 {
        return;
    }
    let patch = imageops::crop_imm(&*img, strip.x0, strip.y0, sw, sh).to_image();
    let blurred = imageops::blur(&patch, sigma);
    imageops::replace(img, &blurred, strip.x0 as i64, strip.y0 as i64);
}
