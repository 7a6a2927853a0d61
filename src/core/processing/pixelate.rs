use tracing::{debug, trace};

use crate::core::canvas::PixelsMut;
use crate::core::processing::region::RedactionRegion;

/// Replace `region` with a `size` x `size` grid of averaged blocks, in place.
///
/// Columns of the crop map to grid cells by `x * grid / crop_width` (rows likewise),
/// and each cell is filled with the rounded mean of the pixels it covers. This is
/// an area-average downsample followed by a nearest-neighbour upsample over the
/// same partition, so pixelating an already pixelated region is a no-op.
///
/// Returns the clamped region that was processed, or `None` when it was empty.
pub fn pixelate_region(
    pixels: &mut PixelsMut<'_>,
    region: &RedactionRegion,
    size: u32,
) -> Option<RedactionRegion> {
    let Some(region) = region.clamp_to(pixels.width, pixels.height) else {
        debug!("Skipping empty region {:?}", region);
        return None;
    };

    let x0 = region.x_min as u32;
    let y0 = region.y_min as u32;
    let crop_w = region.width() as u32;
    let crop_h = region.height() as u32;
    let grid_x = size.max(1).min(crop_w) as usize;
    let grid_y = size.max(1).min(crop_h) as usize;
    let channels = pixels.channels;

    let cell_col: Vec<usize> = (0..crop_w as usize)
        .map(|x| x * grid_x / crop_w as usize)
        .collect();
    let cell_row: Vec<usize> = (0..crop_h as usize)
        .map(|y| y * grid_y / crop_h as usize)
        .collect();

    let mut sums = vec![0u64; grid_x * grid_y * channels];
    let mut counts = vec![0u64; grid_x * grid_y];

    for (dy, &row) in cell_row.iter().enumerate() {
        let line = pixels.offset(x0, y0 + dy as u32);
        for (dx, &col) in cell_col.iter().enumerate() {
            let cell = row * grid_x + col;
            let px = line + dx * channels;
            counts[cell] += 1;
            for c in 0..channels {
                sums[cell * channels + c] += pixels.data[px + c] as u64;
            }
        }
    }

    let means: Vec<u8> = sums
        .iter()
        .enumerate()
        .map(|(i, &sum)| {
            let n = counts[i / channels].max(1);
            ((sum + n / 2) / n) as u8
        })
        .collect();

    for (dy, &row) in cell_row.iter().enumerate() {
        let line = pixels.offset(x0, y0 + dy as u32);
        for (dx, &col) in cell_col.iter().enumerate() {
            let cell = (row * grid_x + col) * channels;
            let px = line + dx * channels;
            pixels.data[px..px + channels].copy_from_slice(&means[cell..cell + channels]);
        }
    }

    trace!(
        "Pixelated {}x{} crop at ({}, {}) into {}x{} blocks",
        crop_w, crop_h, x0, y0, grid_x, grid_y
    );
    Some(region)
}
