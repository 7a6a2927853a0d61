use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use tracing::{debug, info};

use crate::core::processing::region::DetectionScale;
use crate::error::{Error, Result};

/// Dimensions after scaling the long side down to `target_size`, aspect preserved.
/// Images already within the target keep their dimensions.
pub fn calculate_resize_dimensions(
    original_cols: u32,
    original_rows: u32,
    target_size: u32,
) -> (u32, u32) {
    let short_side = original_rows.min(original_cols);
    let long_side = original_rows.max(original_cols);

    if target_size >= long_side {
        return (original_cols, original_rows);
    }

    let scale_factor = target_size as f64 / long_side as f64;
    let new_short_side = ((short_side as f64 * scale_factor).round() as u32).max(1);

    if original_cols > original_rows {
        (target_size, new_short_side)
    } else {
        (new_short_side, target_size)
    }
}

pub fn resize_rgb_image(image: &RgbImage, target_cols: u32, target_rows: u32) -> Result<RgbImage> {
    let resize_options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();

    let src_image = Image::from_vec_u8(
        image.width(),
        image.height(),
        image.as_raw().clone(),
        PixelType::U8x3,
    )
    .map_err(Error::external)?;
    let mut dst_image = Image::new(target_cols, target_rows, PixelType::U8x3);
    resizer
        .resize(&src_image, &mut dst_image, &resize_options)
        .map_err(Error::external)?;

    RgbImage::from_raw(target_cols, target_rows, dst_image.into_vec())
        .ok_or_else(|| Error::External("resized buffer has unexpected length".to_string()))
}

/// RGB copy for landmark detection, downsampled when the long side exceeds `max_size`.
pub fn prepare_detection_image(rgb: RgbImage, max_size: u32) -> Result<(RgbImage, DetectionScale)> {
    let (cols, rows) = rgb.dimensions();
    let long_side = cols.max(rows);
    if max_size == 0 || long_side <= max_size {
        debug!("Detection at original size {}x{}", cols, rows);
        return Ok((rgb, DetectionScale::identity(cols, rows)));
    }

    let (new_cols, new_rows) = calculate_resize_dimensions(cols, rows, max_size);
    info!("Detection copy: {}x{} -> {}x{}", cols, rows, new_cols, new_rows);
    let resized = resize_rgb_image(&rgb, new_cols, new_rows)?;
    let scale = DetectionScale {
        scaled_width: new_cols,
        scaled_height: new_rows,
        factor: max_size as f64 / long_side as f64,
    };
    Ok((resized, scale))
}
