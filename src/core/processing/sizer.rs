use tracing::debug;

use crate::core::config::MosaicConfig;

/// Images whose long side is below this always get the minimum block size.
pub const SMALL_IMAGE_LONG_SIDE: u32 = 400;

/// Compliant mosaic block size for an image of `width` x `height`.
///
/// `max(min_size, floor(long_side * scale_factor))`, or `min_size` outright when
/// the long side is under [`SMALL_IMAGE_LONG_SIDE`].
pub fn mosaic_size(width: u32, height: u32, config: &MosaicConfig) -> u32 {
    let min_size = config.min_size.max(1);
    let long_side = width.max(height);
    if long_side < SMALL_IMAGE_LONG_SIDE {
        return min_size;
    }

    // Integer division keeps 0.01 from drifting below a whole block (700 * 0.01 != 7.0)
    let per_block = (1.0 / config.scale_factor).round().max(1.0) as u32;
    let size = (long_side / per_block).max(min_size);
    debug!("Image size: {}x{}, mosaic size: {}", width, height, size);
    size
}
