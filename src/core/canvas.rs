use image::{DynamicImage, RgbImage, RgbaImage};

/// Decoded source image. Alpha is kept when the source has it.
#[derive(Debug, Clone, PartialEq)]
pub enum Canvas {
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

/// Mutable view over interleaved 8-bit pixels.
pub struct PixelsMut<'a> {
    pub data: &'a mut [u8],
    pub width: u32,
    pub height: u32,
    pub channels: usize,
}

impl PixelsMut<'_> {
    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels
    }
}

impl Canvas {
    pub fn from_dynamic(img: DynamicImage) -> Self {
        if img.color().has_alpha() {
            Canvas::Rgba(img.into_rgba8())
        } else {
            Canvas::Rgb(img.into_rgb8())
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            Canvas::Rgb(img) => img.width(),
            Canvas::Rgba(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Canvas::Rgb(img) => img.height(),
            Canvas::Rgba(img) => img.height(),
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            Canvas::Rgb(_) => 3,
            Canvas::Rgba(_) => 4,
        }
    }

    pub fn raw(&self) -> &[u8] {
        match self {
            Canvas::Rgb(img) => img.as_raw(),
            Canvas::Rgba(img) => img.as_raw(),
        }
    }

    pub fn pixels_mut(&mut self) -> PixelsMut<'_> {
        let (width, height, channels) = (self.width(), self.height(), self.channels());
        let data: &mut [u8] = match self {
            Canvas::Rgb(img) => &mut **img,
            Canvas::Rgba(img) => &mut **img,
        };
        PixelsMut {
            data,
            width,
            height,
            channels,
        }
    }

    /// RGB copy for the landmark provider.
    pub fn to_rgb(&self) -> RgbImage {
        match self {
            Canvas::Rgb(img) => img.clone(),
            Canvas::Rgba(img) => DynamicImage::ImageRgba8(img.clone()).into_rgb8(),
        }
    }
}
