use image::RgbImage;

use crate::domain::error::DomainError;

/// Non-empty 3-channel, 8-bit image owned by a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    pixels: RgbImage,
}

impl PixelGrid {
    pub fn new(pixels: RgbImage) -> Result<Self, DomainError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(DomainError::EmptyGrid { width, height });
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.pixels
    }

    /// Interleaved RGB samples, row-major. The slice length is fixed, so the
    /// grid keeps its dimensions whatever is written through it.
    pub fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_rgb(self) -> RgbImage {
        self.pixels
    }
}
