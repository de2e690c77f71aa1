use crate::domain::encoded_image::EncodedImage;
use crate::domain::image_processor_trait::ImageProcessor;
use crate::domain::pixel_grid::PixelGrid;
use super::error::{DecodeFailure, InfrastructureError};
use image::ImageFormat as InnerImageFormat; // imageクレートの型
use std::io::Cursor;

// ドメイン層で定義した ImageProcessor トレイトを image クレートで実装する
pub struct DefaultImageProcessor;

impl DefaultImageProcessor {
    pub fn new() -> Self {
        Self
    }

    fn decode_rgb(image_bytes: &[u8]) -> Result<PixelGrid, DecodeFailure> {
        let reader = image::io::Reader::new(Cursor::new(image_bytes)).with_guessed_format()?;
        tracing::debug!(format = ?reader.format(), "decoding upload");
        // アルファ・グレースケール・16bit はすべて 8bit RGB にそろえる
        let rgb = reader.decode()?.to_rgb8();
        Ok(PixelGrid::new(rgb)?)
    }
}

impl Default for DefaultImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProcessor for DefaultImageProcessor {
    fn decode(&self, image_bytes: &[u8]) -> Result<PixelGrid, InfrastructureError> {
        Ok(Self::decode_rgb(image_bytes)?)
    }

    fn encode(&self, grid: PixelGrid) -> Result<EncodedImage, InfrastructureError> {
        let (width, height) = grid.dimensions();
        let mut buffer = Cursor::new(Vec::new());
        grid.into_rgb()
            .write_to(&mut buffer, InnerImageFormat::Png)
            .map_err(InfrastructureError::EncodeFailed)?;
        Ok(EncodedImage::new(buffer.into_inner(), width, height, InnerImageFormat::Png))
    }
}
