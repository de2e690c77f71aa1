use crate::domain::encoded_image::EncodedImage;
use crate::domain::pixel_grid::PixelGrid;
use crate::infrastructure::error::InfrastructureError;

// 画像のデコード/エンコードを抽象化する。ピクセル変換そのものはドメイン側 (phase_transform) に置く
#[cfg_attr(test, mockall::automock)]
pub trait ImageProcessor {
    /// Decodes an uploaded raster (format guessed from content) into a
    /// 3-channel grid.
    fn decode(&self, image_bytes: &[u8]) -> Result<PixelGrid, InfrastructureError>;

    /// Serializes the grid as PNG.
    fn encode(&self, grid: PixelGrid) -> Result<EncodedImage, InfrastructureError>;
}
