use std::sync::Arc;
use super::error::ApplicationError;

use crate::domain::encoded_image::EncodedImage;
use crate::domain::error::DomainError;
use crate::domain::image_processor_trait::ImageProcessor;
use crate::domain::phase::Phase;
use crate::domain::phase_transform::apply_phase;

/// Decode -> phase transform -> PNG encode for one upload.
pub struct PhaseImagingService {
    image_processor: Arc<dyn ImageProcessor + Send + Sync>, // トレイトオブジェクトとして保持
}

impl PhaseImagingService {
    pub fn new(image_processor: Arc<dyn ImageProcessor + Send + Sync>) -> Self {
        Self { image_processor }
    }

    /// Runs the whole pipeline synchronously. CPU bound; async callers should
    /// move it off the reactor.
    #[tracing::instrument(skip_all, fields(phase = %phase, input_bytes = image_data.len()))]
    pub fn process(&self, image_data: &[u8], phase: Phase) -> Result<EncodedImage, ApplicationError> {
        let grid = self.image_processor.decode(image_data)?;
        tracing::debug!(width = grid.width(), height = grid.height(), "decoded upload");

        let processed = apply_phase(phase, grid);
        let encoded = self.image_processor.encode(processed)?;

        tracing::info!(
            width = encoded.width,
            height = encoded.height,
            output_bytes = encoded.data.len(),
            "processed image"
        );
        Ok(encoded)
    }

    /// Validates the raw form fields in the order the API promises (image
    /// first, then phase) before running [`Self::process`].
    pub fn process_upload(
        &self,
        image_data: Option<&[u8]>,
        phase_field: Option<&str>,
    ) -> Result<EncodedImage, ApplicationError> {
        let image_data = image_data.ok_or(DomainError::MissingImage)?;
        let phase = Phase::parse_field(phase_field)?;
        self.process(image_data, phase)
    }
}
