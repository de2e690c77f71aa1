pub mod clahe;
pub mod color_space;
pub mod encoded_image;
pub mod error;
pub mod gaussian;
pub mod image_processor_trait;
pub mod phase;
pub mod phase_transform;
pub mod pixel_grid;
