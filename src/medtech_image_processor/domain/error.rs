use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("No image file provided")]
    MissingImage,

    #[error("Invalid phase. Use 'arterial' or 'venous'")]
    InvalidPhase(String), // 受け取った値 (ログ用)

    #[error("Pixel grid must be non-empty, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
}
