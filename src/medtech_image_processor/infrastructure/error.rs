use thiserror::Error;
use crate::domain::error::DomainError; // 空画像はデコード失敗として扱う

#[derive(Error, Debug)]
pub enum InfrastructureError {
    // 形式判定・デコード・空画像のどれで失敗しても利用者へのメッセージは同じ
    #[error("Invalid image file")]
    InvalidImage(#[from] DecodeFailure),

    #[error("Failed to encode processed image")]
    EncodeFailed(#[source] image::ImageError),
}

/// Underlying reason an upload could not be turned into a pixel grid. Only
/// logged, never shown to the client.
#[derive(Error, Debug)]
pub enum DecodeFailure {
    #[error("could not sniff image format: {0}")]
    Io(#[from] std::io::Error),

    #[error("image library rejected the data: {0}")]
    ImageLib(#[from] image::ImageError),

    #[error(transparent)]
    Empty(#[from] DomainError),
}
