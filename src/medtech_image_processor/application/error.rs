use axum::extract::multipart::MultipartError;
use thiserror::Error;
use crate::domain::error::DomainError; // 入力検証エラーをラップするため
use crate::infrastructure::error::InfrastructureError; // デコード/エンコード失敗をラップするため

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Failed to read upload: {}", .0.body_text())]
    UploadFailed(#[source] MultipartError),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error(transparent)]
    DomainError(#[from] DomainError), // ドメインエラーをラップ

    #[error(transparent)]
    InfrastructureError(#[from] InfrastructureError), // InfrastructureError をラップ

    #[error("{source}")]
    Unexpected {
        #[from]
        source: anyhow::Error,
    },
}

// IntoResponse implementation for ApplicationError
use axum::response::{IntoResponse, Response};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

impl ApplicationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // ボディ上限超過は 413、壊れたストリームは 400
            ApplicationError::UploadFailed(err) => err.status(),
            ApplicationError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApplicationError::DomainError(_) => StatusCode::BAD_REQUEST,
            ApplicationError::InfrastructureError(infra_err) => match infra_err {
                InfrastructureError::InvalidImage(_) => StatusCode::BAD_REQUEST,
                InfrastructureError::EncodeFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApplicationError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApplicationError::InfrastructureError(InfrastructureError::InvalidImage(cause)) => {
                tracing::info!(%cause, "rejected upload");
            }
            ApplicationError::InfrastructureError(InfrastructureError::EncodeFailed(cause)) => {
                tracing::error!(%cause, "PNG encoding failed");
            }
            ApplicationError::DomainError(DomainError::InvalidPhase(raw)) => {
                tracing::info!(phase = %raw, "rejected invalid phase");
            }
            ApplicationError::Unexpected { source } => {
                tracing::error!(error = ?source, "unexpected failure while processing");
            }
            other if status.is_client_error() => tracing::info!(error = %other, "bad request"),
            other => tracing::error!(error = %other, "request failed"),
        }
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::error::DecodeFailure;

    #[test]
    fn test_client_errors_keep_their_exact_messages() {
        let cases = [
            (ApplicationError::from(DomainError::MissingImage), "No image file provided"),
            (
                ApplicationError::from(DomainError::InvalidPhase("xyz".into())),
                "Invalid phase. Use 'arterial' or 'venous'",
            ),
            (
                ApplicationError::from(InfrastructureError::InvalidImage(DecodeFailure::Empty(
                    DomainError::EmptyGrid { width: 0, height: 0 },
                ))),
                "Invalid image file",
            ),
        ];
        for (err, message) in cases {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(err.to_string(), message);
        }
    }

    #[tokio::test]
    async fn test_invalid_phase_response_hides_the_raw_value() {
        let err = ApplicationError::from(DomainError::InvalidPhase("capillary".into()));
        match &err {
            ApplicationError::DomainError(DomainError::InvalidPhase(raw)) => assert_eq!(raw, "capillary"),
            e => panic!("Expected InvalidPhase, got {:?}", e),
        }

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Invalid phase. Use 'arterial' or 'venous'");
    }

    #[test]
    fn test_server_errors() {
        let encode = ApplicationError::from(InfrastructureError::EncodeFailed(
            image::ImageError::Unsupported(image::error::UnsupportedError::from_format_and_kind(
                image::error::ImageFormatHint::Exact(image::ImageFormat::Png),
                image::error::UnsupportedErrorKind::GenericFeature("test".into()),
            )),
        ));
        assert_eq!(encode.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(encode.to_string(), "Failed to encode processed image");

        let unexpected = ApplicationError::from(anyhow::anyhow!("worker panicked"));
        assert_eq!(unexpected.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(unexpected.to_string(), "worker panicked");
    }
}
