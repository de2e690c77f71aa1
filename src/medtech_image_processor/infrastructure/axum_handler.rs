use crate::application::error::ApplicationError;
use crate::application::phase_service::PhaseImagingService;
use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub phase_service: Arc<PhaseImagingService>,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

/// Raw multipart fields we care about; validation happens in the service.
#[derive(Default, Debug)]
pub struct ProcessUpload {
    pub image: Option<Vec<u8>>,
    pub phase: Option<String>,
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running",
        message: "MedTech Image Processor API",
        endpoints: BTreeMap::from([("/process", "POST - Process medical images")]),
    })
}

pub async fn process_image_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApplicationError> {
    // multipart でないリクエストは「画像なし」として扱う
    let upload = match multipart {
        Ok(multipart) => read_upload(multipart).await?,
        Err(rejection) => {
            tracing::debug!(%rejection, "request body is not multipart");
            ProcessUpload::default()
        }
    };

    let service = state.phase_service.clone();
    let encoded = tokio::task::spawn_blocking(move || {
        service.process_upload(upload.image.as_deref(), upload.phase.as_deref())
    })
    .await
    .map_err(anyhow::Error::from)??;

    Response::builder()
        .header(header::CONTENT_TYPE, encoded.content_type())
        .body(Body::from(encoded.data))
        .map_err(|e| ApplicationError::from(anyhow::Error::from(e)))
}

async fn read_upload(mut multipart: Multipart) -> Result<ProcessUpload, ApplicationError> {
    let mut upload = ProcessUpload::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(ApplicationError::UploadFailed)?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            // ファイル名のない "image" パートはファイルとして扱わない
            Some("image") if upload.image.is_none() && field.file_name().is_some() => {
                let data = field
                    .bytes()
                    .await
                    .map_err(ApplicationError::UploadFailed)?;
                upload.image = Some(data.to_vec());
            }
            Some("phase") if upload.phase.is_none() => {
                let text = field
                    .text()
                    .await
                    .map_err(ApplicationError::UploadFailed)?;
                upload.phase = Some(text);
            }
            other => tracing::debug!(field = ?other, "ignoring multipart field"),
        }
    }
    Ok(upload)
}
