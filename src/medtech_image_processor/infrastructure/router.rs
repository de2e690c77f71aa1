use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header::HeaderName, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::axum_handler::{health_handler, process_image_handler, AppState};
use super::config::ServerConfig;

/// Builds the application router: health check, processing endpoint,
/// permissive CORS, request tracing and the upload size limit.
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(vec![HeaderName::from_static("content-type")]);

    Router::new()
        .route("/", get(health_handler))
        .route("/process", post(process_image_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::phase_service::PhaseImagingService;
    use crate::infrastructure::image_processor::DefaultImageProcessor;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tower::ServiceExt;

    const BOUNDARY: &str = "medtech-test-boundary";

    enum Part<'a> {
        File { name: &'a str, filename: &'a str, data: &'a [u8] },
        Text { name: &'a str, value: &'a str },
    }

    fn app() -> Router {
        app_with(&ServerConfig::default())
    }

    fn app_with(config: &ServerConfig) -> Router {
        let service = Arc::new(PhaseImagingService::new(Arc::new(DefaultImageProcessor::new())));
        let state = Arc::new(AppState { phase_service: service });
        build_router(state, config)
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File { name, filename, data } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
                Part::Text { name, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}").as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn process_request(parts: &[Part<'_>]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/process")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    fn png_bytes(image: &RgbImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        hyper::body::to_bytes(response.into_body()).await.unwrap().to_vec()
    }

    async fn error_message(response: axum::response::Response) -> String {
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        json["error"].as_str().unwrap().to_string()
    }

    fn luma_std_dev(image: &DynamicImage) -> f64 {
        let luma = image.to_luma8();
        let n = luma.as_raw().len() as f64;
        let mean = luma.as_raw().iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let var = luma.as_raw().iter().map(|&v| (f64::from(v) - mean).powi(2)).sum::<f64>() / n;
        var.sqrt()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["message"], "MedTech Image Processor API");
        assert_eq!(json["endpoints"]["/process"], "POST - Process medical images");
    }

    #[tokio::test]
    async fn test_solid_gray_venous_stays_uniform() {
        let upload = png_bytes(&RgbImage::from_pixel(100, 100, Rgb([128, 128, 128])));
        let request = process_request(&[
            Part::File { name: "image", filename: "gray.png", data: &upload },
            Part::Text { name: "phase", value: "venous" },
        ]);
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        let output = image::load_from_memory(&body_bytes(response).await).unwrap().to_rgb8();
        assert_eq!(output.dimensions(), (100, 100));
        for pixel in output.pixels() {
            for c in pixel.0 {
                assert!(c.abs_diff(128) <= 1, "got {c}");
            }
        }
    }

    #[tokio::test]
    async fn test_low_contrast_arterial_increases_luminance_spread() {
        let source = RgbImage::from_fn(256, 256, |x, y| {
            let v = 118 + ((x * 31 + y * 17) % 21) as u8;
            Rgb([v, v, v.saturating_add(3)])
        });
        let request = process_request(&[
            Part::File { name: "image", filename: "flat.png", data: &png_bytes(&source) },
            Part::Text { name: "phase", value: "arterial" },
        ]);
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let output = image::load_from_memory(&body_bytes(response).await).unwrap();
        assert_eq!((output.width(), output.height()), (256, 256));
        assert!(luma_std_dev(&output) > luma_std_dev(&DynamicImage::ImageRgb8(source)));
    }

    #[tokio::test]
    async fn test_phase_defaults_to_arterial() {
        let upload = png_bytes(&RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 0])));
        let response = app()
            .oneshot(process_request(&[Part::File { name: "image", filename: "a.png", data: &upload }]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_image_is_rejected() {
        let response = app()
            .oneshot(process_request(&[Part::Text { name: "phase", value: "venous" }]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(response).await, "No image file provided");
    }

    #[tokio::test]
    async fn test_image_part_without_filename_counts_as_missing_image() {
        let response = app()
            .oneshot(process_request(&[
                Part::Text { name: "image", value: "not a file" },
                Part::Text { name: "phase", value: "venous" },
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(response).await, "No image file provided");
    }

    #[tokio::test]
    async fn test_upload_over_body_limit_is_payload_too_large() {
        let config = ServerConfig { max_upload_bytes: 1024, ..ServerConfig::default() };
        let data = vec![0u8; 4096];
        let response = app_with(&config)
            .oneshot(process_request(&[Part::File { name: "image", filename: "big.png", data: &data }]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(error_message(response).await.starts_with("Failed to read upload"));
    }

    #[tokio::test]
    async fn test_non_multipart_body_counts_as_missing_image() {
        let request = Request::builder()
            .method("POST")
            .uri("/process")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(response).await, "No image file provided");
    }

    #[tokio::test]
    async fn test_invalid_phase_is_rejected() {
        let upload = png_bytes(&RgbImage::new(4, 4));
        for phase in ["xyz", "", "capillary"] {
            let response = app()
                .oneshot(process_request(&[
                    Part::File { name: "image", filename: "a.png", data: &upload },
                    Part::Text { name: "phase", value: phase },
                ]))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(error_message(response).await, "Invalid phase. Use 'arterial' or 'venous'");
        }
    }

    #[tokio::test]
    async fn test_garbage_upload_is_rejected() {
        let response = app()
            .oneshot(process_request(&[
                Part::File { name: "image", filename: "scan.jpg", data: b"not really a jpeg" },
                Part::Text { name: "phase", value: "venous" },
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(response).await, "Invalid image file");
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let request = Request::builder()
            .uri("/")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
