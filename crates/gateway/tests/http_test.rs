use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use gateway::{AppState, router};
use image::{ImageFormat, RgbImage};
use ndarray::{Array2, ArrayView3};
use segmentation::{
    BackendError, ScoreMap, SegmentationBackend, SegmentationService,
    codec::{self, DEFAULT_JPEG_QUALITY},
};
use serde_json::Value;
use std::{io::Cursor, sync::Arc};
use tower::ServiceExt;

const BOUNDARY: &str = "segmentation-test-boundary";
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Scores every pixel zero, so nothing is painted.
struct ZeroBackend;

impl SegmentationBackend for ZeroBackend {
    fn predict(&self, tensor: ArrayView3<'_, f32>) -> Result<ScoreMap, BackendError> {
        let (_, height, width) = tensor.dim();
        Ok(ScoreMap::new(Array2::zeros((height, width))))
    }
}

struct BrokenBackend;

impl SegmentationBackend for BrokenBackend {
    fn predict(&self, _tensor: ArrayView3<'_, f32>) -> Result<ScoreMap, BackendError> {
        Err(BackendError::Runtime("CUDA out of memory".to_string()))
    }
}

fn app_with(backend: impl SegmentationBackend + 'static, resolution: Option<(u32, u32)>) -> Router {
    app_with_limit(backend, resolution, MAX_UPLOAD_BYTES)
}

fn app_with_limit(
    backend: impl SegmentationBackend + 'static,
    resolution: Option<(u32, u32)>,
    max_upload_bytes: usize,
) -> Router {
    let backend: Box<dyn SegmentationBackend> = Box::new(backend);
    let service = SegmentationService::new(backend).with_input_resolution(resolution);
    let state = AppState::new(Arc::new(service), DEFAULT_JPEG_QUALITY);
    router(state, max_upload_bytes)
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    match filename {
        Some(filename) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n").as_bytes(),
        ),
    }
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn segment_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/segment")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn error_message(response: Response) -> String {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    json["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_segment_returns_jpeg_overlay() {
    let png = png_bytes(256, 256);
    let app = app_with(ZeroBackend, None);

    let response = app
        .oneshot(segment_request(multipart_body("image", Some("road.png"), &png)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let expected = codec::encode_jpeg(&codec::decode(&png).unwrap(), DEFAULT_JPEG_QUALITY).unwrap();
    assert_eq!(
        body.as_ref(),
        expected.as_slice(),
        "An all-zero mask should return the re-encoded upload"
    );

    let returned = image::load_from_memory(&body).unwrap();
    assert_eq!((returned.width(), returned.height()), (256, 256));
}

#[tokio::test]
async fn test_missing_image_field() {
    let app = app_with(ZeroBackend, None);

    let response = app
        .oneshot(segment_request(multipart_body(
            "photo",
            Some("road.png"),
            &png_bytes(8, 8),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(response).await,
        "No image file found in the request"
    );
}

#[tokio::test]
async fn test_image_field_without_file() {
    let app = app_with(ZeroBackend, None);

    let response = app
        .oneshot(segment_request(multipart_body("image", None, b"not a file")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(response).await,
        "No image file found in the request"
    );
}

#[tokio::test]
async fn test_non_multipart_request() {
    let app = app_with(ZeroBackend, None);

    let request = Request::builder()
        .method("POST")
        .uri("/segment")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(response).await,
        "No image file found in the request"
    );
}

#[tokio::test]
async fn test_empty_filename() {
    let app = app_with(ZeroBackend, None);

    let response = app
        .oneshot(segment_request(multipart_body("image", Some(""), &png_bytes(8, 8))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "No selected file");
}

#[tokio::test]
async fn test_text_file_is_rejected() {
    let app = app_with(ZeroBackend, None);

    let response = app
        .oneshot(segment_request(multipart_body(
            "image",
            Some("notes.txt"),
            b"this is definitely not an image",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let message = error_message(response).await;
    assert!(
        message.starts_with("File is not a valid image"),
        "unexpected message: {message}"
    );
}

#[tokio::test]
async fn test_backend_failure_is_server_error() {
    let app = app_with(BrokenBackend, None);

    let response = app
        .oneshot(segment_request(multipart_body(
            "image",
            Some("road.png"),
            &png_bytes(32, 32),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let message = error_message(response).await;
    assert!(message.starts_with("Segmentation failed"), "{message}");
    assert!(message.contains("CUDA out of memory"), "{message}");
}

#[tokio::test]
async fn test_resolution_mismatch() {
    let app = app_with(ZeroBackend, Some((512, 512)));

    let response = app
        .oneshot(segment_request(multipart_body(
            "image",
            Some("road.png"),
            &png_bytes(256, 256),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(response).await,
        "Image resolution 256x256 does not match the model input resolution 512x512"
    );
}

#[tokio::test]
async fn test_upload_over_limit() {
    let app = app_with_limit(ZeroBackend, None, 1024);

    let response = app
        .oneshot(segment_request(multipart_body(
            "image",
            Some("road.png"),
            &vec![0u8; 64 * 1024],
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_health() {
    let app = app_with(ZeroBackend, None);

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_get_segment_not_allowed() {
    let app = app_with(ZeroBackend, None);

    let request = Request::builder()
        .uri("/segment")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
