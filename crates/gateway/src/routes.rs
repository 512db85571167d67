use crate::{
    error::ApiError,
    state::{AppState, SharedService},
    upload::read_image_field,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, State,
        multipart::{Multipart, MultipartRejection},
    },
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use segmentation::codec;
use serde::Serialize;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/segment", post(segment_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn segment_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let start = Instant::now();

    match segment(&state, multipart).await {
        Ok(jpeg) => {
            state.metrics.record("ok", start.elapsed());
            ([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response()
        }
        Err(e) => {
            if e.status().is_server_error() {
                tracing::error!(error = %e, "Segmentation request failed");
            } else {
                tracing::warn!(error = %e, "Rejected segmentation request");
            }
            state.metrics.record(e.outcome(), start.elapsed());
            e.into_response()
        }
    }
}

#[tracing::instrument(skip_all, fields(filename = tracing::field::Empty, bytes = tracing::field::Empty))]
async fn segment(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Vec<u8>, ApiError> {
    let upload = read_image_field(multipart).await?;

    let span = tracing::Span::current();
    span.record("filename", upload.filename.as_str());
    span.record("bytes", upload.bytes.len());

    let service = state.service.clone();
    let quality = state.jpeg_quality;

    // Decoding, inference and encoding are all CPU bound
    tokio::task::spawn_blocking(move || {
        span.in_scope(|| run_pipeline(&service, &upload.bytes, quality))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
}

/// Decode, segment and re-encode one upload.
pub fn run_pipeline(
    service: &SharedService,
    bytes: &Bytes,
    quality: u8,
) -> Result<Vec<u8>, ApiError> {
    let image = codec::decode(bytes)?;
    service.check_input(&image)?;

    let overlay = service.segment(&image)?;

    codec::encode_jpeg(&overlay, quality).map_err(|e| ApiError::Internal(e.to_string()))
}
