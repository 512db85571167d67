use crate::metrics::Metrics;
use segmentation::{SegmentationBackend, SegmentationService};
use std::sync::Arc;

/// The loaded model, shared read-only by every request.
pub type SharedService = Arc<SegmentationService<Box<dyn SegmentationBackend>>>;

#[derive(Clone)]
pub struct AppState {
    pub service: SharedService,
    pub jpeg_quality: u8,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(service: SharedService, jpeg_quality: u8) -> Self {
        Self {
            service,
            jpeg_quality,
            metrics: Metrics::new("gateway"),
        }
    }
}
