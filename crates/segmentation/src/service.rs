use crate::{
    backend::SegmentationBackend,
    error::{InferenceError, InputError},
    processing::{composite, prepare},
    types::Raster,
};
use std::time::Instant;

/// Runs the road segmentation pipeline: `prepare` -> `predict` -> `composite`.
///
/// Holds nothing but the shared backend and the optional fixed resolution, so
/// one instance serves every request concurrently.
pub struct SegmentationService<B: SegmentationBackend> {
    backend: B,
    input_resolution: Option<(u32, u32)>,
}

impl<B: SegmentationBackend> SegmentationService<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            input_resolution: None,
        }
    }

    /// Require every image to be exactly `width x height`.
    pub fn with_input_resolution(mut self, resolution: Option<(u32, u32)>) -> Self {
        self.input_resolution = resolution;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn input_resolution(&self) -> Option<(u32, u32)> {
        self.input_resolution
    }

    /// Reject images the model cannot take before any work is done.
    pub fn check_input(&self, image: &Raster) -> Result<(), InputError> {
        match self.input_resolution {
            Some((expected_width, expected_height))
                if image.dimensions() != (expected_width, expected_height) =>
            {
                Err(InputError::ResolutionMismatch {
                    width: image.width(),
                    height: image.height(),
                    expected_width,
                    expected_height,
                })
            }
            _ => Ok(()),
        }
    }

    /// Highlight the road pixels of `image`.
    ///
    /// The first failing stage aborts the call and is reported as a tagged
    /// [`InferenceError`]; nothing is retried and no partial result escapes.
    pub fn segment(&self, image: &Raster) -> Result<Raster, InferenceError> {
        let span = tracing::info_span!(
            "segment",
            width = image.width(),
            height = image.height()
        );
        let _enter = span.enter();

        let start = Instant::now();

        let tensor = prepare(image)?;

        let scores = {
            let _infer_span = tracing::info_span!("model_inference").entered();
            self.backend.predict(tensor.view())?
        };

        let overlay = composite(image, &scores)?;

        tracing::debug!(
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Segmentation complete"
        );

        Ok(overlay)
    }
}
