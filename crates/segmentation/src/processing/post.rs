use crate::{
    error::PostprocessError,
    types::{ColorFormat, Mask, Raster, ScoreMap},
};
use common::span;

/// Scores strictly above this value are classified as road.
pub const MASK_THRESHOLD: f32 = 0.5;

/// Pure green, in BGR processing order.
pub const HIGHLIGHT_BGR: [u8; 3] = [0, 255, 0];

const MASK_ON: u8 = 255;
const MASK_OFF: u8 = 0;

/// Binarize a score map. A cell is set iff its score is `> MASK_THRESHOLD`;
/// NaN scores are never set.
pub fn threshold(scores: &ScoreMap) -> Mask {
    let data = scores
        .view()
        .mapv(|score| if score > MASK_THRESHOLD { MASK_ON } else { MASK_OFF });
    Mask { data }
}

/// Paint every road pixel of `original` with the highlight color.
///
/// Works in BGR and hands the result back in RGB. Pixels outside the mask are
/// copied unchanged; pixels inside are replaced outright, without blending.
pub fn composite(original: &Raster, scores: &ScoreMap) -> Result<Raster, PostprocessError> {
    let _s = span!("composite");

    let (width, height) = original.dimensions();
    if scores.width() != width as usize || scores.height() != height as usize {
        return Err(PostprocessError::ShapeMismatch {
            image_width: width,
            image_height: height,
            score_width: scores.width(),
            score_height: scores.height(),
        });
    }

    let mask = threshold(scores);
    let mut overlay = original.to_format(ColorFormat::Bgr);

    for (px, bit) in overlay.pixels_mut().chunks_exact_mut(3).zip(mask.values()) {
        if bit != MASK_OFF {
            px.copy_from_slice(&HIGHLIGHT_BGR);
        }
    }

    tracing::debug!(
        width,
        height,
        road_pixels = mask.count(),
        "Composited road mask"
    );

    Ok(overlay.into_format(ColorFormat::Rgb))
}
