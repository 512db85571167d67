use crate::{
    error::{EncodeError, InputError},
    types::{ColorFormat, Raster},
};
use common::span;
use image::{ExtendedColorType, ImageEncoder, codecs::jpeg::JpegEncoder};

pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Decode an uploaded file into an RGB raster.
///
/// Any format the `image` crate can sniff from the bytes is accepted.
/// Grayscale, alpha and 16-bit inputs are converted to 8-bit RGB.
pub fn decode(bytes: &[u8]) -> Result<Raster, InputError> {
    let _s = span!("decode");

    if bytes.is_empty() {
        return Err(InputError::InvalidImage("file is empty".to_string()));
    }

    let image =
        image::load_from_memory(bytes).map_err(|e| InputError::InvalidImage(e.to_string()))?;

    tracing::trace!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "Decoded upload"
    );

    Ok(Raster::from_rgb_image(image.into_rgb8()))
}

/// Encode a raster as baseline JPEG, converting to RGB first if needed.
pub fn encode_jpeg(image: &Raster, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let _s = span!("encode_jpeg");

    if !(1..=100).contains(&quality) {
        return Err(EncodeError::Quality(quality));
    }

    let rgb;
    let image = match image.format() {
        ColorFormat::Rgb => image,
        ColorFormat::Bgr => {
            rgb = image.to_format(ColorFormat::Rgb);
            &rgb
        }
    };

    let mut jpeg_bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg_bytes, quality).write_image(
        image.pixels(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;

    Ok(jpeg_bytes)
}
