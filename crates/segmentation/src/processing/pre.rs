use crate::{
    error::PreprocessError,
    types::{ColorFormat, Raster},
};
use common::span;
use ndarray::{Array3, ArrayView3, Axis};
use std::borrow::Cow;

/// ImageNet statistics, in RGB channel order.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Convert an image into the `[3, H, W]` tensor the network expects.
///
/// Channels are reordered to RGB, scaled to `0.0..=1.0`, then normalized with
/// the ImageNet mean and standard deviation. No resizing happens here: the
/// tensor keeps the image's native resolution.
pub fn prepare(image: &Raster) -> Result<Array3<f32>, PreprocessError> {
    let _s = span!("prepare");

    if image.width() == 0 || image.height() == 0 {
        return Err(PreprocessError::EmptyImage);
    }

    let rgb = match image.format() {
        ColorFormat::Rgb => Cow::Borrowed(image),
        ColorFormat::Bgr => Cow::Owned(image.to_format(ColorFormat::Rgb)),
    };

    let width = rgb.width() as usize;
    let height = rgb.height() as usize;

    let mut tensor = Array3::<f32>::zeros((3, height, width));

    for (i, px) in rgb.pixels().chunks_exact(3).enumerate() {
        let (y, x) = (i / width, i % width);
        for c in 0..3 {
            let value = px[c] as f32 / 255.0;
            tensor[[c, y, x]] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    tracing::trace!(width, height, "Prepared input tensor");

    Ok(tensor)
}

/// Invert [`prepare`]: denormalize a `[3, H, W]` tensor back into an RGB raster.
///
/// Values are rounded to the nearest integer and clamped to `0..=255`.
pub fn restore(tensor: ArrayView3<'_, f32>) -> Result<Raster, PreprocessError> {
    let (channels, height, width) = tensor.dim();
    if channels != 3 {
        return Err(PreprocessError::ChannelCount(channels));
    }
    if height == 0 || width == 0 {
        return Err(PreprocessError::EmptyImage);
    }

    let mut pixels = vec![0u8; height * width * 3];
    for (c, plane) in tensor.axis_iter(Axis(0)).enumerate() {
        for (i, v) in plane.iter().enumerate() {
            let value = (v * IMAGENET_STD[c] + IMAGENET_MEAN[c]) * 255.0;
            pixels[i * 3 + c] = value.round().clamp(0.0, 255.0) as u8;
        }
    }

    Raster::from_raw(width as u32, height as u32, ColorFormat::Rgb, pixels)
        .ok_or(PreprocessError::EmptyImage)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test output layout is channel-first with native resolution
    #[test]
    fn test_prepare_shape() {
        let image = Raster::filled(7, 5, ColorFormat::Rgb, [128, 128, 128]);
        let tensor = prepare(&image).unwrap();
        assert_eq!(tensor.shape(), &[3, 5, 7], "Tensor should be [3, H, W]");
    }

    /// Test ImageNet normalization is applied
    #[test]
    fn test_imagenet_normalization() {
        // Mid gray 128 = 0.502 after scaling
        let image = Raster::filled(2, 2, ColorFormat::Rgb, [128, 128, 128]);
        let tensor = prepare(&image).unwrap();

        // R: (0.502 - 0.485) / 0.229 = 0.0741
        // G: (0.502 - 0.456) / 0.224 = 0.2052
        // B: (0.502 - 0.406) / 0.225 = 0.4265
        let r = tensor[[0, 1, 1]];
        let g = tensor[[1, 1, 1]];
        let b = tensor[[2, 1, 1]];

        assert!((r - 0.0741).abs() < 1e-3, "R channel should be ~0.0741 (got {})", r);
        assert!((g - 0.2052).abs() < 1e-3, "G channel should be ~0.2052 (got {})", g);
        assert!((b - 0.4265).abs() < 1e-3, "B channel should be ~0.4265 (got {})", b);
    }

    /// Test BGR input ends up in RGB channel order
    #[test]
    fn test_bgr_input_is_reordered() {
        let rgb = Raster::from_raw(
            2,
            1,
            ColorFormat::Rgb,
            vec![
                255, 0, 0, // Red pixel
                0, 0, 255, // Blue pixel
            ],
        )
        .unwrap();
        let bgr = rgb.to_format(ColorFormat::Bgr);

        let from_rgb = prepare(&rgb).unwrap();
        let from_bgr = prepare(&bgr).unwrap();
        assert_eq!(from_rgb, from_bgr, "Tensor should not depend on input order");

        let red = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        assert!((from_rgb[[0, 0, 0]] - red).abs() < 1e-6);
    }

    #[test]
    fn test_row_major_layout() {
        // 3x2 image where each pixel's red value encodes its position
        let pixels = (0u8..6).flat_map(|i| [i * 40, 0, 0]).collect();
        let image = Raster::from_raw(3, 2, ColorFormat::Rgb, pixels).unwrap();
        let tensor = prepare(&image).unwrap();

        let expected = (120.0 / 255.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        // Pixel index 3 is (x=0, y=1)
        assert!((tensor[[0, 1, 0]] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_empty_image_rejected() {
        let image = Raster::from_raw(0, 4, ColorFormat::Rgb, vec![]).unwrap();
        assert!(matches!(prepare(&image), Err(PreprocessError::EmptyImage)));
    }

    /// Normalization round trip recovers every pixel value
    #[test]
    fn test_prepare_restore_roundtrip() {
        let pixels: Vec<u8> = (0..16 * 16 * 3).map(|i| (i * 7 % 256) as u8).collect();
        let image = Raster::from_raw(16, 16, ColorFormat::Rgb, pixels).unwrap();

        let tensor = prepare(&image).unwrap();
        let restored = restore(tensor.view()).unwrap();
        assert_eq!(restored, image);

        let bgr = image.to_format(ColorFormat::Bgr);
        let restored = restore(prepare(&bgr).unwrap().view()).unwrap();
        assert_eq!(restored.into_format(ColorFormat::Bgr), bgr);
    }

    #[test]
    fn test_restore_rejects_wrong_channel_count() {
        let tensor = Array3::<f32>::zeros((1, 2, 2));
        assert!(matches!(
            restore(tensor.view()),
            Err(PreprocessError::ChannelCount(1))
        ));
    }
}
