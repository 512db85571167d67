use image::RgbImage;
use ndarray::Array2;

/// Channel order of a [`Raster`]. `Rgb` is the display order used for decoding
/// and encoding; `Bgr` is the processing order used by the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    Rgb,
    Bgr,
}

/// 8-bit, 3-channel, row-major image owned by a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    format: ColorFormat,
    pixels: Vec<u8>,
}

impl Raster {
    /// Wraps interleaved pixel data. Returns `None` when the buffer length does
    /// not match `width * height * 3`.
    pub fn from_raw(width: u32, height: u32, format: ColorFormat, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(3)?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    pub fn filled(width: u32, height: u32, format: ColorFormat, pixel: [u8; 3]) -> Self {
        let pixels = pixel
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            format,
            pixels,
        }
    }

    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            format: ColorFormat::Rgb,
            pixels: image.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Pixel at `(x, y)` in this raster's own channel order.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        Some([
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
        ])
    }

    pub fn to_format(&self, format: ColorFormat) -> Raster {
        self.clone().into_format(format)
    }

    /// Reorders channels in place. RGB and BGR differ only by swapping the
    /// first and last channel, so the conversion is lossless both ways.
    pub fn into_format(mut self, format: ColorFormat) -> Raster {
        if self.format != format {
            for px in self.pixels.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            self.format = format;
        }
        self
    }
}

/// Per-pixel model scores over the image grid, indexed `[y, x]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMap {
    scores: Array2<f32>,
}

impl ScoreMap {
    pub fn new(scores: Array2<f32>) -> Self {
        Self { scores }
    }

    pub fn filled(width: u32, height: u32, score: f32) -> Self {
        Self::new(Array2::from_elem((height as usize, width as usize), score))
    }

    pub fn width(&self) -> usize {
        self.scores.ncols()
    }

    pub fn height(&self) -> usize {
        self.scores.nrows()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        self.scores.get([y, x]).copied()
    }

    pub fn view(&self) -> ndarray::ArrayView2<'_, f32> {
        self.scores.view()
    }
}

/// Binary road mask; each cell is either 0 or 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pub(crate) data: Array2<u8>,
}

impl Mask {
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.data.get([y, x]).is_some_and(|v| *v != 0)
    }

    /// Number of set pixels
    pub fn count(&self) -> usize {
        self.data.iter().filter(|v| **v != 0).count()
    }

    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        self.data.iter().copied()
    }
}
