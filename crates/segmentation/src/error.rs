use std::path::PathBuf;
use thiserror::Error;

/// Rejected upload. Raised before the pipeline runs, so the model never sees it.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("No image file found in the request")]
    MissingFile,

    #[error("No selected file")]
    EmptyFilename,

    #[error("File is not a valid image: {0}")]
    InvalidImage(String),

    #[error(
        "Image resolution {width}x{height} does not match the model input resolution {expected_width}x{expected_height}"
    )]
    ResolutionMismatch {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
}

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("image has zero width or height")]
    EmptyImage,

    #[error("tensor must have 3 channels, got {0}")]
    ChannelCount(usize),
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("ONNX Runtime error: {0}")]
    Runtime(String),

    #[error("model produced no output named `{0}`")]
    MissingOutput(String),

    #[error("unexpected model output shape {0:?}")]
    OutputShape(Vec<usize>),

    #[error("target channel {channel} is out of range for {channels} output channels")]
    ChannelOutOfRange { channel: usize, channels: usize },
}

#[derive(Error, Debug)]
pub enum PostprocessError {
    #[error(
        "score map is {score_width}x{score_height} but the image is {image_width}x{image_height}"
    )]
    ShapeMismatch {
        image_width: u32,
        image_height: u32,
        score_width: usize,
        score_height: usize,
    },
}

/// Failure of one pipeline stage, tagged with the stage that raised it.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("model prediction failed: {0}")]
    Model(#[from] BackendError),

    #[error("postprocessing failed: {0}")]
    Postprocess(#[from] PostprocessError),
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("JPEG quality must be within 1..=100, got {0}")]
    Quality(u8),

    #[error("JPEG encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Fatal errors raised while bringing the model up. The process must not serve
/// requests after one of these.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("model file not found: {}", path.display())]
    ModelNotFound { path: PathBuf },

    #[error("failed to load model {}: {message}", path.display())]
    ModelLoad { path: PathBuf, message: String },

    #[error("model {} is incompatible: {message}", path.display())]
    IncompatibleModel { path: PathBuf, message: String },

    #[error("invalid model configuration: {0}")]
    Config(String),
}
