pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod processing;
pub mod service;
pub mod types;

// Re-export commonly used types for convenience
pub use backend::SegmentationBackend;
pub use config::{Device, ModelConfig};
pub use error::{
    BackendError, EncodeError, InferenceError, InputError, PostprocessError, PreprocessError,
    StartupError,
};
pub use service::SegmentationService;
pub use types::{ColorFormat, Mask, Raster, ScoreMap};
