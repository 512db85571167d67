use crate::error::StartupError;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "models/road_segmentation.onnx";

/// Compute device the model is bound to. Resolved once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
    /// CUDA when the runtime can provide it, CPU otherwise
    #[default]
    Auto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub device: Device,
    #[serde(default)]
    pub device_id: i32,
    #[serde(default = "default_input_name")]
    pub input_name: String,
    #[serde(default = "default_output_name")]
    pub output_name: String,
    /// Output channel holding the road score when the model emits several
    #[serde(default)]
    pub target_channel: usize,
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
    #[serde(default)]
    pub input_width: Option<u32>,
    #[serde(default)]
    pub input_height: Option<u32>,
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

fn default_input_name() -> String {
    "input".to_string()
}

fn default_output_name() -> String {
    "output".to_string()
}

fn default_intra_threads() -> usize {
    4
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            device: Device::default(),
            device_id: 0,
            input_name: default_input_name(),
            output_name: default_output_name(),
            target_channel: 0,
            intra_threads: default_intra_threads(),
            input_width: None,
            input_height: None,
        }
    }
}

impl ModelConfig {
    /// Fixed `(width, height)` the model requires, if one is configured.
    ///
    /// Width and height must be set together and be non-zero.
    pub fn input_resolution(&self) -> Result<Option<(u32, u32)>, StartupError> {
        match (self.input_width, self.input_height) {
            (None, None) => Ok(None),
            (Some(w), Some(h)) if w > 0 && h > 0 => Ok(Some((w, h))),
            (Some(_), Some(_)) => Err(StartupError::Config(
                "input_width and input_height must be greater than zero".to_string(),
            )),
            _ => Err(StartupError::Config(
                "input_width and input_height must be set together".to_string(),
            )),
        }
    }

    pub fn validate(&self) -> Result<(), StartupError> {
        if self.intra_threads == 0 {
            return Err(StartupError::Config(
                "intra_threads must be at least 1".to_string(),
            ));
        }
        if self.input_name.is_empty() || self.output_name.is_empty() {
            return Err(StartupError::Config(
                "input_name and output_name must not be empty".to_string(),
            ));
        }
        self.input_resolution().map(|_| ())
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            path: PathBuf::from("/models/model.onnx"),
            ..Self::default()
        }
    }
}
