use super::{SegmentationBackend, check_model_io, reduce_output};
use crate::{
    config::{Device, ModelConfig},
    error::{BackendError, StartupError},
    types::ScoreMap,
};
use ndarray::{Array3, ArrayView3, Axis};
use ort::{
    execution_providers::CUDAExecutionProvider,
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use parking_lot::Mutex;
use std::path::Path;

impl From<ort::Error> for BackendError {
    fn from(err: ort::Error) -> Self {
        BackendError::Runtime(err.to_string())
    }
}

/// ONNX Runtime session holding the road segmentation network.
///
/// ONNX Runtime needs exclusive access to a session while it runs, so
/// concurrent `predict` calls queue on the mutex. The weights themselves are
/// never touched after [`OrtBackend::load`].
pub struct OrtBackend {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    target_channel: usize,
}

impl OrtBackend {
    /// Load the model once at startup.
    ///
    /// When the configuration pins an input resolution, a zero tensor of that
    /// size is pushed through the graph so an incompatible model fails here
    /// rather than on the first request.
    pub fn load(config: &ModelConfig) -> Result<Self, StartupError> {
        config.validate()?;

        let path = config.path.as_path();
        if !path.is_file() {
            return Err(StartupError::ModelNotFound {
                path: path.to_path_buf(),
            });
        }

        let session = build_session(path, config).map_err(|e| StartupError::ModelLoad {
            path: path.to_path_buf(),
            message: format!("{:#}", e),
        })?;

        {
            let inputs: Vec<&str> = session.inputs().iter().map(|i| i.name()).collect();
            let outputs: Vec<&str> = session.outputs().iter().map(|o| o.name()).collect();
            check_model_io(&inputs, &outputs, &config.input_name, &config.output_name).map_err(
                |message| StartupError::IncompatibleModel {
                    path: path.to_path_buf(),
                    message,
                },
            )?;
        }

        let backend = Self {
            session: Mutex::new(session),
            input_name: config.input_name.clone(),
            output_name: config.output_name.clone(),
            target_channel: config.target_channel,
        };

        if let Some((width, height)) = config.input_resolution()? {
            let probe = Array3::<f32>::zeros((3, height as usize, width as usize));
            backend
                .predict(probe.view())
                .map_err(|e| StartupError::IncompatibleModel {
                    path: path.to_path_buf(),
                    message: format!("rejected a {width}x{height} input: {e}"),
                })?;
            tracing::info!(width, height, "Model accepted probe input");
        }

        tracing::info!(path = %path.display(), "Model loaded");
        Ok(backend)
    }
}

fn build_session(path: &Path, config: &ModelConfig) -> anyhow::Result<Session> {
    // Initialize ORT environment (idempotent)
    let _ = ort::init().commit();

    let mut builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(config.intra_threads)?;

    match config.device {
        Device::Cuda => {
            tracing::info!(
                device_id = config.device_id,
                "Initializing ONNX Runtime with CUDA execution provider"
            );
            builder = builder.with_execution_providers([CUDAExecutionProvider::default()
                .with_device_id(config.device_id)
                .build()
                .error_on_failure()])?;
        }
        Device::Auto => {
            tracing::info!(
                device_id = config.device_id,
                "Initializing ONNX Runtime with CUDA execution provider, CPU fallback"
            );
            builder = builder.with_execution_providers([CUDAExecutionProvider::default()
                .with_device_id(config.device_id)
                .build()])?;
        }
        Device::Cpu => {
            tracing::info!("Initializing ONNX Runtime with CPU execution provider");
        }
    }

    Ok(builder.commit_from_file(path)?)
}

impl SegmentationBackend for OrtBackend {
    fn predict(&self, tensor: ArrayView3<'_, f32>) -> Result<ScoreMap, BackendError> {
        let batch = tensor.insert_axis(Axis(0));
        let batch = batch.as_standard_layout();

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![
            self.input_name.as_str() => TensorRef::from_array_view(batch.view())?
        ])?;

        let raw = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| BackendError::MissingOutput(self.output_name.clone()))?
            .try_extract_array::<f32>()?;

        tracing::trace!(shape = ?raw.shape(), "Model output");

        reduce_output(raw, self.target_channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_fatal() {
        let config = ModelConfig {
            path: "/nonexistent/road.onnx".into(),
            ..ModelConfig::test_default()
        };
        let err = OrtBackend::load(&config).err().unwrap();
        assert!(matches!(err, StartupError::ModelNotFound { .. }));
    }

    #[test]
    fn test_invalid_config_is_fatal_before_loading() {
        let config = ModelConfig {
            input_height: Some(256),
            ..ModelConfig::test_default()
        };
        let err = OrtBackend::load(&config).err().unwrap();
        assert!(matches!(err, StartupError::Config(_)));
    }
}
