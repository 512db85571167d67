use crate::{error::BackendError, types::ScoreMap};
use ndarray::{ArrayView3, ArrayViewD, Axis, Ix2};

#[cfg(feature = "ort-backend")]
pub mod ort;

/// A loaded segmentation network.
///
/// `predict` takes `&self` so one instance can be shared by every request
/// handler. Implementations must never modify their weights after loading.
pub trait SegmentationBackend: Send + Sync {
    /// Run the network on a normalized `[3, H, W]` tensor and return the road
    /// score for every pixel of the `H x W` grid.
    fn predict(&self, tensor: ArrayView3<'_, f32>) -> Result<ScoreMap, BackendError>;
}

impl<T: SegmentationBackend + ?Sized> SegmentationBackend for Box<T> {
    fn predict(&self, tensor: ArrayView3<'_, f32>) -> Result<ScoreMap, BackendError> {
        (**self).predict(tensor)
    }
}

/// Reduce a raw network output to a single `H x W` score plane.
///
/// Accepted layouts are `[H, W]`, `[C, H, W]` and `[1, C, H, W]`; `channel`
/// selects the plane when the output carries several.
pub fn reduce_output(output: ArrayViewD<'_, f32>, channel: usize) -> Result<ScoreMap, BackendError> {
    let shape = output.shape().to_vec();

    let plane = match output.ndim() {
        2 => output,
        3 => select_channel(output, channel)?,
        4 if shape[0] == 1 => select_channel(output.index_axis_move(Axis(0), 0), channel)?,
        _ => return Err(BackendError::OutputShape(shape)),
    };

    let plane = plane
        .into_dimensionality::<Ix2>()
        .map_err(|_| BackendError::OutputShape(shape.clone()))?;

    if plane.is_empty() {
        return Err(BackendError::OutputShape(shape));
    }

    Ok(ScoreMap::new(plane.to_owned()))
}

/// Check a graph's declared tensor names against the configured ones.
///
/// The network must take exactly one input, named `input_name`, and must
/// expose an output named `output_name` among its outputs.
pub fn check_model_io(
    inputs: &[&str],
    outputs: &[&str],
    input_name: &str,
    output_name: &str,
) -> Result<(), String> {
    match inputs {
        [only] if *only == input_name => {}
        [only] => {
            return Err(format!(
                "expected input `{input_name}`, the graph's input is `{only}`"
            ));
        }
        _ => {
            return Err(format!(
                "expected a single image input, the graph has {} inputs: {inputs:?}",
                inputs.len()
            ));
        }
    }

    if !outputs.contains(&output_name) {
        return Err(format!(
            "expected output `{output_name}`, the graph's outputs are {outputs:?}"
        ));
    }

    Ok(())
}

fn select_channel(
    output: ArrayViewD<'_, f32>,
    channel: usize,
) -> Result<ArrayViewD<'_, f32>, BackendError> {
    let channels = output.len_of(Axis(0));
    if channel >= channels {
        return Err(BackendError::ChannelOutOfRange { channel, channels });
    }
    Ok(output.index_axis_move(Axis(0), channel))
}
