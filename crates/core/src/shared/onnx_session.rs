use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;

/// Preferred ONNX execution providers for the current platform.
///
/// An empty list means ONNX Runtime's default CPU provider.
fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Loads an ONNX model into an inference session.
///
/// Called once per model at startup; a failure here means the pipeline
/// cannot run at all.
pub fn load_session(model_path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    log::debug!("Loading ONNX model from {}", model_path.display());
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// Reads the square input resolution from an NCHW or NHWC model input.
///
/// Returns `None` when the shape is dynamic or not 4-dimensional.
pub fn square_input_size(session: &Session, channels_last: bool) -> Option<u32> {
    session.inputs().first().and_then(|input| {
        if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
            let h_axis = if channels_last { 1 } else { 2 };
            if shape.len() >= 4 && shape[h_axis] > 0 {
                Some(shape[h_axis] as u32)
            } else {
                None
            }
        } else {
            None
        }
    })
}
