//! ONNX Runtime backend.

use super::SpectrogramModel;
use crate::error::{ModelError, ModelResult};
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// A classifier exported to ONNX.
///
/// `Session::run` needs `&mut self`, so the session sits behind a mutex;
/// the pipeline already bounds how many requests reach it at once.
pub struct OnnxModel {
    session: Mutex<Session>,
    input_name: Option<String>,
}

impl OnnxModel {
    /// Load a model file.
    ///
    /// With no `input_name`, the tensor is bound to the model's first input.
    pub fn load(path: &Path, input_name: Option<String>) -> ModelResult<Self> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| ModelError::LoadFailed(e.to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }
}

impl SpectrogramModel for OnnxModel {
    fn predict(&self, input: &Array4<f32>) -> ModelResult<Vec<f32>> {
        let tensor = Tensor::from_array(input.clone())
            .map_err(|e| ModelError::Inference(format!("tensor creation: {}", e)))?;

        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let outputs = match self.input_name.as_deref() {
            Some(name) => session.run(ort::inputs![name => tensor]),
            None => session.run(ort::inputs![tensor]),
        }
        .map_err(|e| ModelError::Inference(e.to_string()))?;

        // Single-output classifier: [1, n_classes]
        let (_, scores) = outputs.iter().next().ok_or(ModelError::EmptyOutput)?;
        let (_shape, data) = scores
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(format!("output extraction: {}", e)))?;

        Ok(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let result = OnnxModel::load(Path::new("/nonexistent/model.onnx"), None);
        assert!(matches!(result, Err(ModelError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"not a model").unwrap();

        assert!(matches!(
            OnnxModel::load(&path, None),
            Err(ModelError::LoadFailed(_))
        ));
    }
}
