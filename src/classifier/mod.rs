//! Classification of uploaded clips.
//!
//! The HTTP layer only sees the [`AudioClassifier`] trait; the real
//! implementation is [`SpectrogramPipeline`], which runs
//! validate → decode → mel spectrogram → model for each upload.

mod pipeline;
mod validate;

pub use pipeline::SpectrogramPipeline;
pub use validate::UploadPolicy;

use crate::error::ClassifyResult;
use crate::model::Prediction;
use crate::types::{AudioFormat, FileSize, Label};
use async_trait::async_trait;
use serde::Serialize;

/// An uploaded audio file.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied file name.
    pub filename: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn size(&self) -> FileSize {
        FileSize::new(self.bytes.len() as u64)
    }
}

/// A successful classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub prediction: Prediction,
    /// Format detected from the file name.
    pub format: AudioFormat,
    /// Time spent validating, decoding and running the model.
    pub processing_time_ms: f64,
}

impl Classification {
    pub fn label(&self) -> Label {
        self.prediction.label
    }

    pub fn is_ambulance(&self) -> bool {
        self.prediction.label.is_ambulance()
    }

    pub fn confidence(&self) -> f32 {
        self.prediction.confidence
    }
}

/// Trait for classifiers that can be served over HTTP.
#[async_trait]
pub trait AudioClassifier: Send + Sync {
    /// Classify one upload.
    ///
    /// Returns `ClassifyError::Validation` for uploads rejected before
    /// processing; every other error is an internal failure.
    async fn classify(&self, upload: Upload) -> ClassifyResult<Classification>;

    /// The rules uploads are validated against.
    fn policy(&self) -> &UploadPolicy;

    /// Whether the underlying model is in memory.
    fn is_model_loaded(&self) -> bool;

    /// Load the model ahead of the first request.
    async fn warm_up(&self) -> ClassifyResult<()>;
}
