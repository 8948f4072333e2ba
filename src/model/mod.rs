//! Model inference.
//!
//! The classifier itself is an externally trained network; this module
//! only loads it, feeds it spectrogram tensors, and turns its raw scores
//! into a [`Prediction`].

mod manager;
mod onnx;

pub use manager::{ModelLoader, ModelManager};
pub use onnx::OnnxModel;

use crate::error::{ModelError, ModelResult};
use crate::types::Label;
use ndarray::Array4;
use serde::Serialize;

/// Trait for anything that maps a spectrogram batch to per-class scores.
///
/// Implementations must be deterministic for a fixed model file.
pub trait SpectrogramModel: Send + Sync {
    /// Run inference on a `(1, n_mels, frames, 1)` tensor.
    fn predict(&self, input: &Array4<f32>) -> ModelResult<Vec<f32>>;
}

/// Outcome of a single inference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Most probable class.
    pub label: Label,
    /// Probability of `label`, in `0.0..=1.0`.
    pub confidence: f32,
    /// Probability of each class, in model output order.
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// Pick the most probable class from raw model scores.
    ///
    /// Scores that already form a probability distribution are used as
    /// they are; anything else (logits) goes through softmax first.
    pub fn from_scores(scores: &[f32]) -> ModelResult<Self> {
        if scores.is_empty() {
            return Err(ModelError::EmptyOutput);
        }

        let probabilities = if is_distribution(scores) {
            scores.to_vec()
        } else {
            softmax(scores)
        };

        let (index, &confidence) = probabilities
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, &f32)>, (i, p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((i, p)),
            })
            .ok_or(ModelError::EmptyOutput)?;

        let label = Label::from_index(index).ok_or(ModelError::UnknownClass(index))?;

        Ok(Self {
            label,
            confidence,
            probabilities,
        })
    }

    /// Confidence as a percentage rounded to two decimals.
    pub fn confidence_percent(&self) -> f64 {
        crate::types::percent(self.confidence)
    }
}

fn is_distribution(scores: &[f32]) -> bool {
    let sum: f32 = scores.iter().sum();
    scores.iter().all(|s| s.is_finite() && *s >= 0.0) && (sum - 1.0).abs() <= 1e-3
}

/// Numerically stable softmax.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
