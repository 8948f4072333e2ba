//! The spectrogram classification pipeline.

use super::{AudioClassifier, Classification, Upload, UploadPolicy};
use crate::audio::{self, extract_features};
use crate::config::{AppSettings, FeatureParams};
use crate::error::{ClassifyError, ClassifyResult};
use crate::model::{ModelManager, Prediction};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Classifies uploads with a spectrogram model.
///
/// Decoding, feature extraction and inference are CPU-bound and run on
/// the blocking thread pool; a semaphore bounds how many run at once.
pub struct SpectrogramPipeline {
    policy: UploadPolicy,
    params: FeatureParams,
    models: Arc<ModelManager>,
    permits: Arc<Semaphore>,
}

impl SpectrogramPipeline {
    pub fn new(
        policy: UploadPolicy,
        params: FeatureParams,
        models: Arc<ModelManager>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            policy,
            params,
            models,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Build the pipeline described by the service settings.
    pub fn from_settings(settings: &AppSettings) -> Self {
        let models = Arc::new(ModelManager::new(
            settings.model_path(),
            settings.model_input_name.clone(),
        ));

        Self::new(
            UploadPolicy::from_settings(settings),
            settings.features,
            models,
            settings.max_concurrent_inferences,
        )
    }

    pub fn models(&self) -> &Arc<ModelManager> {
        &self.models
    }
}

/// Decode, extract features and run the model, synchronously.
pub fn classify_bytes(
    bytes: Vec<u8>,
    extension: Option<&str>,
    params: &FeatureParams,
    models: &ModelManager,
) -> ClassifyResult<Prediction> {
    let decoded = audio::decode(bytes, extension)?;
    tracing::debug!(
        "Decoded {:.2}s at {} Hz, {} channel(s)",
        decoded.duration_secs(),
        decoded.sample_rate,
        decoded.channels
    );

    let sample_rate = decoded.sample_rate;
    let samples = decoded.into_mono();
    let input = extract_features(&samples, sample_rate, params)?;

    let model = models.get()?;
    let scores = model.predict(&input)?;
    let prediction = Prediction::from_scores(&scores)?;

    tracing::debug!(
        "Result: {}, {} ({:.4})",
        prediction.label.index(),
        prediction.label,
        prediction.confidence
    );
    Ok(prediction)
}

#[async_trait]
impl AudioClassifier for SpectrogramPipeline {
    async fn classify(&self, upload: Upload) -> ClassifyResult<Classification> {
        let started = Instant::now();
        let format = self.policy.validate(&upload)?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| ClassifyError::Worker(e.to_string()))?;

        let params = self.params;
        let models = Arc::clone(&self.models);
        let extension = format.extension().to_string();
        let prediction = tokio::task::spawn_blocking(move || {
            classify_bytes(upload.bytes, Some(&extension), &params, &models)
        })
        .await
        .map_err(|e| ClassifyError::Worker(e.to_string()))??;

        Ok(Classification {
            prediction,
            format,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }

    fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    fn is_model_loaded(&self) -> bool {
        self.models.is_loaded()
    }

    async fn warm_up(&self) -> ClassifyResult<()> {
        let models = Arc::clone(&self.models);
        tokio::task::spawn_blocking(move || models.load().map(|_| ()))
            .await
            .map_err(|e| ClassifyError::Worker(e.to_string()))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav_bytes;
    use crate::error::{ModelError, ModelResult};
    use crate::model::SpectrogramModel;
    use crate::types::Label;
    use ndarray::Array4;
    use std::sync::Mutex;

    /// Returns fixed scores and remembers the shape it was fed.
    struct RecordingModel {
        scores: Vec<f32>,
        seen: Mutex<Vec<Vec<usize>>>,
    }

    impl SpectrogramModel for RecordingModel {
        fn predict(&self, input: &Array4<f32>) -> ModelResult<Vec<f32>> {
            self.seen.lock().unwrap().push(input.shape().to_vec());
            Ok(self.scores.clone())
        }
    }

    fn pipeline_with(scores: Vec<f32>) -> (SpectrogramPipeline, Arc<RecordingModel>) {
        let model = Arc::new(RecordingModel {
            scores,
            seen: Mutex::new(Vec::new()),
        });
        let handle = Arc::clone(&model);
        let models = Arc::new(ModelManager::with_loader(
            "model.onnx",
            Box::new(move |_| Ok(Arc::clone(&handle) as Arc<dyn SpectrogramModel>)),
        ));

        let pipeline = SpectrogramPipeline::new(
            UploadPolicy::default(),
            FeatureParams::default(),
            models,
            2,
        );
        (pipeline, model)
    }

    fn tone_wav() -> Vec<u8> {
        let samples: Vec<f32> = (0..22050)
            .map(|i| (2.0 * std::f32::consts::PI * 960.0 * i as f32 / 22050.0).sin() * 0.4)
            .collect();
        wav_bytes(&samples, 22050, 1)
    }

    #[tokio::test]
    async fn test_classify_ambulance() {
        let (pipeline, model) = pipeline_with(vec![0.03, 0.97]);
        assert!(!pipeline.is_model_loaded());

        let result = pipeline
            .classify(Upload::new("siren.wav", tone_wav()))
            .await
            .unwrap();

        assert_eq!(result.label(), Label::Ambulance);
        assert!(result.is_ambulance());
        assert!((result.confidence() - 0.97).abs() < 1e-6);
        assert_eq!(result.format.as_str(), ".wav");
        assert!(result.processing_time_ms >= 0.0);
        assert!(pipeline.is_model_loaded());

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[vec![1, 128, 128, 1]]);
    }

    #[tokio::test]
    async fn test_validation_happens_before_decoding() {
        let (pipeline, model) = pipeline_with(vec![1.0, 0.0]);

        let err = pipeline
            .classify(Upload::new("siren.txt", tone_wav()))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(model.seen.lock().unwrap().is_empty());
        assert!(!pipeline.is_model_loaded());
    }

    #[tokio::test]
    async fn test_undecodable_upload_is_internal_error() {
        let (pipeline, _) = pipeline_with(vec![1.0, 0.0]);

        let err = pipeline
            .classify(Upload::new("broken.wav", b"RIFF garbage".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, ClassifyError::Audio(_)));
    }

    #[tokio::test]
    async fn test_unexpected_class_count() {
        let (pipeline, _) = pipeline_with(vec![0.1, 0.1, 0.8]);

        let err = pipeline
            .classify(Upload::new("siren.wav", tone_wav()))
            .await
            .unwrap_err();

        assert!(matches!(err, ClassifyError::Model(ModelError::UnknownClass(2))));
    }

    #[tokio::test]
    async fn test_warm_up_loads_model() {
        let (pipeline, _) = pipeline_with(vec![1.0, 0.0]);
        pipeline.warm_up().await.unwrap();
        assert!(pipeline.is_model_loaded());
    }

    #[test]
    fn test_classify_bytes_is_deterministic() {
        let (pipeline, _) = pipeline_with(vec![0.6, 0.4]);
        let params = FeatureParams::default();

        let a = classify_bytes(tone_wav(), Some("wav"), &params, pipeline.models()).unwrap();
        let b = classify_bytes(tone_wav(), Some("wav"), &params, pipeline.models()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.label, Label::TrafficNoise);
    }
}
