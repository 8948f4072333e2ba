//! Log-mel spectrogram features.
//!
//! The model was trained on dB-scaled mel spectrograms referenced to the
//! loudest bin of each clip, cut or padded to a fixed number of frames.
//! Every step here has to reproduce that exactly, or predictions drift.

use super::mel::MelFilterBank;
use super::stft::PowerStft;
use crate::config::FeatureParams;
use crate::error::{AudioError, AudioResult};
use ndarray::{s, Array2, Array4, Axis};

/// Smallest power considered when converting to dB.
const AMIN: f32 = 1e-10;

/// A mel spectrogram laid out as `(n_mels, n_frames)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MelSpectrogram {
    data: Array2<f32>,
}

impl MelSpectrogram {
    /// Compute the power mel spectrogram of a mono signal.
    pub fn compute(samples: &[f32], sample_rate: u32, params: &FeatureParams) -> AudioResult<Self> {
        if samples.is_empty() {
            return Err(AudioError::Empty);
        }
        if sample_rate == 0 {
            return Err(AudioError::MissingSampleRate);
        }
        if params.n_fft == 0 || params.hop_length == 0 || params.n_mels == 0 {
            return Err(AudioError::InvalidParams(format!(
                "n_fft={}, hop_length={}, n_mels={}",
                params.n_fft, params.hop_length, params.n_mels
            )));
        }

        let stft = PowerStft::new(params.n_fft, params.hop_length);
        let bank = MelFilterBank::new(
            sample_rate,
            params.n_fft,
            params.n_mels,
            0.0,
            sample_rate as f32 / 2.0,
        );

        let frames = stft.power_frames(samples);
        let mut data = Array2::<f32>::zeros((params.n_mels, frames.len()));
        for (t, power) in frames.iter().enumerate() {
            let mels = bank.apply(power);
            data.column_mut(t)
                .iter_mut()
                .zip(mels)
                .for_each(|(slot, energy)| *slot = energy);
        }

        Ok(Self { data })
    }

    /// Wrap an existing `(n_mels, n_frames)` array.
    pub fn from_array(data: Array2<f32>) -> Self {
        Self { data }
    }

    pub fn n_mels(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_frames(&self) -> usize {
        self.data.ncols()
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.data
    }

    /// Convert power to decibels relative to the loudest bin.
    ///
    /// The loudest bin maps to 0 dB and nothing falls more than `top_db`
    /// below it.
    pub fn power_to_db(mut self, top_db: f32) -> Self {
        let reference = self.data.iter().copied().fold(0.0f32, f32::max).max(AMIN);
        let ref_db = 10.0 * reference.log10();

        self.data
            .mapv_inplace(|p| 10.0 * p.max(AMIN).log10() - ref_db);

        let peak = self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let floor = peak - top_db.max(0.0);
        self.data.mapv_inplace(|db| db.max(floor));

        self
    }

    /// Right-pad with zeros or crop to exactly `steps` frames.
    pub fn fit_time_steps(self, steps: usize) -> Self {
        let frames = self.n_frames();
        if frames == steps {
            return self;
        }
        if frames > steps {
            return Self {
                data: self.data.slice(s![.., ..steps]).to_owned(),
            };
        }

        let mut padded = Array2::<f32>::zeros((self.n_mels(), steps));
        padded.slice_mut(s![.., ..frames]).assign(&self.data);
        Self { data: padded }
    }

    /// Shape as a single-item, single-channel batch: `(1, n_mels, frames, 1)`.
    pub fn into_model_input(self) -> Array4<f32> {
        self.data.insert_axis(Axis(0)).insert_axis(Axis(3))
    }
}

/// Run the full front end: mel power → dB → fixed length → model tensor.
pub fn extract_features(
    samples: &[f32],
    sample_rate: u32,
    params: &FeatureParams,
) -> AudioResult<Array4<f32>> {
    let mel = MelSpectrogram::compute(samples, sample_rate, params)?;
    tracing::debug!(
        "Mel spectrogram: {} bands x {} frames",
        mel.n_mels(),
        mel.n_frames()
    );

    Ok(mel
        .power_to_db(params.top_db)
        .fit_time_steps(params.max_time_steps)
        .into_model_input())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sine(freq: f32, sample_rate: u32, secs: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * secs) as usize;
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_compute_shape() {
        let params = FeatureParams::default();
        let samples = sine(880.0, 22050, 1.0);
        let mel = MelSpectrogram::compute(&samples, 22050, &params).unwrap();

        assert_eq!(mel.n_mels(), 128);
        assert_eq!(mel.n_frames(), 1 + 22050 / 512);
    }

    #[test]
    fn test_compute_rejects_empty() {
        let params = FeatureParams::default();
        assert!(matches!(
            MelSpectrogram::compute(&[], 22050, &params),
            Err(AudioError::Empty)
        ));
        assert!(MelSpectrogram::compute(&[0.1; 100], 0, &params).is_err());
    }

    #[test]
    fn test_power_to_db_references_max() {
        let mel = MelSpectrogram::from_array(array![[1.0, 0.1], [0.01, 0.0]]);
        let db = mel.power_to_db(80.0);
        let a = db.as_array();

        assert!((a[[0, 0]] - 0.0).abs() < 1e-4);
        assert!((a[[0, 1]] + 10.0).abs() < 1e-4);
        assert!((a[[1, 0]] + 20.0).abs() < 1e-4);
        // Silence is clamped to the top_db floor
        assert!((a[[1, 1]] + 80.0).abs() < 1e-4);
    }

    #[test]
    fn test_power_to_db_all_silent() {
        let mel = MelSpectrogram::from_array(Array2::zeros((4, 3)));
        let db = mel.power_to_db(80.0);
        assert!(db.as_array().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_fit_pads_with_zeros() {
        let mel = MelSpectrogram::from_array(Array2::from_elem((2, 3), -5.0));
        let fitted = mel.fit_time_steps(5);

        assert_eq!(fitted.n_frames(), 5);
        assert_eq!(fitted.as_array()[[1, 2]], -5.0);
        assert_eq!(fitted.as_array()[[0, 3]], 0.0);
        assert_eq!(fitted.as_array()[[1, 4]], 0.0);
    }

    #[test]
    fn test_fit_crops_to_leading_frames() {
        let data = Array2::from_shape_fn((2, 6), |(_, t)| t as f32);
        let fitted = MelSpectrogram::from_array(data).fit_time_steps(4);

        assert_eq!(fitted.n_frames(), 4);
        assert_eq!(fitted.as_array()[[0, 3]], 3.0);
    }

    #[test]
    fn test_extract_features_tensor_shape() {
        let params = FeatureParams::default();
        let samples = sine(440.0, 16000, 0.5);
        let input = extract_features(&samples, 16000, &params).unwrap();

        assert_eq!(input.shape(), &[1, 128, 128, 1]);
        let max = input.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert!(max.abs() < 1e-4);
        assert!(input.iter().all(|v| *v >= -80.0 - 1e-4));
    }

    #[test]
    fn test_extract_features_is_deterministic() {
        let params = FeatureParams::default();
        let samples = sine(1234.0, 44100, 0.3);
        let a = extract_features(&samples, 44100, &params).unwrap();
        let b = extract_features(&samples, 44100, &params).unwrap();
        assert_eq!(a, b);
    }
}
