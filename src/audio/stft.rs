//! Short-time power spectra.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Computes centered, Hann-windowed power spectra frame by frame.
pub struct PowerStft {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    n_fft: usize,
    hop_length: usize,
}

impl PowerStft {
    pub fn new(n_fft: usize, hop_length: usize) -> Self {
        let n_fft = n_fft.max(1);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);

        Self {
            fft,
            window: periodic_hann(n_fft),
            n_fft,
            hop_length: hop_length.max(1),
        }
    }

    /// Number of frames produced for a signal of `len` samples.
    ///
    /// The signal is padded by `n_fft / 2` on each side, so every sample
    /// sits at the center of some frame.
    pub fn frame_count(&self, len: usize) -> usize {
        let padded = len + 2 * (self.n_fft / 2);
        if padded < self.n_fft {
            return 0;
        }
        1 + (padded - self.n_fft) / self.hop_length
    }

    /// Power spectra (`n_fft / 2 + 1` bins each), one per frame.
    pub fn power_frames(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        let pad = self.n_fft / 2;
        let n_bins = self.n_fft / 2 + 1;
        let frames = self.frame_count(samples.len());

        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];
        let mut out = Vec::with_capacity(frames);

        for frame in 0..frames {
            // Frame start in padded coordinates; zeros outside the signal
            let start = frame * self.hop_length;
            for (i, slot) in buffer.iter_mut().enumerate() {
                let sample = (start + i)
                    .checked_sub(pad)
                    .and_then(|idx| samples.get(idx))
                    .copied()
                    .unwrap_or(0.0);
                *slot = Complex::new(sample * self.window[i], 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);
            out.push(buffer[..n_bins].iter().map(|c| c.norm_sqr()).collect());
        }

        out
    }
}

/// Hann window for spectral analysis (periodic, length `n`).
fn periodic_hann(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            (0.5 - 0.5 * phase.cos()) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_is_one_plus_len_over_hop() {
        let stft = PowerStft::new(1024, 512);
        assert_eq!(stft.frame_count(0), 1);
        assert_eq!(stft.frame_count(511), 1);
        assert_eq!(stft.frame_count(512), 2);
        assert_eq!(stft.frame_count(22050 * 5), 1 + 22050 * 5 / 512);
    }

    #[test]
    fn test_window_is_periodic() {
        let w = periodic_hann(8);
        assert_eq!(w[0], 0.0);
        assert!((w[4] - 1.0).abs() < 1e-6);
        // Symmetric around n/2 rather than (n-1)/2
        assert!((w[1] - w[7]).abs() < 1e-6);
    }

    #[test]
    fn test_sine_peaks_at_expected_bin() {
        let sr = 16000.0;
        let n_fft = 512;
        // Exactly on bin 32 (1 kHz)
        let samples: Vec<f32> = (0..8000)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / sr).sin())
            .collect();

        let stft = PowerStft::new(n_fft, 256);
        let frames = stft.power_frames(&samples);
        let mid = &frames[frames.len() / 2];
        assert_eq!(mid.len(), n_fft / 2 + 1);

        let peak = mid
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 32);
    }

    #[test]
    fn test_silence_has_zero_power() {
        let stft = PowerStft::new(256, 128);
        let frames = stft.power_frames(&vec![0.0; 1000]);
        assert!(frames.iter().flatten().all(|&p| p == 0.0));
    }
}
