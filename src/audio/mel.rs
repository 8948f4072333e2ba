//! Mel filter bank on the Slaney mel scale.
//!
//! Filters are triangular in Hz between adjacent mel points and area
//! normalised, so each band reports an energy density rather than a sum
//! that grows with its width.

/// Sparse triangular filters, one list of `(bin, weight)` pairs per band.
#[derive(Debug, Clone)]
pub struct MelFilterBank {
    filters: Vec<Vec<(usize, f32)>>,
    n_bins: usize,
}

impl MelFilterBank {
    /// Build `n_mels` filters spanning `f_min..f_max` for an `n_fft`-point FFT.
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize, f_min: f32, f_max: f32) -> Self {
        let n_bins = n_fft / 2 + 1;
        let sr = sample_rate.max(1) as f64;
        let nyquist = sr / 2.0;
        let f_min = (f_min as f64).clamp(0.0, nyquist);
        let f_max = (f_max as f64).clamp(f_min, nyquist);

        let fft_freqs: Vec<f64> = (0..n_bins)
            .map(|i| i as f64 * sr / n_fft.max(1) as f64)
            .collect();
        let mel_freqs = mel_frequencies(n_mels + 2, f_min, f_max);

        let mut filters = Vec::with_capacity(n_mels);
        for m in 0..n_mels {
            let (left, center, right) = (mel_freqs[m], mel_freqs[m + 1], mel_freqs[m + 2]);
            let lower_width = center - left;
            let upper_width = right - center;
            // Slaney-style area normalisation
            let enorm = if right > left { 2.0 / (right - left) } else { 0.0 };

            let mut filter = Vec::new();
            for (bin, &freq) in fft_freqs.iter().enumerate() {
                let lower = if lower_width > 0.0 { (freq - left) / lower_width } else { 0.0 };
                let upper = if upper_width > 0.0 { (right - freq) / upper_width } else { 0.0 };
                let weight = lower.min(upper).max(0.0) * enorm;
                if weight > 0.0 {
                    filter.push((bin, weight as f32));
                }
            }
            filters.push(filter);
        }

        Self { filters, n_bins }
    }

    /// Number of mel bands.
    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Number of FFT bins each filter expects.
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Project a power spectrum onto the mel bands.
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| {
                filter
                    .iter()
                    .map(|&(bin, weight)| {
                        power.get(bin).copied().unwrap_or(0.0).max(0.0) as f64 * weight as f64
                    })
                    .sum::<f64>() as f32
            })
            .collect()
    }
}

/// `count` frequencies evenly spaced on the mel scale, in Hz.
fn mel_frequencies(count: usize, f_min: f64, f_max: f64) -> Vec<f64> {
    let mel_min = hz_to_mel(f_min);
    let mel_max = hz_to_mel(f_max);
    let steps = count.saturating_sub(1).max(1) as f64;

    (0..count)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / steps))
        .collect()
}

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4_f64.ln() / 27.0
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above.
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Inverse of [`hz_to_mel`].
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_breakpoint() {
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-9);
        assert!((hz_to_mel(500.0) - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_mel_hz_roundtrip() {
        for hz in [0.0, 250.0, 999.0, 1000.0, 4000.0, 11025.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((back - hz).abs() < 1e-6, "{} -> {}", hz, back);
        }
    }

    #[test]
    fn test_filter_bank_shape() {
        let bank = MelFilterBank::new(22050, 1024, 128, 0.0, 11025.0);
        assert_eq!(bank.n_mels(), 128);
        assert_eq!(bank.n_bins(), 513);

        let out = bank.apply(&vec![1.0; 513]);
        assert_eq!(out.len(), 128);
    }

    #[test]
    fn test_filters_cover_nonzero_energy() {
        let bank = MelFilterBank::new(16000, 512, 40, 0.0, 8000.0);
        let mels = bank.apply(&vec![1.0; 257]);
        // Upper bands are wide enough to always catch a bin
        assert!(mels[20..].iter().all(|&e| e > 0.0));
    }

    #[test]
    fn test_tone_lands_in_matching_band() {
        let bank = MelFilterBank::new(16000, 512, 40, 0.0, 8000.0);
        let mut power = vec![0.0; 257];
        // Bin 64 is 2 kHz
        power[64] = 1.0;
        let mels = bank.apply(&power);

        let loudest = mels
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        let centers: Vec<f64> = mel_frequencies(42, 0.0, 8000.0);
        assert!((centers[loudest + 1] - 2000.0).abs() < 300.0);
    }
}
