//! Audio decoding and feature extraction.
//!
//! Uploads are decoded to mono PCM with symphonia, then turned into the
//! dB-scaled mel spectrogram tensor the model consumes.

mod decode;
mod mel;
mod spectrogram;
mod stft;

pub use decode::{decode, DecodedAudio};
pub use mel::{hz_to_mel, mel_to_hz, MelFilterBank};
pub use spectrogram::{extract_features, MelSpectrogram};
pub use stft::PowerStft;

#[cfg(test)]
pub(crate) use decode::wav_bytes;
