//! Audio file format and size newtypes.
//!
//! `AudioFormat` holds a normalized file extension (".wav", ".mp3", ...)
//! so validation code never compares raw, mixed-case strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A lower-cased file extension including the leading dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioFormat(String);

impl AudioFormat {
    /// Extract the format from a file name.
    pub fn from_filename(name: &str) -> Result<Self, FormatError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| FormatError::MissingExtension(name.to_string()))?;

        ext.parse()
    }

    /// The extension with its leading dot, e.g. ".wav".
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The extension without the leading dot, for codec probing hints.
    pub fn extension(&self) -> &str {
        &self.0[1..]
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AudioFormat {
    type Err = FormatError;

    /// Parse "wav", ".WAV" and friends into ".wav".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('.');

        if trimmed.is_empty() {
            return Err(FormatError::MissingExtension(s.to_string()));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(FormatError::InvalidExtension(s.to_string()));
        }

        Ok(Self(format!(".{}", trimmed.to_ascii_lowercase())))
    }
}

/// Error type for format parsing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FormatError {
    #[error("file has no extension: {0}")]
    MissingExtension(String),
    #[error("invalid file extension: {0}")]
    InvalidExtension(String),
}

/// Size of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSize(u64);

impl FileSize {
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn bytes(self) -> u64 {
        self.0
    }

    /// Size in KiB, rounded to two decimals.
    pub fn kilobytes(self) -> f64 {
        round2(self.0 as f64 / 1024.0)
    }

    /// Size in MiB, rounded to two decimals.
    pub fn megabytes(self) -> f64 {
        round2(self.0 as f64 / (1024.0 * 1024.0))
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 1024 * 1024 {
            write!(f, "{:.2} MB", self.megabytes())
        } else if self.0 >= 1024 {
            write!(f, "{:.2} KB", self.kilobytes())
        } else {
            write!(f, "{} B", self.0)
        }
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Widen an `f32` to the `f64` with the same shortest decimal form.
///
/// A plain cast keeps the binary error of the `f32`, so `0.98765_f32`
/// would become `0.98764997...` and round down.
pub fn widen(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}

/// A `0.0..=1.0` fraction as a percentage rounded to two decimals.
pub fn percent(fraction: f32) -> f64 {
    round2(widen(fraction) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_decimal_value() {
        assert_eq!(widen(0.98765), 0.98765);
        assert_eq!(percent(0.98765), 98.77);
        assert_eq!(percent(0.5), 50.0);
        assert_eq!(percent(1.0), 100.0);
        assert_eq!(percent(0.123449), 12.34);
    }

    #[test]
    fn test_format_from_filename() {
        let fmt = AudioFormat::from_filename("siren.WAV").unwrap();
        assert_eq!(fmt.as_str(), ".wav");
        assert_eq!(fmt.extension(), "wav");

        let fmt = AudioFormat::from_filename("split_49_ambulans full raw 1.mp3").unwrap();
        assert_eq!(fmt.as_str(), ".mp3");
    }

    #[test]
    fn test_format_missing_extension() {
        assert!(AudioFormat::from_filename("recording").is_err());
        assert!(AudioFormat::from_filename("").is_err());
    }

    #[test]
    fn test_format_parse_normalizes() {
        assert_eq!("FLAC".parse::<AudioFormat>().unwrap().as_str(), ".flac");
        assert_eq!(".ogg".parse::<AudioFormat>().unwrap().as_str(), ".ogg");
        assert!("w/av".parse::<AudioFormat>().is_err());
    }

    #[test]
    fn test_file_size_units() {
        let size = FileSize::new(1_572_864);
        assert_eq!(size.kilobytes(), 1536.0);
        assert_eq!(size.megabytes(), 1.5);

        let size = FileSize::new(1000);
        assert_eq!(size.kilobytes(), 0.98);
        assert_eq!(size.megabytes(), 0.0);
    }

    #[test]
    fn test_file_size_display() {
        assert_eq!(FileSize::new(512).to_string(), "512 B");
        assert_eq!(FileSize::new(2048).to_string(), "2.00 KB");
        assert_eq!(FileSize::new(3 * 1024 * 1024).to_string(), "3.00 MB");
    }
}
