//! Upload validation.

use super::Upload;
use crate::config::AppSettings;
use crate::error::{ClassifyError, ClassifyResult};
use crate::types::{AudioFormat, FileSize};

/// Which uploads are accepted for classification.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    allowed: Vec<AudioFormat>,
    max_size: FileSize,
}

impl UploadPolicy {
    /// Create a policy. Extensions that do not parse are ignored.
    pub fn new<I, S>(allowed_extensions: I, max_bytes: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = allowed_extensions
            .into_iter()
            .filter_map(|ext| match ext.as_ref().parse::<AudioFormat>() {
                Ok(fmt) => Some(fmt),
                Err(e) => {
                    tracing::warn!("Ignoring allowed extension: {}", e);
                    None
                }
            })
            .collect();

        Self {
            allowed,
            max_size: FileSize::new(max_bytes),
        }
    }

    /// Build the policy from service settings.
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(&settings.allowed_extensions, settings.max_upload_bytes)
    }

    pub fn max_size(&self) -> FileSize {
        self.max_size
    }

    pub fn allowed(&self) -> &[AudioFormat] {
        &self.allowed
    }

    /// Check an upload and return its format.
    pub fn validate(&self, upload: &Upload) -> ClassifyResult<AudioFormat> {
        if upload.filename.trim().is_empty() {
            return Err(ClassifyError::Validation("No file provided".to_string()));
        }

        let format = AudioFormat::from_filename(&upload.filename)
            .ok()
            .filter(|fmt| self.allowed.contains(fmt))
            .ok_or_else(|| {
                ClassifyError::Validation(format!(
                    "Invalid file type. Allowed types: {}",
                    self.allowed_list()
                ))
            })?;

        if upload.bytes.is_empty() {
            return Err(ClassifyError::Validation("Empty file".to_string()));
        }

        if upload.size() > self.max_size {
            return Err(self.too_large());
        }

        Ok(format)
    }

    /// The rejection for a file over the size limit.
    pub fn too_large(&self) -> ClassifyError {
        ClassifyError::Validation(format!(
            "File too large. Maximum size is {}",
            self.max_size
        ))
    }

    fn allowed_list(&self) -> String {
        self.allowed
            .iter()
            .map(|fmt| fmt.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::from_settings(&AppSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> UploadPolicy {
        UploadPolicy::new([".wav", "mp3"], 1024)
    }

    #[test]
    fn test_accepts_allowed_format() {
        let fmt = policy()
            .validate(&Upload::new("true.WAV", vec![0; 10]))
            .unwrap();
        assert_eq!(fmt.as_str(), ".wav");
    }

    #[test]
    fn test_rejects_missing_filename() {
        let err = policy().validate(&Upload::new("  ", vec![0; 10])).unwrap_err();
        assert_eq!(err.to_string(), "No file provided");
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let err = policy()
            .validate(&Upload::new("notes.txt", vec![0; 10]))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Invalid file type. Allowed types: .wav, .mp3");

        assert!(policy().validate(&Upload::new("noext", vec![0; 10])).is_err());
    }

    #[test]
    fn test_rejects_empty_file() {
        let err = policy().validate(&Upload::new("a.wav", vec![])).unwrap_err();
        assert_eq!(err.to_string(), "Empty file");
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(policy().validate(&Upload::new("a.wav", vec![0; 1024])).is_ok());

        let err = policy()
            .validate(&Upload::new("a.wav", vec![0; 1025]))
            .unwrap_err();
        assert_eq!(err.to_string(), "File too large. Maximum size is 1.00 KB");
    }

    #[test]
    fn test_default_policy() {
        let policy = UploadPolicy::default();
        assert_eq!(policy.allowed().len(), 4);
        assert_eq!(policy.max_size().bytes(), 10 * 1024 * 1024);
    }
}
