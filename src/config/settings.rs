//! Application settings and paths.
//!
//! Manages XDG-compliant paths for configuration and data, plus the
//! service settings file.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Global paths singleton.
static PATHS: OnceLock<Paths> = OnceLock::new();

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/sirene)
    pub config_dir: PathBuf,
    /// Data directory (~/.local/share/sirene)
    pub data_dir: PathBuf,
}

impl Paths {
    /// Get the global paths instance.
    ///
    /// Falls back to the working directory when no home directory exists
    /// (containers running as a bare uid).
    pub fn get() -> &'static Paths {
        PATHS.get_or_init(|| {
            Self::new().unwrap_or_else(|err| {
                tracing::warn!("Using working directory for data: {}", err);
                Self {
                    config_dir: PathBuf::from("."),
                    data_dir: PathBuf::from("."),
                }
            })
        })
    }

    /// Initialize paths using XDG directories.
    fn new() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "sirene", "sirene").ok_or(ConfigError::DirectoryNotFound)?;

        let paths = Self {
            config_dir: project.config_dir().to_path_buf(),
            data_dir: project.data_dir().to_path_buf(),
        };

        // Ensure directories exist
        fs::create_dir_all(&paths.config_dir)?;
        fs::create_dir_all(&paths.data_dir)?;

        Ok(paths)
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Get the default path of the classification history log.
    pub fn history_file(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }

    /// Get the default path of the model file.
    pub fn model_file(&self) -> PathBuf {
        self.data_dir.join("model.onnx")
    }
}

/// Parameters of the log-mel front end.
///
/// These must match the values the model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureParams {
    /// Number of mel bands.
    pub n_mels: usize,
    /// FFT window length in samples.
    pub n_fft: usize,
    /// Hop between successive frames in samples.
    pub hop_length: usize,
    /// Number of frames fed to the model; shorter clips are padded.
    pub max_time_steps: usize,
    /// Dynamic range kept below the loudest bin, in dB.
    pub top_db: f32,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            n_mels: 128,
            n_fft: 1024,
            hop_length: 512,
            max_time_steps: 128,
            top_db: 80.0,
        }
    }
}

impl FeatureParams {
    /// Validate the parameters.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.n_mels == 0 || self.n_fft == 0 || self.hop_length == 0 || self.max_time_steps == 0
        {
            return Err(ConfigError::Invalid(
                "feature sizes must be greater than zero".to_string(),
            ));
        }
        if self.top_db < 0.0 {
            return Err(ConfigError::Invalid("top_db must be non-negative".to_string()));
        }
        Ok(())
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Address to bind the HTTP server to.
    pub host: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Service name reported by `/` and `/health`.
    pub service_name: String,
    /// Path to the ONNX model file. Defaults to the data directory.
    pub model_path: Option<PathBuf>,
    /// Name of the model input tensor; the first input is used when unset.
    pub model_input_name: Option<String>,
    /// Load the model at startup instead of on the first request.
    pub preload_model: bool,
    /// Path to the history log. Defaults to the data directory.
    pub history_path: Option<PathBuf>,
    /// Accepted upload extensions, with leading dot.
    pub allowed_extensions: Vec<String>,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: u64,
    /// Per-client request quota for the classify route, 0 for unlimited.
    pub requests_per_minute: u32,
    /// Requests a client may make in a burst before the quota applies.
    pub burst: u32,
    /// Maximum number of inferences running at once.
    pub max_concurrent_inferences: usize,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Use the first `X-Forwarded-For` entry as the client address.
    pub trust_forwarded_for: bool,
    /// Feature extraction parameters.
    pub features: FeatureParams,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            service_name: "Emergency Sound Classification API Server".to_string(),
            model_path: None,
            model_input_name: None,
            preload_model: true,
            history_path: None,
            allowed_extensions: [".wav", ".mp3", ".flac", ".ogg"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_upload_bytes: 10 * 1024 * 1024,
            requests_per_minute: 10,
            burst: 5,
            max_concurrent_inferences: 2,
            cors_origins: vec!["http://localhost:3000".to_string()],
            trust_forwarded_for: false,
            features: FeatureParams::default(),
        }
    }
}

impl AppSettings {
    /// Load settings from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = Paths::get();
        let file = paths.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings.
    pub fn validate(&self) -> ConfigResult<()> {
        self.features.validate()?;

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_inferences == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_inferences must be greater than zero".to_string(),
            ));
        }
        if self.allowed_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one audio extension must be allowed".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolved model path.
    pub fn model_path(&self) -> PathBuf {
        self.model_path
            .clone()
            .unwrap_or_else(|| Paths::get().model_file())
    }

    /// Resolved history path.
    pub fn history_path(&self) -> PathBuf {
        self.history_path
            .clone()
            .unwrap_or_else(|| Paths::get().history_file())
    }

    /// Socket address string to bind to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.port, 3001);
        assert_eq!(settings.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(settings.features.n_mels, 128);
        assert_eq!(settings.features.max_time_steps, 128);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_serialization() {
        let settings = AppSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.port, settings.port);
        assert_eq!(parsed.allowed_extensions, settings.allowed_extensions);
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let parsed: AppSettings =
            serde_json::from_str(r#"{"port": 8080, "features": {"n_mels": 64}}"#).unwrap();
        assert_eq!(parsed.port, 8080);
        assert_eq!(parsed.features.n_mels, 64);
        assert_eq!(parsed.features.n_fft, 1024);
        assert!(parsed.preload_model);
    }

    #[test]
    fn test_load_from_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        fs::write(&path, r#"{"max_concurrent_inferences": 0}"#).unwrap();
        assert!(AppSettings::load_from(&path).is_err());

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            AppSettings::load_from(&path),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_feature_params_validation() {
        let mut params = FeatureParams::default();
        assert!(params.validate().is_ok());

        params.hop_length = 0;
        assert!(params.validate().is_err());
    }
}
