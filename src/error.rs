//! Error types for Sirene.
//!
//! Uses `thiserror` for ergonomic error definitions.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while decoding audio or extracting features.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Unsupported or unreadable audio stream: {0}")]
    Unsupported(String),

    #[error("No default audio track")]
    NoTrack,

    #[error("Missing sample rate")]
    MissingSampleRate,

    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    #[error("Decoded 0 samples")]
    Empty,

    #[error("Invalid feature parameters: {0}")]
    InvalidParams(String),
}

/// Result type alias for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors raised while loading or running the classification model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to load model: {0}")]
    LoadFailed(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model produced no scores")]
    EmptyOutput,

    #[error("Model predicted unknown class index {0}")]
    UnknownClass(usize),
}

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by the classification pipeline.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// The upload was rejected before any processing happened.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl ClassifyError {
    /// Whether this error was caused by the client's input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for classification.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Errors raised by the history store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory: {0}")]
    DirectoryError(String),

    #[error("Failed to save history: {0}")]
    SaveFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised while reading or writing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine configuration directory")]
    DirectoryNotFound,

    #[error("Failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("Invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised by the HTTP client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response ({status}): {body}")]
    UnexpectedResponse { status: u16, body: String },
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Top-level error for CLI subcommands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Server responded {status}: {message}")]
    Server { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
