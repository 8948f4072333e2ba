//! # Sirene - Ambulance Siren Detection Service
//!
//! Sirene classifies short audio clips as an ambulance siren or traffic
//! noise. Clips are decoded, turned into a log-mel spectrogram and fed to
//! an externally trained model; results are served over HTTP and every
//! attempt is appended to a JSON history log.
//!
//! ## Features
//!
//! - **Audio Decoding**: WAV, MP3, FLAC and Ogg Vorbis via symphonia
//! - **Log-Mel Features**: 128-band Slaney mel spectrogram, padded or cropped to 128 frames
//! - **ONNX Inference**: Lazy, shared model loading through ONNX Runtime
//! - **HTTP API**: Upload validation, per-client rate limiting and CORS
//! - **History Log**: Concurrency-safe JSON log with export to JSON, CSV or text
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use sirene::classifier::{AudioClassifier, SpectrogramPipeline, Upload};
//! use sirene::config::AppSettings;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = SpectrogramPipeline::from_settings(&AppSettings::default());
//!     let bytes = std::fs::read("true.wav").unwrap();
//!
//!     let result = pipeline.classify(Upload::new("true.wav", bytes)).await.unwrap();
//!     println!("{} ({:.2}%)", result.label(), result.prediction.confidence_percent());
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Labels, audio formats and file sizes
//! - [`audio`] - Decoding and mel spectrogram extraction
//! - [`model`] - The model trait, ONNX backend and lazy loader
//! - [`classifier`] - Upload validation and the classification pipeline
//! - [`storage`] - Classification history persistence
//! - [`server`] - The HTTP API
//! - [`client`] - HTTP client for a running server
//! - [`config`] - Settings and XDG paths
//! - [`error`] - Error types
//! - [`output`] - Output formatting utilities

pub mod audio;
pub mod classifier;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod server;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use classifier::{AudioClassifier, Classification, SpectrogramPipeline, Upload};
pub use error::{ClassifyError, CliError};
pub use model::{ModelManager, Prediction};
pub use types::{AudioFormat, FileSize, Label};
