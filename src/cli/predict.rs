//! Predict subcommand implementation.
//!
//! Handles the `sirene predict <file>` command, which runs the
//! classification pipeline in-process.

use super::{spinner, ReportFormat};
use crate::classifier::{AudioClassifier, SpectrogramPipeline, Upload};
use crate::config::AppSettings;
use crate::error::CliResult;
use crate::output;
use clap::Parser;
use std::path::PathBuf;

/// Classify an audio file locally.
#[derive(Parser, Debug)]
pub struct PredictCommand {
    /// Audio file to classify
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Path to the ONNX model file
    #[arg(short, long, value_name = "PATH", env = "SIRENE_MODEL")]
    pub model: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: ReportFormat,
}

impl PredictCommand {
    /// Execute the predict command.
    pub async fn execute(&self, mut settings: AppSettings, quiet: bool) -> CliResult<()> {
        if let Some(model) = &self.model {
            settings.model_path = Some(model.clone());
        }

        let bytes = tokio::fs::read(&self.file).await?;
        let filename = self
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let pipeline = SpectrogramPipeline::from_settings(&settings);
        tracing::debug!("Using model {}", pipeline.models().path().display());

        let pb = spinner(
            format!("Classifying {}", filename),
            quiet || self.output == ReportFormat::Json,
        );
        let result = pipeline.classify(Upload::new(filename, bytes)).await;
        pb.finish_and_clear();
        let classification = result?;

        match self.output {
            ReportFormat::Json => output::print_json(&classification)?,
            ReportFormat::Plain => {
                output::print_classification(&self.file.display().to_string(), &classification)?
            }
        }
        Ok(())
    }
}
