//! Classify subcommand implementation.
//!
//! Handles the `sirene classify <file>` command, which uploads a file to a
//! running server.

use super::{spinner, ReportFormat};
use crate::client::{ClassifyClient, DEFAULT_URL};
use crate::error::{CliError, CliResult};
use crate::output;
use clap::Parser;
use std::path::PathBuf;

/// Upload an audio file to a running server.
#[derive(Parser, Debug)]
pub struct ClassifyCommand {
    /// Audio file to classify (.wav, .mp3, .flac, .ogg)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Base URL of the server
    #[arg(short, long, env = "SIRENE_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: ReportFormat,
}

impl ClassifyCommand {
    /// Execute the classify command.
    pub async fn execute(&self, quiet: bool) -> CliResult<()> {
        let client = ClassifyClient::new(&self.url)?;

        let pb = spinner(
            format!("Uploading to {}", client.endpoint()),
            quiet || self.output == ReportFormat::Json,
        );
        let result = client.classify_file(&self.file).await;
        pb.finish_and_clear();
        let envelope = result?;

        if self.output == ReportFormat::Json {
            output::print_json(&envelope)?;
            return Ok(());
        }

        if !envelope.success {
            return Err(CliError::Server {
                status: envelope.status,
                message: envelope.message,
            });
        }

        output::print_envelope(&self.file.display().to_string(), &envelope)?;
        Ok(())
    }
}
