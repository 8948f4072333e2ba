//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `sirene serve` - Run the HTTP API
//! - `sirene classify <file>` - Send a file to a running server
//! - `sirene predict <file>` - Classify a file locally
//! - `sirene history` - View classification history
//! - `sirene export` - Export classification history

mod classify;
mod export;
mod history;
mod predict;
mod serve;

pub use classify::ClassifyCommand;
pub use export::ExportCommand;
pub use history::HistoryCommand;
pub use predict::PredictCommand;
pub use serve::ServeCommand;

use crate::config::AppSettings;
use crate::error::CliResult;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sirene - Ambulance siren detection service.
///
/// Sirene serves a spectrogram classifier over HTTP that tells ambulance
/// sirens from traffic noise, and keeps a log of every request.
#[derive(Parser, Debug)]
#[command(name = "sirene")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ambulance siren vs traffic noise classifier", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to custom settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the classification API server
    #[command(alias = "s")]
    Serve(ServeCommand),

    /// Upload a file to a running server
    #[command(alias = "c")]
    Classify(ClassifyCommand),

    /// Classify a file locally without a server
    #[command(alias = "p")]
    Predict(PredictCommand),

    /// View classification history
    #[command(alias = "h")]
    History(HistoryCommand),

    /// Export classification history
    #[command(alias = "e")]
    Export(ExportCommand),
}

impl Cli {
    /// Run the selected subcommand.
    pub async fn execute(self) -> CliResult<()> {
        let settings = load_settings(self.config.as_deref())?;
        let quiet = self.quiet;

        match self.command {
            Commands::Serve(cmd) => cmd.execute(settings).await,
            Commands::Classify(cmd) => cmd.execute(quiet).await,
            Commands::Predict(cmd) => cmd.execute(settings, quiet).await,
            Commands::History(cmd) => cmd.execute(&settings, quiet).await,
            Commands::Export(cmd) => cmd.execute(&settings, quiet),
        }
    }
}

/// Load settings from `--config`, or the default location.
pub fn load_settings(config: Option<&Path>) -> CliResult<AppSettings> {
    let settings = match config {
        Some(path) => AppSettings::load_from(path)?,
        None => AppSettings::load()?,
    };
    Ok(settings)
}

/// Output format for history exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Output format for a single classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
}

/// A spinner shown while waiting on decoding or the server.
fn spinner(message: impl Into<String>, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")
    {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::try_parse_from([
            "sirene",
            "serve",
            "--port",
            "8080",
            "--model",
            "siren.onnx",
            "--no-preload",
        ])
        .unwrap();

        match cli.command {
            Commands::Serve(cmd) => {
                assert_eq!(cmd.port, Some(8080));
                assert_eq!(cmd.model.as_deref(), Some(Path::new("siren.onnx")));
                assert!(cmd.no_preload);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sirene", "history", "-n", "5", "-v"]).unwrap();
        assert!(cli.verbose);

        match cli.command {
            Commands::History(cmd) => assert_eq!(cmd.count, 5),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["sirene", "-v", "-q", "history"]).is_err());
    }

    #[test]
    fn test_export_format() {
        let cli = Cli::try_parse_from(["sirene", "export", "--format", "csv", "-o", "out.csv"])
            .unwrap();

        match cli.command {
            Commands::Export(cmd) => {
                assert_eq!(cmd.format, OutputFormat::Csv);
                assert_eq!(cmd.output_file.as_deref(), Some(Path::new("out.csv")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_missing_config_file_is_error() {
        assert!(load_settings(Some(Path::new("/nonexistent/settings.json"))).is_err());
    }
}
