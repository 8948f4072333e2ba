//! Export subcommand implementation.
//!
//! Handles the `sirene export` command for exporting classification history.

use crate::cli::OutputFormat;
use crate::config::AppSettings;
use crate::error::CliResult;
use crate::output;
use crate::storage::HistoryStore;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Export classification history.
#[derive(Parser, Debug)]
pub struct ExportCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Output file path (prints to stdout if not specified)
    #[arg(short = 'o', long = "output")]
    pub output_file: Option<PathBuf>,

    /// Export only the last N attempts
    #[arg(short = 'n', long)]
    pub last: Option<usize>,

    /// Export only failed attempts
    #[arg(long)]
    pub failed_only: bool,

    /// Path to the JSON history log
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,
}

impl ExportCommand {
    /// Execute the export command.
    pub fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let store = HistoryStore::new(
            self.history
                .clone()
                .unwrap_or_else(|| settings.history_path()),
        );

        let mut records = store.list();
        if self.failed_only {
            records.retain(|r| !r.success);
        }
        if let Some(last) = self.last {
            let skip = records.len().saturating_sub(last);
            records.drain(..skip);
        }

        match &self.output_file {
            Some(path) => {
                let mut file = BufWriter::new(File::create(path)?);
                output::write_history(&records, self.format, &mut file)?;
                file.flush()?;

                if !quiet {
                    output::print_success(&format!(
                        "Exported {} records to {}",
                        records.len(),
                        path.display()
                    ));
                }
            }
            None => {
                let stdout = io::stdout();
                output::write_history(&records, self.format, stdout.lock())?;
            }
        }

        Ok(())
    }
}
