//! History subcommand implementation.
//!
//! Handles the `sirene history` command for viewing and pruning the
//! classification log.

use crate::config::AppSettings;
use crate::error::CliResult;
use crate::output;
use crate::storage::HistoryStore;
use clap::Parser;
use std::path::PathBuf;

/// View and manage classification history.
#[derive(Parser, Debug)]
pub struct HistoryCommand {
    /// Number of recent attempts to show
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    /// Show detailed information for each attempt
    #[arg(short, long)]
    pub detailed: bool,

    /// Clear all history
    #[arg(long, conflicts_with = "prune")]
    pub clear: bool,

    /// Delete attempts older than N days
    #[arg(long, value_name = "DAYS")]
    pub prune: Option<u32>,

    /// Path to the JSON history log
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,
}

impl HistoryCommand {
    /// Execute the history command.
    pub async fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let store = HistoryStore::new(
            self.history
                .clone()
                .unwrap_or_else(|| settings.history_path()),
        );

        if self.clear {
            let removed = store.clear().await?;
            if !quiet {
                output::print_success(&format!("Cleared {} history records", removed));
            }
            return Ok(());
        }

        if let Some(days) = self.prune {
            let removed = store.prune(chrono::Duration::days(i64::from(days))).await?;
            if !quiet {
                output::print_success(&format!(
                    "Removed {} records older than {} days",
                    removed, days
                ));
            }
            return Ok(());
        }

        let records = store.list_recent(self.count);
        output::print_history(&records, self.detailed)?;

        if !quiet {
            println!();
            output::print_stats(&store.stats());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::AttemptInfo;
    use crate::types::{FileSize, Label};

    fn attempt() -> AttemptInfo {
        AttemptInfo {
            file_name: "true.wav".to_string(),
            file_size: FileSize::new(100),
            audio_format: ".wav".to_string(),
            client_ip: "127.0.0.1".to_string(),
            user_agent: None,
            outcome: Ok((Label::Ambulance, 0.9)),
            processing_time_ms: Some(5.0),
        }
    }

    fn command(path: PathBuf) -> HistoryCommand {
        HistoryCommand {
            count: 10,
            detailed: false,
            clear: false,
            prune: None,
            history: Some(path),
        }
    }

    #[tokio::test]
    async fn test_clear_empties_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = HistoryStore::new(&path);
        store.log_attempt(attempt()).await.unwrap();
        store.log_attempt(attempt()).await.unwrap();

        let cmd = HistoryCommand {
            clear: true,
            ..command(path)
        };
        cmd.execute(&AppSettings::default(), true).await.unwrap();

        assert!(store.list().is_empty());
    }

    #[tokio::test]
    async fn test_prune_keeps_recent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = HistoryStore::new(&path);
        store.log_attempt(attempt()).await.unwrap();

        let cmd = HistoryCommand {
            prune: Some(30),
            ..command(path)
        };
        cmd.execute(&AppSettings::default(), true).await.unwrap();

        assert_eq!(store.list().len(), 1);
    }
}
