//! Serve subcommand implementation.
//!
//! Handles the `sirene serve` command for running the HTTP API.

use crate::config::AppSettings;
use crate::error::CliResult;
use crate::server;
use clap::Parser;
use std::path::PathBuf;

/// Run the classification API server.
#[derive(Parser, Debug)]
pub struct ServeCommand {
    /// Address to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Path to the ONNX model file
    #[arg(short, long, value_name = "PATH", env = "SIRENE_MODEL")]
    pub model: Option<PathBuf>,

    /// Path to the JSON history log
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,

    /// Load the model on the first request instead of at startup
    #[arg(long)]
    pub no_preload: bool,
}

impl ServeCommand {
    /// Apply command-line overrides on top of the settings file.
    pub fn apply(&self, mut settings: AppSettings) -> AppSettings {
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(model) = &self.model {
            settings.model_path = Some(model.clone());
        }
        if let Some(history) = &self.history {
            settings.history_path = Some(history.clone());
        }
        if self.no_preload {
            settings.preload_model = false;
        }
        settings
    }

    /// Execute the serve command.
    pub async fn execute(&self, settings: AppSettings) -> CliResult<()> {
        let settings = self.apply(settings);
        tracing::info!(
            "Starting {} v{} on {}",
            settings.service_name,
            env!("CARGO_PKG_VERSION"),
            settings.bind_address()
        );

        server::serve(settings).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_settings() {
        let cmd = ServeCommand {
            host: Some("127.0.0.1".to_string()),
            port: Some(9000),
            model: Some(PathBuf::from("m.onnx")),
            history: None,
            no_preload: true,
        };

        let settings = cmd.apply(AppSettings::default());
        assert_eq!(settings.bind_address(), "127.0.0.1:9000");
        assert_eq!(settings.model_path(), PathBuf::from("m.onnx"));
        assert!(!settings.preload_model);
        assert!(settings.history_path.is_none());
    }

    #[test]
    fn test_no_overrides_keeps_settings() {
        let cmd = ServeCommand {
            host: None,
            port: None,
            model: None,
            history: None,
            no_preload: false,
        };

        let settings = cmd.apply(AppSettings::default());
        assert_eq!(settings.port, 3001);
        assert!(settings.preload_model);
    }
}
