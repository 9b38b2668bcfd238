//! CLI module for PHAROS
//!
//! Provides command-line interface parsing for the pharos-server binary.
//! Uses clap for argument parsing; flags override the corresponding
//! environment configuration.

use crate::utils::Config;
use clap::Parser;
use std::path::PathBuf;

/// PHAROS - Pharmaceutical Research Orchestration Server
///
/// Accepts free-text pharmaceutical queries, fans them out to clinical
/// trial, patent, and literature workers, and streams live job progress
/// over WebSockets.
#[derive(Parser, Debug)]
#[command(
    name = "pharos-server",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "PHAROS - Pharmaceutical Research Orchestration Server",
    long_about = "Multi-agent pharmaceutical research orchestration.\n\
                  One submission fans out to clinical-trial, patent, and literature\n\
                  workers under bounded timeouts; partial failures degrade confidence\n\
                  instead of failing the job, and every state change streams to\n\
                  WebSocket subscribers.",
    after_help = "EXAMPLES:\n    \
                  pharos-server                          # Start with env/.env configuration\n    \
                  pharos-server --port 9000              # Override the listen port\n    \
                  pharos-server --data-dir /var/pharos   # Keep job state elsewhere"
)]
pub struct Cli {
    /// Host address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory for job state snapshots
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory for rendered report artifacts
    #[arg(long)]
    pub reports_dir: Option<PathBuf>,

    /// Per-worker timeout in seconds
    #[arg(long)]
    pub worker_timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Fold command-line overrides into the environment configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.display().to_string();
        }
        if let Some(reports_dir) = &self.reports_dir {
            config.storage.reports_dir = reports_dir.display().to_string();
        }
        if let Some(timeout) = self.worker_timeout {
            config.orchestrator.worker_timeout_secs = timeout;
        }
    }
}
