use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "factory-panel",
    version,
    about = "Engine connectivity monitor and API client for the Factory admin panel",
    long_about = "Polls the Engine health endpoint on a fixed cadence, reports online/offline transitions, and looks up Engine clusters, jobs and templates."
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "FACTORY_PANEL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable JSON logging
    #[arg(long, env = "FACTORY_PANEL_JSON_LOGS", global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Poll the Engine health endpoint until interrupted
    Watch,

    /// Run a single health check; exits non-zero when the Engine is offline
    Check,

    /// Show a cluster
    Cluster {
        /// Cluster identifier
        id: String,
    },

    /// Show a job
    Job {
        /// Job identifier
        id: String,
    },

    /// Show a job template
    Template {
        /// Template identifier
        id: String,
    },

    /// Validate and print the effective configuration
    Config {
        /// Write a default configuration file instead
        #[arg(long, value_name = "FILE")]
        init: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// `watch` is the default when no subcommand is given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Watch)
    }
}
