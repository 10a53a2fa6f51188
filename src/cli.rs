//! Command-line argument parsing for sqldeploy.

use clap::{Args, Parser, Subcommand};
use sqldeploy::config::{Config, ENV_URL};
use std::path::PathBuf;

/// Apply ordered SQL scripts to a managed database over HTTP.
#[derive(Parser, Debug)]
#[command(name = "sqldeploy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Environment file loaded before reading credentials (defaults to ./.env)
    #[arg(long, value_name = "PATH", global = true)]
    pub env_file: Option<PathBuf>,

    /// Log every candidate attempt
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check scripts for unbalanced brackets or quotes, bad encoding and
    /// mis-escaped literals
    Validate {
        /// Script files, in order (defaults to the configured list)
        #[arg(value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Execute scripts statement by statement against the remote service
    Deploy(DeployArgs),

    /// Check that the remote service answers authenticated requests
    Ping {
        /// Project base URL
        #[arg(long, value_name = "URL", env = ENV_URL)]
        url: Option<String>,
    },

    /// Check that the expected tables exist on the remote service
    Verify {
        /// Table names (defaults to the configured list)
        #[arg(value_name = "TABLE")]
        tables: Vec<String>,

        /// Project base URL
        #[arg(long, value_name = "URL", env = ENV_URL)]
        url: Option<String>,
    },
}

/// Arguments for `deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Script files, in order (defaults to the configured list)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Project base URL
    #[arg(long, value_name = "URL", env = ENV_URL)]
    pub url: Option<String>,

    /// Pause between statements in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Validate all files first and stop if any is invalid
    #[arg(long)]
    pub validate: bool,

    /// Keep statements whose first lines are comments
    #[arg(long)]
    pub strip_leading_comments: bool,

    /// Check the configured tables after deploying
    #[arg(long)]
    pub verify: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }
}

/// Returns the explicit file list, or the configured one when empty.
pub fn files_or_configured(files: &[PathBuf], config: &Config) -> Vec<PathBuf> {
    if files.is_empty() {
        config.files.clone()
    } else {
        files.to_vec()
    }
}
