//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use domain::ModelVariant;
use infrastructure::{AppConfig, ConfigError, telemetry::verbosity_filter};

/// Local LLM inference worker
#[derive(Debug, Parser)]
#[command(name = "llm-worker")]
#[command(author, version, about = "Local LLM inference worker speaking NDJSON over stdio", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file (defaults to ./config.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve commands from stdin, writing events to stdout
    Serve {
        /// Variant used when a command carries no model_type
        #[arg(short = 'm', long)]
        variant: Option<ModelVariant>,
    },

    /// Probe for a compute adapter once and report it
    Check,

    /// List the available model variants
    Variants,
}

impl Cli {
    /// Load configuration and apply command-line overrides
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load_from(path)?,
            None => AppConfig::load()?,
        };

        if self.verbose > 0 {
            config.telemetry.log_filter = verbosity_filter(self.verbose).to_string();
        }
        if let Commands::Serve {
            variant: Some(variant),
        } = self.command
        {
            config.worker.default_variant = variant;
        }
        Ok(config)
    }
}
