//! llm-worker
//!
//! Runs the inference worker over stdio, or inspects devices and variants.

#![allow(clippy::print_stdout)]

use clap::Parser;
use infrastructure::{build_pipeline_cache, init_telemetry, serve};
use presentation_cli::{Cli, Commands, output};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Serve { .. } => {
            info!(
                default_variant = %config.worker.default_variant,
                "Starting worker on stdio"
            );
            serve(&config, tokio::io::stdin(), tokio::io::stdout()).await?;
        },

        Commands::Check => {
            let cache = build_pipeline_cache(&config);
            match cache.selector().select_adapter().await {
                Ok(adapter) => println!("✅ Compute adapter: {adapter}"),
                Err(e) => {
                    println!("❌ {e}");
                    std::process::exit(1);
                },
            }
        },

        Commands::Variants => print!("{}", output::variant_table()),
    }

    Ok(())
}
