//! Stepline CLI
//!
//! Command-line interface for authoring, compiling and queueing pipelines.

mod commands;
mod config;
mod record;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stepline")]
#[command(about = "Stepline pipeline builder and queue CLI", long_about = None)]
struct Cli {
    /// Queue API URL
    #[arg(long, env = "STEPLINE_API_URL", default_value = "http://localhost:8090")]
    api_url: String,

    /// Bearer token for the queue API
    #[arg(long, env = "STEPLINE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// File holding the selected global runner of each pipeline
    #[arg(long, env = "STEPLINE_RUNNER_STORE", default_value = ".stepline/runners.json")]
    runner_store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        token: cli.token,
        runner_store: cli.runner_store,
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}
