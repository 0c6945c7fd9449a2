//! Runner command handlers
//!
//! Manages the global runner selected for each pipeline.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use stepline_client::RunnerStore;

use crate::config::Config;

/// Runner subcommands
#[derive(Subcommand)]
pub enum RunnerCommands {
    /// Select the global runner of a pipeline
    Set {
        /// Pipeline ID
        pipeline_id: String,

        /// Runner path (e.g., acme/runners/pixel-8)
        runner_path: String,
    },
    /// Show the selected global runner of a pipeline
    Get {
        /// Pipeline ID
        pipeline_id: String,
    },
    /// Forget the selected global runner of a pipeline
    Clear {
        /// Pipeline ID
        pipeline_id: String,
    },
}

/// Handle runner commands
pub fn handle_runner_command(command: RunnerCommands, config: &Config) -> Result<()> {
    let store = config.runners();

    match command {
        RunnerCommands::Set {
            pipeline_id,
            runner_path,
        } => {
            store.set_runner(&pipeline_id, &runner_path)?;
            println!(
                "{}",
                format!("✓ Runner for {} set to {}", pipeline_id, runner_path)
                    .green()
                    .bold()
            );
        }
        RunnerCommands::Get { pipeline_id } => match store.runner_for(&pipeline_id)? {
            Some(runner) => println!("{}", runner.cyan()),
            None => println!(
                "{}",
                format!("No runner selected for {}.", pipeline_id).yellow()
            ),
        },
        RunnerCommands::Clear { pipeline_id } => {
            if store.clear_runner(&pipeline_id)? {
                println!(
                    "{}",
                    format!("✓ Runner for {} cleared", pipeline_id).green().bold()
                );
            } else {
                println!(
                    "{}",
                    format!("No runner selected for {}.", pipeline_id).yellow()
                );
            }
        }
    }

    Ok(())
}
