//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod executions;
mod pipeline;
mod runner;
mod step;

pub use executions::ExecutionCommands;
pub use pipeline::PipelineCommands;
pub use runner::RunnerCommands;
pub use step::StepCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Compile, queue and cancel pipelines
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Edit the steps of a pipeline record
    Step {
        #[command(subcommand)]
        command: StepCommands,
    },
    /// Global runner selection per pipeline
    Runner {
        #[command(subcommand)]
        command: RunnerCommands,
    },
    /// Execution history
    Executions {
        #[command(subcommand)]
        command: ExecutionCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config).await,
        Commands::Step { command } => step::handle_step_command(command),
        Commands::Runner { command } => runner::handle_runner_command(command, config),
        Commands::Executions { command } => {
            executions::handle_execution_command(command, config).await
        }
    }
}
