//! Pipeline command handlers
//!
//! Handles compiling pipeline records, queueing them for execution and
//! cancelling queued tickets.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use stepline_builder::StepBuilder;
use stepline_client::{ClientError, PollConfig, TicketPoller};
use stepline_compiler::{PipelineDefinition, from_yaml, to_yaml};
use stepline_core::domain::ticket::{QueueTicket, TicketStatus};

use crate::config::Config;
use crate::record::{compile, load_activity_options, load_record};

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Compile a pipeline record into its engine definition
    Compile {
        /// Path to the pipeline record (JSON)
        #[arg(short, long)]
        record: PathBuf,

        /// Engine activity options (YAML); defaults are used when omitted
        #[arg(long)]
        activity_options: Option<PathBuf>,

        /// Write the definition here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Queue a pipeline for execution
    Run {
        /// Path to the pipeline record (JSON)
        #[arg(short, long, conflicts_with = "yaml", required_unless_present = "yaml")]
        record: Option<PathBuf>,

        /// Path to an already compiled definition
        #[arg(short, long)]
        yaml: Option<PathBuf>,

        /// Pipeline ID; defaults to the record's ID
        #[arg(short, long, required_unless_present = "record")]
        pipeline_id: Option<String>,

        /// Engine activity options (YAML), used when compiling a record
        #[arg(long)]
        activity_options: Option<PathBuf>,

        /// Keep polling until a runner picks the pipeline up
        #[arg(short, long)]
        watch: bool,
    },
    /// Cancel a queued or running ticket
    Cancel {
        /// Ticket ID
        ticket_id: String,

        /// Runners assigned to the ticket (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        runner_ids: Vec<String>,
    },
}

/// Handle pipeline commands
///
/// Routes pipeline subcommands to their respective handlers.
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    match command {
        PipelineCommands::Compile {
            record,
            activity_options,
            output,
        } => compile_record(&record, activity_options.as_deref(), output.as_deref()),
        PipelineCommands::Run {
            record,
            yaml,
            pipeline_id,
            activity_options,
            watch,
        } => {
            let (pipeline_id, definition) = match (record, yaml) {
                (Some(record), _) => {
                    definition_from_record(&record, pipeline_id, activity_options.as_deref())?
                }
                (None, Some(yaml)) => {
                    let pipeline_id = pipeline_id
                        .context("--pipeline-id is required when running a definition file")?;
                    (pipeline_id, definition_from_yaml(&yaml)?)
                }
                (None, None) => anyhow::bail!("Either --record or --yaml is required"),
            };
            run_pipeline(config, &pipeline_id, &definition, watch).await
        }
        PipelineCommands::Cancel {
            ticket_id,
            runner_ids,
        } => cancel_ticket(config, &ticket_id, &runner_ids).await,
    }
}

/// Compile a record and print or write the definition
fn compile_record(
    record_path: &Path,
    activity_options: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let (_, definition) = definition_from_record(record_path, None, activity_options)?;
    let yaml = to_yaml(&definition)?;

    match output {
        Some(path) => {
            std::fs::write(path, &yaml)
                .with_context(|| format!("Failed to write definition: {}", path.display()))?;
            println!("{}", "✓ Pipeline compiled successfully!".green().bold());
            println!("  Name:   {}", definition.name.bold());
            println!("  Steps:  {}", definition.steps.len().to_string().cyan());
            println!("  Output: {}", path.display().to_string().dimmed());
            if definition.requires_global_runner() {
                println!(
                    "  {}",
                    "Needs a global runner (stepline runner set)".yellow()
                );
            }
        }
        None => print!("{}", yaml),
    }

    Ok(())
}

fn definition_from_record(
    path: &Path,
    pipeline_id: Option<String>,
    activity_options: Option<&Path>,
) -> Result<(String, PipelineDefinition)> {
    let record = load_record(path)?;
    let builder = StepBuilder::from_steps(record.steps.clone());
    let definition = compile(&record, &builder, load_activity_options(activity_options)?)?;
    Ok((pipeline_id.unwrap_or(record.id), definition))
}

fn definition_from_yaml(path: &Path) -> Result<PipelineDefinition> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read definition: {}", path.display()))?;
    from_yaml(&text).with_context(|| format!("Invalid definition: {}", path.display()))
}

/// Queue a pipeline, optionally waiting for a runner
async fn run_pipeline(
    config: &Config,
    pipeline_id: &str,
    definition: &PipelineDefinition,
    watch: bool,
) -> Result<()> {
    let client = config.client();
    let runners = config.runners();

    if !watch {
        let ticket = client
            .enqueue(pipeline_id, definition, &runners)
            .await
            .map_err(user_error)?;
        println!("{}", "✓ Pipeline queued successfully!".green().bold());
        print_ticket(&ticket);
        return Ok(());
    }

    let poller = TicketPoller::new(Arc::new(client), PollConfig::from_env()?);
    let mut last_position = None;
    let result = poller
        .watch_with(pipeline_id, definition, &runners, |ticket| {
            let position = (ticket.status, ticket.display_position());
            if last_position != Some(position) {
                println!(
                    "  {} {} ({}/{})",
                    "▸".cyan(),
                    colorize_status(ticket.status),
                    ticket.display_position(),
                    ticket.line_len
                );
                last_position = Some(position);
            }
        })
        .await;

    match result {
        Ok(ticket) => {
            println!("{}", "✓ Pipeline execution started!".green().bold());
            print_ticket(&ticket);
            Ok(())
        }
        Err(err @ ClientError::Timeout { .. }) => {
            println!("{}", format!("⚠ {}", err.user_message()).yellow());
            Ok(())
        }
        Err(err) => Err(user_error(err)),
    }
}

async fn cancel_ticket(config: &Config, ticket_id: &str, runner_ids: &[String]) -> Result<()> {
    let ticket = config
        .client()
        .cancel(ticket_id, runner_ids)
        .await
        .map_err(user_error)?;

    println!(
        "{}",
        format!("✓ Ticket {} canceled", ticket.ticket_id)
            .green()
            .bold()
    );

    Ok(())
}

fn user_error(err: ClientError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

fn print_ticket(ticket: &QueueTicket) {
    println!("  Ticket:   {}", ticket.ticket_id.cyan());
    println!("  Status:   {}", colorize_status(ticket.status));
    println!(
        "  Position: {} of {}",
        ticket.display_position(),
        ticket.line_len
    );
    println!(
        "  Queued:   {}",
        ticket.enqueued_at.format("%Y-%m-%d %H:%M:%S")
    );
    let runners = ticket.assigned_runner_ids();
    if !runners.is_empty() {
        println!("  Runners:  {}", runners.join(", ").dimmed());
    }
    if let (Some(workflow), Some(run)) = (&ticket.workflow_id, &ticket.run_id) {
        println!("  Workflow: {} ({})", workflow, run.dimmed());
    }
}

/// Colorize ticket status for display
fn colorize_status(status: TicketStatus) -> ColoredString {
    let status_str = status.as_str();
    match status {
        TicketStatus::Running => status_str.green(),
        TicketStatus::Queued | TicketStatus::Starting => status_str.yellow(),
        TicketStatus::Failed | TicketStatus::NotFound => status_str.red(),
        TicketStatus::Canceled | TicketStatus::Unknown => status_str.dimmed(),
    }
}
