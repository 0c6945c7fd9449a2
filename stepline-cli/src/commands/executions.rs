//! Execution history command handlers

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use stepline_core::domain::execution::ExecutionSummary;
use stepline_core::dto::execution::Page;

use crate::config::Config;

/// Paging flags shared by the listings
#[derive(Args)]
pub struct PageArgs {
    /// Rows per page
    #[arg(long, default_value = "20")]
    limit: u32,

    /// Rows to skip
    #[arg(long, default_value = "0")]
    offset: u32,
}

impl From<PageArgs> for Page {
    fn from(args: PageArgs) -> Self {
        Page {
            limit: args.limit,
            offset: args.offset,
        }
    }
}

/// Execution subcommands
#[derive(Subcommand)]
pub enum ExecutionCommands {
    /// List workflow executions
    Workflows {
        /// Only executions of this pipeline
        #[arg(short, long)]
        pipeline: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },
    /// List execution results
    Results {
        #[command(flatten)]
        page: PageArgs,
    },
}

/// Handle execution commands
pub async fn handle_execution_command(command: ExecutionCommands, config: &Config) -> Result<()> {
    let client = config.client();

    let rows = match command {
        ExecutionCommands::Workflows { pipeline, page } => {
            client
                .list_workflows(pipeline.as_deref(), page.into())
                .await?
        }
        ExecutionCommands::Results { page } => client.list_results(page.into()).await?,
    };

    if rows.is_empty() {
        println!("{}", "No executions found.".yellow());
    } else {
        println!("{}", format!("Found {} execution(s):", rows.len()).bold());
        println!();
        for row in &rows {
            print_execution_summary(row);
        }
    }

    Ok(())
}

fn print_execution_summary(row: &ExecutionSummary) {
    println!("  {} {}", "▸".cyan(), row.workflow_id.bold());
    println!("    Run:      {}", row.run_id.dimmed());
    println!("    Status:   {}", colorize_status(&row.status));
    if let Some(start) = &row.start_time {
        println!("    Started:  {}", start.dimmed());
    }
    if let Some(end) = &row.end_time {
        println!("    Ended:    {}", end.dimmed());
    }
    println!();
}

fn colorize_status(status: &str) -> ColoredString {
    match status.to_ascii_uppercase().as_str() {
        "COMPLETED" => status.green(),
        "FAILED" | "TERMINATED" | "TIMED_OUT" | "CANCELED" => status.red(),
        _ => status.yellow(),
    }
}
