//! Step command handlers
//!
//! Edits the authored steps of a pipeline record. Every edit goes through the
//! step builder and rewrites the record with its recompiled definition.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use serde_json::Value;
use stepline_builder::{StepBuilder, StepForm};
use stepline_compiler::ActivityOptions;
use stepline_core::domain::pipeline::PipelineRecord;
use stepline_core::domain::step::{
    CatalogItem, ConformanceCheckData, RunnerRef, Step, UtilityAction, WalletActionData,
};
use stepline_core::registry::StepKind;
use tracing::debug;

use crate::record::{load_record, save_record, update_record};

/// Step subcommands
#[derive(Subcommand)]
pub enum StepCommands {
    /// List the steps of a record
    List {
        /// Path to the pipeline record (JSON)
        #[arg(short, long)]
        record: PathBuf,
    },
    /// Remove a step
    Remove {
        #[arg(short, long)]
        record: PathBuf,

        /// Step ID
        id: String,
    },
    /// Move a step up (negative) or down (positive)
    Move {
        #[arg(short, long)]
        record: PathBuf,

        /// Step ID
        id: String,

        /// Positions to move by
        #[arg(long, allow_hyphen_values = true)]
        by: isize,
    },
    /// Set whether the pipeline continues after this step fails
    ContinueOnError {
        #[arg(short, long)]
        record: PathBuf,

        /// Step ID
        id: String,

        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Append a marketplace item (credential-offer, use-case-verification, custom-check)
    AddItem {
        #[arg(short, long)]
        record: PathBuf,

        /// Step type
        #[arg(short, long)]
        kind: String,

        /// Item ID
        #[arg(long)]
        id: String,

        /// Item name
        #[arg(long)]
        name: String,

        /// Item path (organization/.../slug)
        #[arg(long)]
        path: String,

        /// Owning organization
        #[arg(long, default_value = "")]
        organization: String,
    },
    /// Append a conformance check
    AddConformance {
        #[arg(short, long)]
        record: PathBuf,

        #[arg(long)]
        standard: String,

        #[arg(long)]
        version: String,

        #[arg(long)]
        suite: String,

        #[arg(long)]
        test: String,
    },
    /// Append a utility step (debug, email, http-request)
    AddUtility {
        #[arg(short, long)]
        record: PathBuf,

        /// Utility action
        action: String,

        /// Parameters as key=value pairs; values are read as JSON when possible
        #[arg(short, long, value_parser = parse_key_val)]
        param: Vec<(String, String)>,
    },
    /// Append a wallet action described by a JSON file
    AddWalletAction {
        #[arg(short, long)]
        record: PathBuf,

        /// JSON file with `wallet`, `version`, `action` and optional `runner`
        #[arg(short, long)]
        data: PathBuf,

        /// Pin the step to this runner path
        #[arg(long)]
        runner: Option<String>,
    },
}

/// Parse a single key=value pair
fn parse_key_val(s: &str) -> Result<(String, String)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Handle step commands
pub fn handle_step_command(command: StepCommands) -> Result<()> {
    match command {
        StepCommands::List { record } => {
            let record = load_record(&record)?;
            list_steps(&record);
            Ok(())
        }
        StepCommands::Remove { record, id } => edit(&record, |builder| {
            ensure(builder.delete_step(&id), &id, "removed")
        }),
        StepCommands::Move { record, id, by } => edit(&record, |builder| {
            if !builder.can_shift_step(&id, by) {
                anyhow::bail!("Step {} cannot move by {}", id, by);
            }
            ensure(builder.shift_step(&id, by), &id, "moved")
        }),
        StepCommands::ContinueOnError { record, id, value } => edit(&record, |builder| {
            if !builder.steps().iter().any(|s| s.id == id) {
                anyhow::bail!("No step with ID {}", id);
            }
            builder.set_continue_on_error(&id, value);
            Ok(())
        }),
        StepCommands::AddItem {
            record,
            kind,
            id,
            name,
            path,
            organization,
        } => {
            let kind: StepKind = kind.parse()?;
            if !kind.is_marketplace_item() {
                anyhow::bail!("{} is not a marketplace item type", kind);
            }
            let item = CatalogItem::new(id, name, path, organization);
            edit(&record, |builder| {
                builder.init_add_step(kind);
                if let Some(StepForm::MarketplaceItem(form)) = builder.form_mut() {
                    form.select(item);
                }
                submit(builder)
            })
        }
        StepCommands::AddConformance {
            record,
            standard,
            version,
            suite,
            test,
        } => {
            let check = ConformanceCheckData {
                standard,
                version,
                suite,
                test,
            };
            edit(&record, |builder| {
                builder.init_add_step(StepKind::ConformanceCheck);
                if let Some(StepForm::ConformanceCheck(form)) = builder.form_mut() {
                    form.select(check);
                }
                submit(builder)
            })
        }
        StepCommands::AddUtility {
            record,
            action,
            param,
        } => {
            let action = UtilityAction::from_use(&action).with_context(|| {
                let known: Vec<_> = UtilityAction::ALL.iter().map(|a| a.as_str()).collect();
                format!("Unknown utility {}; expected one of {}", action, known.join(", "))
            })?;
            edit(&record, |builder| {
                builder.init_add_step(StepKind::Utility);
                if let Some(StepForm::Utility(form)) = builder.form_mut() {
                    form.select(action);
                    for (key, raw) in param {
                        let value =
                            serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                        form.set_parameter(key, value);
                    }
                }
                submit(builder)
            })
        }
        StepCommands::AddWalletAction {
            record,
            data,
            runner,
        } => {
            let text = std::fs::read_to_string(&data)
                .with_context(|| format!("Failed to read wallet action: {}", data.display()))?;
            let data: WalletActionData = serde_json::from_str(&text)
                .with_context(|| format!("Invalid wallet action: {}", data.display()))?;
            let runner = runner
                .map(|path| RunnerRef {
                    path,
                    name: String::new(),
                })
                .or(data.runner);
            edit(&record, |builder| {
                builder.init_add_step(StepKind::MobileAutomation);
                if let Some(StepForm::WalletAction(form)) = builder.form_mut() {
                    form.select_wallet(data.wallet);
                    form.select_version(data.version)?;
                    form.select_action(data.action)?;
                    form.set_runner(runner);
                }
                submit(builder)
            })
        }
    }
}

/// Load the record, apply one builder edit, and save it recompiled
fn edit<F>(path: &Path, apply: F) -> Result<()>
where
    F: FnOnce(&mut StepBuilder) -> Result<()>,
{
    let mut record = load_record(path)?;
    let mut builder = StepBuilder::from_steps(record.steps.clone());

    apply(&mut builder)?;
    debug!("Record {} now has {} step(s)", record.id, builder.steps().len());

    update_record(&mut record, &builder, ActivityOptions::default())?;
    save_record(path, &record)?;

    println!("{}", "✓ Record updated".green().bold());
    list_steps(&record);
    Ok(())
}

fn submit(builder: &mut StepBuilder) -> Result<()> {
    let step = builder.submit_form()?;
    println!(
        "{}",
        format!("✓ Added {} step {}", step.kind(), step.id)
            .green()
            .bold()
    );
    Ok(())
}

fn ensure(changed: bool, id: &str, action: &str) -> Result<()> {
    if !changed {
        anyhow::bail!("Step {} was not {}", id, action);
    }
    Ok(())
}

fn list_steps(record: &PipelineRecord) {
    if record.steps.is_empty() {
        println!("{}", "No steps.".yellow());
        return;
    }

    println!(
        "{}",
        format!("{} ({} step(s)):", record.name, record.steps.len()).bold()
    );
    for (index, step) in record.steps.iter().enumerate() {
        print_step(index, step);
    }
}

fn print_step(index: usize, step: &Step) {
    let tolerant = if step.continue_on_error {
        "continue on error".dimmed()
    } else {
        "stop on error".yellow()
    };
    println!(
        "  {}. {} {} [{}] {}",
        index + 1,
        step.kind().label().cyan(),
        step.name.bold(),
        step.id.dimmed(),
        tolerant
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_record(dir: &Path) -> PathBuf {
        let path = dir.join("pipeline.json");
        let record = json!({ "id": "p1", "name": "Issuance", "steps": [] });
        std::fs::write(&path, record.to_string()).unwrap();
        path
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("url=https://x.test/a=b").unwrap(),
            ("url".to_string(), "https://x.test/a=b".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
    }

    #[test]
    fn test_add_then_remove_steps() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_record(dir.path());

        handle_step_command(StepCommands::AddItem {
            record: path.clone(),
            kind: "credential-offer".to_string(),
            id: "c1".to_string(),
            name: "PID".to_string(),
            path: "acme/issuer/pid".to_string(),
            organization: "Acme".to_string(),
        })
        .unwrap();
        handle_step_command(StepCommands::AddUtility {
            record: path.clone(),
            action: "http-request".to_string(),
            param: vec![
                ("url".to_string(), "https://x.test".to_string()),
                ("retries".to_string(), "3".to_string()),
            ],
        })
        .unwrap();

        let record = load_record(&path).unwrap();
        assert_eq!(record.steps.len(), 2);
        assert!(record.yaml.contains("- use: http-request"));
        assert!(record.yaml.contains("retries: 3"));

        let first = record.steps[0].id.clone();
        handle_step_command(StepCommands::Move {
            record: path.clone(),
            id: first.clone(),
            by: 1,
        })
        .unwrap();
        assert_eq!(load_record(&path).unwrap().steps[1].id, first);

        handle_step_command(StepCommands::Remove {
            record: path.clone(),
            id: first,
        })
        .unwrap();
        assert_eq!(load_record(&path).unwrap().steps.len(), 1);
    }

    #[test]
    fn test_rejects_unknown_and_non_item_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_record(dir.path());

        for kind in ["teleport", "utility"] {
            let result = handle_step_command(StepCommands::AddItem {
                record: path.clone(),
                kind: kind.to_string(),
                id: "c1".to_string(),
                name: "PID".to_string(),
                path: "acme/issuer/pid".to_string(),
                organization: String::new(),
            });
            assert!(result.is_err());
        }
        assert!(load_record(&path).unwrap().steps.is_empty());
    }

    #[test]
    fn test_out_of_bounds_move_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_record(dir.path());
        handle_step_command(StepCommands::AddUtility {
            record: path.clone(),
            action: "debug".to_string(),
            param: vec![],
        })
        .unwrap();
        let id = load_record(&path).unwrap().steps[0].id.clone();

        let result = handle_step_command(StepCommands::Move {
            record: path,
            id,
            by: -1,
        });
        assert!(result.is_err());
    }
}
