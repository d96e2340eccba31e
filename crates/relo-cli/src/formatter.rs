use std::path::Path;
use std::process::ExitCode;

use serde_json::json;

use relo::{OperationKind, TxState};

use crate::commands::CommandResult;
use crate::error::CliError;

pub enum OutputFormat {
    Text,
    Json,
}

/// Renders a `CommandResult` as human-readable text or newline-delimited
/// JSON and converts the outcome into a deterministic exit code.
pub fn emit_result(result: CommandResult, format: OutputFormat) -> Result<ExitCode, CliError> {
    match format {
        OutputFormat::Text => print_text(&result),
        OutputFormat::Json => print_json(&result)?,
    };
    Ok(ExitCode::from(result.exit_status().code()))
}

fn print_text(result: &CommandResult) {
    match result {
        CommandResult::Relocation {
            plan,
            outcome,
            warnings,
        } => {
            let action = match plan.kind {
                OperationKind::Move => "move",
                OperationKind::Rename => "rename",
            };
            println!(
                "Planned {action}: {} -> {}",
                plan.old_root.display(),
                plan.destination_root.display()
            );
            println!("Operations ({}):", plan.operations.len());
            for op in &plan.operations {
                match &op.key_change {
                    Some(change) => println!(
                        "  {} -> {}  [{} -> {}]",
                        op.source.display(),
                        op.destination.display(),
                        change.old_key,
                        change.new_key
                    ),
                    None => println!(
                        "  {} -> {}  [no registry entry]",
                        op.source.display(),
                        op.destination.display()
                    ),
                }
            }
            for warning in warnings {
                println!("  ! skipped {}: {}", warning.path.display(), warning.message);
            }

            match outcome.state {
                TxState::Committed if outcome.dry_run => {
                    println!(
                        "Dry run: {} operation(s) previewed, nothing changed",
                        outcome.applied.len()
                    );
                }
                TxState::Committed => {
                    println!("Committed {} operation(s)", outcome.applied.len());
                }
                TxState::Aborted => {
                    println!("Aborted: plan rejected by validation:");
                    for error in &outcome.validation_errors {
                        println!("  - {error}");
                    }
                }
                TxState::RolledBack => {
                    if let Some(failure) = &outcome.failure {
                        println!(
                            "Operation {} failed ({} -> {}): {}",
                            failure.operation_index + 1,
                            failure.source.display(),
                            failure.destination.display(),
                            failure.message
                        );
                    }
                    println!("Rolled back {} applied operation(s)", outcome.applied.len());
                    if outcome.rollback_errors.is_empty() {
                        println!("All changes were restored");
                    } else {
                        println!("Some changes could not be restored; inspect these manually:");
                        for error in &outcome.rollback_errors {
                            println!("  - {error}");
                        }
                    }
                }
                _ => {}
            }
        }
        CommandResult::Status {
            path,
            registry_key,
            managed,
            projects,
            warnings,
        } => {
            if *managed {
                println!("{path} is a managed project (key: {registry_key})");
            } else {
                println!("{path} is not a managed project (expected key: {registry_key})");
            }
            let nested: Vec<_> = projects
                .iter()
                .filter(|project| project.relative_path != Path::new("."))
                .collect();
            println!("Managed subprojects ({}):", nested.len());
            for project in nested {
                println!(
                    "  - {} (key: {})",
                    project.relative_path.display(),
                    project.registry_key
                );
            }
            for warning in warnings {
                println!("  ! skipped {}: {}", warning.path.display(), warning.message);
            }
        }
    }
}

fn print_json(result: &CommandResult) -> Result<(), CliError> {
    let payload = json!(result);
    println!("{payload}");
    Ok(())
}
