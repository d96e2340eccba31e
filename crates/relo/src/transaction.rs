//! Transactional execution of a validated plan.
//!
//! Every applied effect pushes an inverse record onto an explicit undo
//! stack; a mid-run failure replays the stack most-recent-first. Rollback
//! is best effort: a failing undo step is reported but never stops the
//! sweep, so as much state as possible is recovered.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ReloError;
use crate::planner::{Operation, Plan};
use crate::registry::ProjectRegistry;
use crate::validator;

/// Lifecycle of one invocation. `Aborted`, `Committed`, and `RolledBack`
/// are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxState {
    Idle,
    Validating,
    Executing,
    Committed,
    Aborted,
    RollingBack,
    RolledBack,
}

/// Inverse of one applied effect, sufficient to restore prior state.
#[derive(Clone, Debug)]
enum TransactionRecord {
    /// The tree was physically moved from `from` to `to`.
    /// `created_parents` is the topmost destination ancestor that had to
    /// be created for the move and must go away again on undo.
    MovedTree {
        from: PathBuf,
        to: PathBuf,
        created_parents: Option<PathBuf>,
    },
    /// The registry entry moved from `old_key` to `new_key`.
    RekeyedEntry { old_key: String, new_key: String },
}

/// One operation's visible effect, also emitted as the dry-run preview.
#[derive(Clone, Debug, Serialize)]
pub struct AppliedStep {
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_key: Option<String>,
    pub moved_tree: bool,
}

/// Mid-run failure detail.
#[derive(Clone, Debug, Serialize)]
pub struct OperationFailure {
    pub operation_index: usize,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub message: String,
}

/// Full itemized result of one invocation: what was validated, applied,
/// and, on failure, rolled back.
#[derive(Clone, Debug, Serialize)]
pub struct TransactionOutcome {
    pub state: TxState,
    pub dry_run: bool,
    pub applied: Vec<AppliedStep>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<OperationFailure>,
    /// Undo steps that themselves failed; non-empty means manual
    /// inspection is required.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rollback_errors: Vec<String>,
}

impl TransactionOutcome {
    fn new(dry_run: bool) -> Self {
        Self {
            state: TxState::Idle,
            dry_run,
            applied: Vec::new(),
            validation_errors: Vec::new(),
            failure: None,
            rollback_errors: Vec::new(),
        }
    }

    pub fn committed(&self) -> bool {
        self.state == TxState::Committed
    }
}

/// Executes plans against the real filesystem and an injected registry.
pub struct TransactionManager<R: ProjectRegistry> {
    registry: R,
}

impl<R: ProjectRegistry> TransactionManager<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    /// Validates and executes `plan`. Conflicts abort before any mutation;
    /// a mid-run failure rolls back every applied effect. Dry-run walks
    /// the identical state machine with every mutation no-oped.
    ///
    /// `Err` is reserved for infrastructure failures while consulting the
    /// registry during validation; everything else is reported through
    /// the outcome.
    pub fn execute(&self, plan: &Plan, dry_run: bool) -> Result<TransactionOutcome, ReloError> {
        let mut outcome = TransactionOutcome::new(dry_run);

        outcome.state = TxState::Validating;
        let errors = validator::validate(plan, &self.registry)?;
        if !errors.is_empty() {
            outcome.validation_errors = errors;
            outcome.state = TxState::Aborted;
            return Ok(outcome);
        }

        outcome.state = TxState::Executing;
        let mut records: Vec<TransactionRecord> = Vec::new();

        for (index, op) in plan.operations.iter().enumerate() {
            match self.apply(op, dry_run, &mut records) {
                Ok(step) => outcome.applied.push(step),
                Err(err) => {
                    outcome.failure = Some(OperationFailure {
                        operation_index: index,
                        source: op.source.clone(),
                        destination: op.destination.clone(),
                        message: err.to_string(),
                    });
                    outcome.state = TxState::RollingBack;
                    outcome.rollback_errors = self.rollback(&mut records);
                    outcome.state = TxState::RolledBack;
                    return Ok(outcome);
                }
            }
        }

        outcome.state = TxState::Committed;
        Ok(outcome)
    }

    /// Applies one operation: filesystem step, then registry step. Each
    /// effect lands on the undo stack the moment it is confirmed, so a
    /// failure between the two steps still rolls the first one back.
    fn apply(
        &self,
        op: &Operation,
        dry_run: bool,
        records: &mut Vec<TransactionRecord>,
    ) -> Result<AppliedStep, ReloError> {
        let step = AppliedStep {
            source: op.source.clone(),
            destination: op.destination.clone(),
            old_key: op.key_change.as_ref().map(|c| c.old_key.clone()),
            new_key: op.key_change.as_ref().map(|c| c.new_key.clone()),
            moved_tree: op.is_tree_move(),
        };

        if dry_run {
            return Ok(step);
        }

        if op.is_tree_move() {
            let mut created_parents = None;
            if let Some(parent) = op.destination.parent() {
                if !parent.exists() {
                    created_parents = Some(first_missing_ancestor(parent));
                    fs::create_dir_all(parent)?;
                }
            }
            fs::rename(&op.source, &op.destination).map_err(|err| {
                ReloError::Operation(format!(
                    "failed to move {} to {}: {err}",
                    op.source.display(),
                    op.destination.display()
                ))
            })?;
            records.push(TransactionRecord::MovedTree {
                from: op.source.clone(),
                to: op.destination.clone(),
                created_parents,
            });
        } else if !op.destination.is_dir() {
            // Carried by the root move; the tree must already be there.
            return Err(ReloError::Operation(format!(
                "expected {} to exist after the tree move",
                op.destination.display()
            )));
        }

        if let Some(change) = &op.key_change {
            self.registry.rename(&change.old_key, &change.new_key)?;
            records.push(TransactionRecord::RekeyedEntry {
                old_key: change.old_key.clone(),
                new_key: change.new_key.clone(),
            });
        }

        Ok(step)
    }

    /// Replays the undo stack most-recent-first. Failures are collected,
    /// never propagated, so later records still get their chance.
    fn rollback(&self, records: &mut Vec<TransactionRecord>) -> Vec<String> {
        let mut errors = Vec::new();
        while let Some(record) = records.pop() {
            if let Err(err) = self.undo(&record) {
                errors.push(match &record {
                    TransactionRecord::MovedTree { from, .. } => {
                        format!("failed to restore {}: {err}", from.display())
                    }
                    TransactionRecord::RekeyedEntry { old_key, new_key } => format!(
                        "failed to restore registry entry {new_key} to {old_key}: {err}"
                    ),
                });
            }
        }
        errors
    }

    fn undo(&self, record: &TransactionRecord) -> Result<(), ReloError> {
        match record {
            TransactionRecord::MovedTree {
                from,
                to,
                created_parents,
            } => {
                fs::rename(to, from)?;
                if let Some(root) = created_parents {
                    remove_created_parents(to, root)?;
                }
                Ok(())
            }
            TransactionRecord::RekeyedEntry { old_key, new_key } => {
                self.registry.rename(new_key, old_key)
            }
        }
    }
}

/// Topmost ancestor of `path` that does not exist yet.
fn first_missing_ancestor(path: &Path) -> PathBuf {
    let mut missing = path.to_path_buf();
    while let Some(parent) = missing.parent() {
        if parent.exists() {
            break;
        }
        missing = parent.to_path_buf();
    }
    missing
}

/// Removes the ancestor chain created for `destination`, deepest first,
/// up to and including `root`. Only empty directories are removed, so
/// anything placed there since the move is left alone and reported.
fn remove_created_parents(destination: &Path, root: &Path) -> Result<(), ReloError> {
    let mut current = destination.parent();
    while let Some(dir) = current {
        fs::remove_dir(dir).map_err(|err| {
            ReloError::Operation(format!(
                "could not remove created directory {}: {err}",
                dir.display()
            ))
        })?;
        if dir == root {
            break;
        }
        current = dir.parent();
    }
    Ok(())
}
