//! Turns scan results into an ordered relocation plan.
//!
//! Planning is a pure transformation: nothing here touches the filesystem
//! or the registry. The root operation is always first and is the single
//! physical tree move; deeper operations are carried by it on disk and
//! only rewrite their registry keys.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ReloError;
use crate::key;
use crate::scanner::ScanOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Move,
    Rename,
}

/// Registry-side half of an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyChange {
    pub old_key: String,
    pub new_key: String,
}

/// One filesystem-plus-registry change unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Position relative to the old root; `.` marks the tree move itself.
    pub relative_path: PathBuf,
    /// `None` when the directory is unmanaged (the root of a forced move).
    pub key_change: Option<KeyChange>,
}

impl Operation {
    /// Whether this operation physically relocates the tree. Exactly one
    /// operation per plan does; the rest are carried by it.
    pub fn is_tree_move(&self) -> bool {
        self.relative_path == Path::new(".")
    }
}

/// The full ordered operation sequence for one invocation. Immutable once
/// built; validation and execution never reorder it.
#[derive(Clone, Debug, Serialize)]
pub struct Plan {
    pub kind: OperationKind,
    pub old_root: PathBuf,
    pub destination_root: PathBuf,
    pub operations: Vec<Operation>,
}

/// Plans a move of `old_root` to the already-resolved final path
/// `destination_root`.
pub fn plan_move(
    outcome: &ScanOutcome,
    old_root: &Path,
    destination_root: &Path,
) -> Result<Plan, ReloError> {
    build(OperationKind::Move, outcome, old_root, destination_root)
}

/// Plans a rename of `old_root` to `new_name` within the same parent.
pub fn plan_rename(
    outcome: &ScanOutcome,
    old_root: &Path,
    new_name: &str,
) -> Result<Plan, ReloError> {
    let parent = old_root.parent().ok_or_else(|| {
        ReloError::Operation(format!("{} has no parent directory", old_root.display()))
    })?;
    let destination_root = parent.join(new_name);
    build(OperationKind::Rename, outcome, old_root, &destination_root)
}

fn build(
    kind: OperationKind,
    outcome: &ScanOutcome,
    old_root: &Path,
    destination_root: &Path,
) -> Result<Plan, ReloError> {
    let mut operations = Vec::with_capacity(outcome.projects.len().max(1));

    for project in &outcome.projects {
        let (source, destination) = if project.relative_path == Path::new(".") {
            (old_root.to_path_buf(), destination_root.to_path_buf())
        } else {
            (
                project.path.clone(),
                destination_root.join(&project.relative_path),
            )
        };
        let new_key =
            key::rekey(&project.registry_key, old_root, destination_root).ok_or_else(|| {
                ReloError::Operation(format!(
                    "key {} is not derived from root {}",
                    project.registry_key,
                    old_root.display()
                ))
            })?;
        operations.push(Operation {
            kind,
            source,
            destination,
            relative_path: project.relative_path.clone(),
            key_change: Some(KeyChange {
                old_key: project.registry_key.clone(),
                new_key,
            }),
        });
    }

    // The tree still moves as a whole even when the root itself carries no
    // registry entry.
    if !operations.iter().any(Operation::is_tree_move) {
        operations.push(Operation {
            kind,
            source: old_root.to_path_buf(),
            destination: destination_root.to_path_buf(),
            relative_path: PathBuf::from("."),
            key_change: None,
        });
    }

    operations.sort_by(|a, b| {
        let depth = |op: &Operation| {
            if op.is_tree_move() {
                0
            } else {
                op.relative_path.components().count()
            }
        };
        depth(a)
            .cmp(&depth(b))
            .then_with(|| a.relative_path.cmp(&b.relative_path))
    });

    Ok(Plan {
        kind,
        old_root: old_root.to_path_buf(),
        destination_root: destination_root.to_path_buf(),
        operations,
    })
}
