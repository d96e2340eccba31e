//! Whole-plan conflict detection, run before anything is mutated.
//!
//! All findings are accumulated so the caller can report every conflict at
//! once; a single error string per conflict keeps the surface printable.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::ReloError;
use crate::planner::Plan;
use crate::registry::ProjectRegistry;

/// Checks the full operation list for conflicts. An empty result approves
/// the plan; any entry means the caller must abort before mutation.
pub fn validate<R: ProjectRegistry>(plan: &Plan, registry: &R) -> Result<Vec<String>, ReloError> {
    let mut errors = Vec::new();
    let ops = &plan.operations;

    // 1. Every source must still be present.
    for op in ops {
        if !op.source.exists() {
            errors.push(format!("source path {} does not exist", op.source.display()));
        }
    }

    // 2. Destinations must be free, unless an earlier operation in this
    //    same plan vacates them.
    for (index, op) in ops.iter().enumerate() {
        if op.destination.exists() {
            let vacated = ops[..index].iter().any(|e| e.source == op.destination);
            if !vacated {
                errors.push(format!(
                    "destination path {} already exists",
                    op.destination.display()
                ));
            }
        }
    }

    // 3. A destination landing inside a different operation's source would
    //    overwrite data that operation still owns, unless both belong to
    //    the same vacated subtree.
    for op in ops {
        for other in ops {
            if std::ptr::eq(op, other) {
                continue;
            }
            if op.destination.starts_with(&other.source)
                && !op.source.starts_with(&other.source)
            {
                errors.push(format!(
                    "destination {} would land inside unrelated source {}",
                    op.destination.display(),
                    other.source.display()
                ));
            }
        }
    }

    // 4. Moving a directory into itself.
    for op in ops {
        if op.destination.starts_with(&op.source) {
            errors.push(format!(
                "cannot move {} into itself ({})",
                op.source.display(),
                op.destination.display()
            ));
        }
    }

    // 5. Two operations must never share a destination.
    let mut seen_paths: BTreeSet<&Path> = BTreeSet::new();
    for op in ops {
        if !seen_paths.insert(op.destination.as_path()) {
            errors.push(format!(
                "duplicate destination path {}",
                op.destination.display()
            ));
        }
    }

    // Registry-side mirror: old keys present, new keys free, no duplicate
    // new keys (two paths flattening to the same key is a conflict, not a
    // silent overwrite).
    let mut seen_keys: BTreeSet<&str> = BTreeSet::new();
    for (index, op) in ops.iter().enumerate() {
        let Some(change) = &op.key_change else {
            continue;
        };
        if !registry.exists(&change.old_key)? {
            errors.push(format!("registry entry {} is missing", change.old_key));
        }
        if registry.exists(&change.new_key)? {
            let vacated = ops[..index]
                .iter()
                .filter_map(|e| e.key_change.as_ref())
                .any(|e| e.old_key == change.new_key);
            if !vacated {
                errors.push(format!(
                    "registry entry {} already exists",
                    change.new_key
                ));
            }
        }
        if !seen_keys.insert(change.new_key.as_str()) {
            errors.push(format!("duplicate registry key {}", change.new_key));
        }
    }

    Ok(errors)
}
