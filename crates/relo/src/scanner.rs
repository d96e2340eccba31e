//! Recursive discovery of managed projects inside a directory tree.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::ReloError;
use crate::key;
use crate::registry::ProjectRegistry;

/// A directory with a registry entry, discovered under a scan root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ManagedProject {
    /// Canonicalized absolute path of the project directory.
    pub path: PathBuf,
    /// Registry key derived from `path`.
    pub registry_key: String,
    /// Path relative to the scan root; `.` for the root itself.
    pub relative_path: PathBuf,
}

/// Traversal problem that degraded scan completeness without aborting it.
#[derive(Clone, Debug, Serialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
}

/// Everything a scan produced: discovered projects plus non-fatal warnings.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ScanOutcome {
    pub projects: Vec<ManagedProject>,
    pub warnings: Vec<ScanWarning>,
}

impl ScanOutcome {
    /// Returns the project for the scan root itself, when it is managed.
    pub fn root_project(&self) -> Option<&ManagedProject> {
        self.projects
            .iter()
            .find(|project| project.relative_path == Path::new("."))
    }
}

/// Walks `root` and returns every managed directory beneath it.
///
/// The root is checked first; with `recursive` disabled it is the only
/// candidate. Symlinked directories are not followed, and unreadable
/// directories are reported as warnings while traversal continues. Finding
/// no managed project is not an error.
pub fn scan<R: ProjectRegistry>(
    root: &Path,
    recursive: bool,
    registry: &R,
) -> Result<ScanOutcome, ReloError> {
    let root = root.canonicalize().map_err(|err| {
        ReloError::Operation(format!("cannot resolve scan root {}: {err}", root.display()))
    })?;
    if !root.is_dir() {
        return Err(ReloError::Operation(format!(
            "scan root {} is not a directory",
            root.display()
        )));
    }

    let mut outcome = ScanOutcome::default();

    let root_key = key::encode(&root);
    if registry.exists(&root_key)? {
        outcome.projects.push(ManagedProject {
            path: root.clone(),
            registry_key: root_key,
            relative_path: PathBuf::from("."),
        });
    }

    if !recursive {
        return Ok(outcome);
    }

    for entry in WalkDir::new(&root).min_depth(1).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.clone());
                outcome.warnings.push(ScanWarning {
                    path,
                    message: err.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path().to_path_buf();
        let registry_key = key::encode(&path);
        if registry.exists(&registry_key)? {
            let relative_path = path
                .strip_prefix(&root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.clone());
            outcome.projects.push(ManagedProject {
                path,
                registry_key,
                relative_path,
            });
        }
    }

    Ok(outcome)
}
