use std::env;
use std::path::{Path, PathBuf};

use crate::error::{CliError, ExitStatus};

#[derive(Clone, Copy, Debug, Default)]
pub struct Verbosity {
    pub json: bool,
    pub verbose: bool,
}

/// Anchors a possibly relative path at the current working directory
/// without requiring it to exist.
pub fn absolute_path(path: &Path) -> Result<PathBuf, CliError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// Resolves an existing directory argument to its canonical form.
pub fn existing_directory(path: &Path, role: &str) -> Result<PathBuf, CliError> {
    let absolute = absolute_path(path)?;
    if !absolute.exists() {
        return Err(CliError::new(
            format!("{role} path {} does not exist", absolute.display()),
            ExitStatus::Usage,
        ));
    }
    if !absolute.is_dir() {
        return Err(CliError::new(
            format!("{role} must be a directory: {}", absolute.display()),
            ExitStatus::Usage,
        ));
    }
    absolute.canonicalize().map_err(|err| {
        CliError::new(
            format!("cannot resolve {role} path {}: {err}", absolute.display()),
            ExitStatus::Io,
        )
    })
}

/// New names must be bare directory names, not paths.
pub fn validate_new_name(name: &str) -> Result<(), CliError> {
    if name.is_empty() {
        return Err(CliError::new(
            "new name must not be empty",
            ExitStatus::Usage,
        ));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(CliError::new(
            format!("new name '{name}' must not contain path separators"),
            ExitStatus::Usage,
        ));
    }
    if name == "." || name == ".." {
        return Err(CliError::new(
            format!("new name '{name}' is not a valid directory name"),
            ExitStatus::Usage,
        ));
    }
    Ok(())
}
