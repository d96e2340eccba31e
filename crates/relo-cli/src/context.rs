use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use relo::DirectoryRegistry;

use crate::error::{CliError, ExitStatus};
use crate::util::Verbosity;

/// Environment variable overriding the registry root when no `--registry`
/// flag is given.
pub const REGISTRY_ENV: &str = "RELO_REGISTRY_DIR";

pub struct CliSession {
    pub registry: Arc<DirectoryRegistry>,
    pub registry_root: PathBuf,
    pub verbosity: Verbosity,
}

impl CliSession {
    /// Resolves the registry root (flag, then environment, then
    /// `~/.relo/projects`) and wires up the directory-backed registry.
    pub fn bootstrap(
        registry_override: Option<String>,
        verbosity: Verbosity,
    ) -> Result<Self, CliError> {
        let registry_root = match registry_override {
            Some(path) => PathBuf::from(path),
            None => match env::var_os(REGISTRY_ENV) {
                Some(path) => PathBuf::from(path),
                None => default_registry_root()?,
            },
        };

        let registry = Arc::new(DirectoryRegistry::new(registry_root.clone()));
        Ok(Self {
            registry,
            registry_root,
            verbosity,
        })
    }
}

fn default_registry_root() -> Result<PathBuf, CliError> {
    let home = env::var_os("HOME").map(PathBuf::from).ok_or_else(|| {
        CliError::new(
            format!("cannot resolve registry root: HOME is unset (use --registry or {REGISTRY_ENV})"),
            ExitStatus::Config,
        )
    })?;
    Ok(home.join(".relo").join("projects"))
}
