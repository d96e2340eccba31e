use std::env;
use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command};

use relo::{ProjectRegistry, key, scan};

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;
use crate::util;

pub fn command() -> Command {
    Command::new("status")
        .about("Show whether a directory is a managed project and list managed subprojects")
        .arg(
            Arg::new("path")
                .value_name("PATH")
                .help("Directory to inspect (defaults to the current directory)"),
        )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let path = match matches.get_one::<String>("path") {
        Some(path) => PathBuf::from(path),
        None => env::current_dir()?,
    };
    let path = util::existing_directory(&path, "target")?;

    let registry_key = key::encode(&path);
    let managed = session.registry.exists(&registry_key)?;
    let scanned = scan(&path, true, &session.registry)?;
    for warning in &scanned.warnings {
        tracing::warn!(path = %warning.path.display(), "{}", warning.message);
    }

    Ok(CommandResult::Status {
        path: path.display().to_string(),
        registry_key,
        managed,
        projects: scanned.projects,
        warnings: scanned.warnings,
    })
}
