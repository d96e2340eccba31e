use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command};

use relo::{TransactionManager, plan_rename, scan};

use crate::commands::{CommandResult, mv};
use crate::context::CliSession;
use crate::error::{CliError, ExitStatus};
use crate::util;

pub fn command() -> Command {
    Command::new("rename")
        .about("Rename a managed project in place and update its registry entries")
        .arg(
            Arg::new("source")
                .required(true)
                .value_name("SOURCE")
                .help("Project directory to rename"),
        )
        .arg(
            Arg::new("new-name")
                .required(true)
                .value_name("NEW_NAME")
                .help("New leaf name; the parent directory stays the same"),
        )
        .args(mv::shared_flags())
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let source = matches
        .get_one::<String>("source")
        .map(PathBuf::from)
        .ok_or_else(|| CliError::new("source path required", ExitStatus::Usage))?;
    let new_name = matches
        .get_one::<String>("new-name")
        .cloned()
        .ok_or_else(|| CliError::new("new name required", ExitStatus::Usage))?;

    let source = util::existing_directory(&source, "source")?;
    util::validate_new_name(&new_name)?;
    if source
        .file_name()
        .is_some_and(|leaf| leaf.to_string_lossy() == new_name.as_str())
    {
        return Err(CliError::new(
            format!("{} already has that name", source.display()),
            ExitStatus::Usage,
        ));
    }

    let recursive = !matches.get_flag("no-recursive");
    let dry_run = matches.get_flag("dry-run");
    let force = matches.get_flag("force");

    let scanned = scan(&source, recursive, &session.registry)?;
    for warning in &scanned.warnings {
        tracing::warn!(path = %warning.path.display(), "{}", warning.message);
    }
    if scanned.root_project().is_none() && !force {
        return Err(CliError::new(
            format!(
                "{} is not a managed project (no registry entry; use --force to rename it anyway)",
                source.display()
            ),
            ExitStatus::Data,
        ));
    }

    let plan = plan_rename(&scanned, &source, &new_name)?;
    let manager = TransactionManager::new(session.registry.clone());
    let outcome = manager.execute(&plan, dry_run)?;

    Ok(CommandResult::Relocation {
        plan,
        outcome,
        warnings: scanned.warnings,
    })
}
