use std::path::{Path, PathBuf};

use clap::{Arg, ArgAction, ArgMatches, Command};

use relo::{TransactionManager, plan_move, scan};

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::{CliError, ExitStatus};
use crate::util;

pub fn command() -> Command {
    Command::new("mv")
        .about("Move a managed project tree and update its registry entries")
        .arg(
            Arg::new("source")
                .required(true)
                .value_name("SOURCE")
                .help("Project directory to move"),
        )
        .arg(
            Arg::new("destination")
                .required(true)
                .value_name("DEST")
                .help("Target path. An existing directory receives the tree under its current name; a missing path becomes the new root."),
        )
        .args(shared_flags())
}

/// Flags shared between `mv` and `rename`.
pub fn shared_flags() -> Vec<Arg> {
    vec![
        Arg::new("recursive")
            .long("recursive")
            .action(ArgAction::SetTrue)
            .overrides_with("no-recursive")
            .help("Discover and update nested managed projects (default)"),
        Arg::new("no-recursive")
            .long("no-recursive")
            .action(ArgAction::SetTrue)
            .help("Only consider the root directory itself"),
        Arg::new("dry-run")
            .long("dry-run")
            .action(ArgAction::SetTrue)
            .help("Preview the plan without changing anything"),
        Arg::new("force")
            .long("force")
            .short('f')
            .action(ArgAction::SetTrue)
            .help("Proceed even when the root directory has no registry entry"),
    ]
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let source = matches
        .get_one::<String>("source")
        .map(PathBuf::from)
        .ok_or_else(|| CliError::new("source path required", ExitStatus::Usage))?;
    let destination = matches
        .get_one::<String>("destination")
        .map(PathBuf::from)
        .ok_or_else(|| CliError::new("destination path required", ExitStatus::Usage))?;

    let source = util::existing_directory(&source, "source")?;
    let destination_root = resolve_destination(&source, &destination)?;
    if destination_root == source {
        return Err(CliError::new(
            format!("{} is already at the requested location", source.display()),
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
                "{} is not a managed project (no registry entry; use --force to move it anyway)",
                source.display()
            ),
            ExitStatus::Data,
        ));
    }

    let plan = plan_move(&scanned, &source, &destination_root)?;
    let manager = TransactionManager::new(session.registry.clone());
    let outcome = manager.execute(&plan, dry_run)?;

    Ok(CommandResult::Relocation {
        plan,
        outcome,
        warnings: scanned.warnings,
    })
}

/// Destination rules: an existing directory receives the source under its
/// current leaf name, a missing path becomes the new root, and an existing
/// file is refused.
fn resolve_destination(source: &Path, destination: &Path) -> Result<PathBuf, CliError> {
    let destination = util::absolute_path(destination)?;
    if destination.is_file() {
        return Err(CliError::new(
            format!(
                "destination {} exists as a file; cannot move a directory onto it",
                destination.display()
            ),
            ExitStatus::Usage,
        ));
    }

    if destination.is_dir() {
        let destination = destination.canonicalize()?;
        let leaf = source.file_name().ok_or_else(|| {
            CliError::new(
                format!("cannot determine the leaf name of {}", source.display()),
                ExitStatus::Usage,
            )
        })?;
        Ok(destination.join(leaf))
    } else {
        Ok(destination)
    }
}
