use std::ffi::OsString;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::commands;
use crate::context::CliSession;
use crate::error::{CliError, ExitStatus};
use crate::formatter::{OutputFormat, emit_result};
use crate::util::Verbosity;

const NAME: &str = "relo";

pub fn run() -> ExitCode {
    init_tracing();
    match run_cli(std::env::args()) {
        Ok(code) => code,
        Err(err) => {
            err.print();
            err.exit_code()
        }
    }
}

/// Parses CLI arguments, resolves the registry, and dispatches to the
/// appropriate command. Returns a POSIX `sysexits`-compatible `ExitCode`
/// so automation can react deterministically: 0 on commit or dry run,
/// non-zero on abort or rolled-back failure.
pub fn run_cli<I, S>(args: I) -> Result<ExitCode, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let command = build_cli();
    let matches = command.try_get_matches_from(args)?;

    let verbosity = Verbosity {
        json: matches.get_flag("json"),
        verbose: matches.get_flag("verbose"),
    };
    let output = if verbosity.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let registry_override = matches.get_one::<String>("registry").cloned();
    let session = CliSession::bootstrap(registry_override, verbosity)?;
    if session.verbosity.verbose {
        tracing::info!(
            registry = %session.registry_root.display(),
            "resolved registry root"
        );
    }

    let result = dispatch(&session, &matches)?;
    emit_result(result, output)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Defines the root `clap::Command` tree: global flags plus the `mv`,
/// `rename`, and `status` subcommands.
fn build_cli() -> Command {
    Command::new(NAME)
        .about("Relocate registry-managed project trees")
        .arg(
            Arg::new("registry")
                .long("registry")
                .value_name("PATH")
                .help("Registry root directory. Defaults to $RELO_REGISTRY_DIR, then ~/.relo/projects."),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Emit newline-delimited JSON instead of human-readable text."),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Emit additional logging about registry resolution and scanning."),
        )
        .subcommand_required(true)
        .subcommand(commands::mv::command())
        .subcommand(commands::rename::command())
        .subcommand(commands::status::command())
}

fn dispatch(
    session: &CliSession,
    matches: &ArgMatches,
) -> Result<commands::CommandResult, CliError> {
    match matches.subcommand() {
        Some(("mv", sub)) => commands::mv::run(session, sub),
        Some(("rename", sub)) => commands::rename::run(session, sub),
        Some(("status", sub)) => commands::status::run(session, sub),
        _ => Err(CliError::new("missing command", ExitStatus::Usage)),
    }
}
