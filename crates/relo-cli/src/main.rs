use std::process::ExitCode;

fn main() -> ExitCode {
    relo_cli::run()
}
