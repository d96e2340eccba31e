use thiserror::Error;

/// High-level error type shared across relo components.
#[derive(Debug, Error)]
pub enum ReloError {
    #[error("registry error: {0}")]
    Registry(String),
    #[error("registry entry {0} not found")]
    KeyNotFound(String),
    #[error("plan rejected:\n{}", format_errors(.0))]
    Validation(Vec<String>),
    #[error("operation error: {0}")]
    Operation(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_errors(errors: &[String]) -> String {
    errors
        .iter()
        .map(|err| format!("  - {err}"))
        .collect::<Vec<_>>()
        .join("\n")
}
