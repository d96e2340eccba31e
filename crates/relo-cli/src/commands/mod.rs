use serde::Serialize;

use relo::scanner::{ManagedProject, ScanWarning};
use relo::{Plan, TransactionOutcome, TxState};

use crate::error::ExitStatus;

pub mod mv;
pub mod rename;
pub mod status;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResult {
    Relocation {
        plan: Plan,
        outcome: TransactionOutcome,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<ScanWarning>,
    },
    Status {
        path: String,
        registry_key: String,
        managed: bool,
        projects: Vec<ManagedProject>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<ScanWarning>,
    },
}

impl CommandResult {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CommandResult::Relocation { outcome, .. } => match outcome.state {
                TxState::Committed => ExitStatus::Ok,
                TxState::Aborted => ExitStatus::Data,
                _ => ExitStatus::Software,
            },
            CommandResult::Status { .. } => ExitStatus::Ok,
        }
    }
}
