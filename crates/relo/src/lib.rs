pub mod error;
pub mod key;
pub mod planner;
pub mod registry;
pub mod scanner;
pub mod transaction;
pub mod validator;

pub use error::ReloError;
pub use planner::{KeyChange, Operation, OperationKind, Plan, plan_move, plan_rename};
pub use registry::{DirectoryRegistry, InMemoryRegistry, ProjectRegistry, RegistryEntry};
pub use scanner::{ManagedProject, ScanOutcome, ScanWarning, scan};
pub use transaction::{
    AppliedStep, OperationFailure, TransactionManager, TransactionOutcome, TxState,
};
pub use validator::validate;
