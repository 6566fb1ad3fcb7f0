//! Sans-I/O state machines for the BASE_BACKUP exchange.
//!
//! These state machines handle the protocol logic without performing any I/O.
//! They produce `Action` values that tell the caller what to do next.

pub mod action;
pub mod base_backup;

pub use action::Action;
pub use base_backup::{BackupResult, BaseBackupStateMachine, Tablespace};
