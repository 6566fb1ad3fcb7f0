//! Synchronous BASE_BACKUP driver.

mod backup;
mod source;

pub use backup::{read_result_set, run_base_backup, run_base_backup_with_opts};
pub use source::{FramedSource, MessageSource};
