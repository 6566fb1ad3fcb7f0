//! Asynchronous BASE_BACKUP driver using Tokio.

mod backup;
mod source;

pub use backup::{read_result_set, run_base_backup, run_base_backup_with_opts};
pub use source::{AsyncMessageSource, FramedSource};
