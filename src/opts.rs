//! BASE_BACKUP command options.

use crate::error::{Error, Result};

/// Smallest MAX_RATE the server accepts, in kB/s.
pub const MIN_MAX_RATE: u32 = 32;

/// Largest MAX_RATE the server accepts, in kB/s.
pub const MAX_MAX_RATE: u32 = 1_048_576;

/// Options rendered into the `BASE_BACKUP` command.
///
/// The default renders the bare `BASE_BACKUP` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupOpts {
    /// Backup label stored in the backup_label file.
    ///
    /// Default: `None` (server uses "base backup")
    pub label: Option<String>,

    /// Ask the server to compute tablespace sizes up front.
    ///
    /// Default: `false`
    pub progress: bool,

    /// Request an immediate checkpoint instead of a spread one.
    ///
    /// Default: `false`
    pub fast_checkpoint: bool,

    /// Include the required WAL segments in the backup.
    ///
    /// Default: `false`
    pub wal: bool,

    /// Do not wait for WAL archiving to finish.
    ///
    /// Default: `false`
    pub no_wait: bool,

    /// Server-side transfer rate limit in kB/s.
    ///
    /// Default: `None`
    pub max_rate: Option<u32>,

    /// Include a tablespace_map file.
    ///
    /// Default: `false`
    pub tablespace_map: bool,
}

impl BackupOpts {
    /// Render the command text.
    pub fn command(&self) -> Result<String> {
        let mut command = String::from("BASE_BACKUP");

        if let Some(label) = &self.label {
            command.push_str(" LABEL '");
            command.push_str(&label.replace('\'', "''"));
            command.push('\'');
        }
        if self.progress {
            command.push_str(" PROGRESS");
        }
        if self.fast_checkpoint {
            command.push_str(" FAST");
        }
        if self.wal {
            command.push_str(" WAL");
        }
        if self.no_wait {
            command.push_str(" NOWAIT");
        }
        if let Some(rate) = self.max_rate {
            if !(MIN_MAX_RATE..=MAX_MAX_RATE).contains(&rate) {
                return Err(Error::InvalidUsage(format!(
                    "max_rate {rate} kB/s is outside {MIN_MAX_RATE}..={MAX_MAX_RATE}"
                )));
            }
            command.push_str(&format!(" MAX_RATE {rate}"));
        }
        if self.tablespace_map {
            command.push_str(" TABLESPACE_MAP");
        }

        Ok(command)
    }
}
