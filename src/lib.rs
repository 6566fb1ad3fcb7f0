//! Client-side decoder for the PostgreSQL `BASE_BACKUP` replication exchange.
//!
//! # Features
//!
//! - **Sans-I/O state machine**: the three-phase exchange (start position,
//!   tablespaces, COPY stream) is driven without doing any I/O itself
//! - **Sync and async drivers**: blocking `std::io::Write` sinks or tokio
//!   `AsyncWrite` sinks
//! - **Byte-exact streaming**: the sink receives the CopyData payloads
//!   concatenated, nothing added or removed
//!
//! Connection setup and authentication are out of scope: hand the driver a
//! [`sync::MessageSource`] (or wrap an authenticated replication stream in
//! [`sync::FramedSource`]).
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::net::TcpStream;
//!
//! use pg_basebackup::sync::{FramedSource, run_base_backup};
//!
//! fn backup(authenticated: TcpStream) -> pg_basebackup::Result<()> {
//!     let mut source = FramedSource::new(authenticated);
//!     let mut out = File::create("base.tar").map_err(pg_basebackup::Error::Sink)?;
//!
//!     let result = run_base_backup(&mut source, &mut out)?;
//!     println!("backup starts at {} on timeline {}", result.start_position, result.timeline_id);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod lsn;
pub mod message;
pub mod opts;
pub mod protocol;
pub mod result_set;
pub mod state;

#[cfg(feature = "sync")]
pub mod sync;

#[cfg(feature = "tokio")]
pub mod tokio;

pub use error::{Error, ErrorFields, Result};
pub use lsn::{Lsn, ParseLsnError};
pub use message::{BackendMessage, FieldInfo};
pub use opts::BackupOpts;
pub use result_set::{FieldIndex, ResultSet, ResultSetReader};
pub use state::{BackupResult, BaseBackupStateMachine, Tablespace};
