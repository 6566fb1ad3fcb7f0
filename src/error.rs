//! Error types for pg-basebackup.

use thiserror::Error;

use crate::lsn::ParseLsnError;

/// Result type for pg-basebackup operations.
pub type Result<T> = core::result::Result<T, Error>;

/// PostgreSQL error/notice fields, as carried by an ErrorResponse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorFields {
    /// Severity: ERROR, FATAL, PANIC, WARNING, NOTICE, DEBUG, INFO, LOG
    pub severity: Option<String>,
    /// Non-localized severity (same as severity but never translated)
    pub severity_non_localized: Option<String>,
    /// SQLSTATE error code (5 characters)
    pub code: Option<String>,
    /// Primary error message
    pub message: Option<String>,
    /// Detailed error explanation
    pub detail: Option<String>,
    /// Suggestion for fixing the error
    pub hint: Option<String>,
    /// Context/stack trace
    pub where_: Option<String>,
    /// Source file name
    pub file: Option<String>,
    /// Source line number
    pub line: Option<u32>,
    /// Source routine name
    pub routine: Option<String>,
    /// Fields with a type code not listed above, kept verbatim
    pub other: Vec<(u8, String)>,
}

impl std::fmt::Display for ErrorFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(severity) = &self.severity {
            write!(f, "{}: ", severity)?;
        }
        if let Some(message) = &self.message {
            write!(f, "{}", message)?;
        }
        if let Some(code) = &self.code {
            write!(f, " (SQLSTATE {})", code)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, "\nDETAIL: {}", detail)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\nHINT: {}", hint)?;
        }
        Ok(())
    }
}

/// Error type for pg-basebackup.
///
/// Every variant is fatal for the backup in progress. BASE_BACKUP cannot be
/// resumed mid-stream, so callers retry by starting a fresh exchange.
#[derive(Debug, Error)]
pub enum Error {
    /// Sending or receiving failed below the protocol layer
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Server sent an ErrorResponse
    #[error("PostgreSQL error: {0}")]
    Server(ErrorFields),

    /// Message sequence or content does not match the BASE_BACKUP exchange
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Malformed log sequence number text
    #[error("Format error: {0}")]
    Format(#[from] ParseLsnError),

    /// A required column is absent from a result set
    #[error("Expected field \"{0}\" not found in result set")]
    MissingField(String),

    /// Writing the backup stream to the output sink failed
    #[error("Sink error: {0}")]
    Sink(#[source] std::io::Error),

    /// Invalid usage (e.g., an out-of-range backup option)
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),
}

impl Error {
    /// Returns true if the error came from the message source's transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Returns true if the error came from the output sink.
    pub fn is_sink(&self) -> bool {
        matches!(self, Error::Sink(_))
    }

    /// Get the SQLSTATE code if this is a server error.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Server(fields) => fields.code.as_deref(),
            _ => None,
        }
    }
}
