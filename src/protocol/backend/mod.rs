//! PostgreSQL backend (server → client) messages.

pub mod copy;
pub mod error;
pub mod query;
pub mod status;

pub use copy::{CopyData, CopyDone, CopyOutResponse};
pub use error::{ErrorResponse, NoticeResponse};
pub use query::{CommandComplete, DataRow, FieldDescription, RowDescription};
pub use status::{NotificationResponse, ParameterStatus};

/// Backend message type bytes.
pub mod msg_type {
    /// ParameterStatus
    pub const PARAMETER_STATUS: u8 = b'S';
    /// RowDescription
    pub const ROW_DESCRIPTION: u8 = b'T';
    /// DataRow
    pub const DATA_ROW: u8 = b'D';
    /// CommandComplete
    pub const COMMAND_COMPLETE: u8 = b'C';
    /// ErrorResponse
    pub const ERROR_RESPONSE: u8 = b'E';
    /// NoticeResponse
    pub const NOTICE_RESPONSE: u8 = b'N';
    /// NotificationResponse
    pub const NOTIFICATION_RESPONSE: u8 = b'A';
    /// CopyOutResponse
    pub const COPY_OUT_RESPONSE: u8 = b'H';
    /// CopyData
    pub const COPY_DATA: u8 = b'd';
    /// CopyDone
    pub const COPY_DONE: u8 = b'c';
}

/// Largest frame length accepted, matching the server's allocation limit
/// (1 GiB - 1).
pub const MAX_MESSAGE_LEN: u32 = 0x3FFF_FFFF;

/// Raw message from the PostgreSQL server.
///
/// This is a thin wrapper around the message type byte and payload.
/// Individual message types are parsed on demand.
#[derive(Debug, Clone, Copy)]
pub struct RawMessage<'a> {
    /// Message type byte
    pub type_byte: u8,
    /// Message payload (after length field)
    pub payload: &'a [u8],
}

impl<'a> RawMessage<'a> {
    /// Create a new RawMessage.
    pub fn new(type_byte: u8, payload: &'a [u8]) -> Self {
        Self { type_byte, payload }
    }
}
