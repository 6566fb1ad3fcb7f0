//! Error and notice response messages.

use crate::error::{ErrorFields, Result};
use crate::protocol::codec::{read_cstr, read_u8};

/// Error field type codes from PostgreSQL protocol.
pub mod field_type {
    /// Severity (localized)
    pub const SEVERITY: u8 = b'S';
    /// Severity (non-localized, PostgreSQL 9.6+)
    pub const SEVERITY_NON_LOCALIZED: u8 = b'V';
    /// SQLSTATE code
    pub const CODE: u8 = b'C';
    /// Message
    pub const MESSAGE: u8 = b'M';
    /// Detail
    pub const DETAIL: u8 = b'D';
    /// Hint
    pub const HINT: u8 = b'H';
    /// Where (context)
    pub const WHERE: u8 = b'W';
    /// File name
    pub const FILE: u8 = b'F';
    /// Line number
    pub const LINE: u8 = b'L';
    /// Routine name
    pub const ROUTINE: u8 = b'R';
}

/// Parse error/notice fields from payload.
fn parse_fields(payload: &[u8]) -> Result<ErrorFields> {
    let mut fields = ErrorFields::default();
    let mut data = payload;

    loop {
        let (field_type, rest) = read_u8(data)?;
        if field_type == 0 {
            break;
        }

        let (value, rest) = read_cstr(rest)?;
        data = rest;

        let value = value.to_string();
        match field_type {
            field_type::SEVERITY => fields.severity = Some(value),
            field_type::SEVERITY_NON_LOCALIZED => fields.severity_non_localized = Some(value),
            field_type::CODE => fields.code = Some(value),
            field_type::MESSAGE => fields.message = Some(value),
            field_type::DETAIL => fields.detail = Some(value),
            field_type::HINT => fields.hint = Some(value),
            field_type::WHERE => fields.where_ = Some(value),
            field_type::FILE => fields.file = Some(value),
            field_type::LINE => fields.line = value.parse().ok(),
            field_type::ROUTINE => fields.routine = Some(value),
            other => fields.other.push((other, value)),
        }
    }

    Ok(fields)
}

/// ErrorResponse message - error reported by the server.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    /// Parsed error fields
    pub fields: ErrorFields,
}

impl ErrorResponse {
    /// Parse an ErrorResponse message from payload bytes.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        Ok(Self {
            fields: parse_fields(payload)?,
        })
    }
}

/// NoticeResponse message - non-fatal warning/info from server.
#[derive(Debug, Clone)]
pub struct NoticeResponse {
    /// Parsed notice fields
    pub fields: ErrorFields,
}

impl NoticeResponse {
    /// Parse a NoticeResponse message from payload bytes.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        Ok(Self {
            fields: parse_fields(payload)?,
        })
    }

    /// Get the severity.
    pub fn severity(&self) -> Option<&str> {
        self.fields
            .severity_non_localized
            .as_deref()
            .or(self.fields.severity.as_deref())
    }
}
