//! Decoded backend messages handed to the backup state machine.
//!
//! These are owned counterparts of the zero-copy parsers in
//! [`crate::protocol::backend`], limited to the kinds that may appear in a
//! BASE_BACKUP exchange.

use crate::error::{Error, ErrorFields, Result};
use crate::protocol::backend::{
    CommandComplete, CopyData, CopyDone, CopyOutResponse, DataRow, ErrorResponse,
    NoticeResponse, NotificationResponse, ParameterStatus, RawMessage, RowDescription, msg_type,
};
use crate::protocol::types::FormatCode;

/// One column of a RowDescription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Column name
    pub name: String,
    /// Wire format of the column values
    pub format: FormatCode,
}

impl FieldInfo {
    /// A text-format column with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: FormatCode::Text,
        }
    }
}

/// A decoded server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMessage {
    /// Column layout of the result set that follows
    RowDescription {
        /// Columns in wire order
        fields: Vec<FieldInfo>,
    },
    /// One row; `None` is SQL NULL
    DataRow {
        /// Column values in field order
        values: Vec<Option<Vec<u8>>>,
    },
    /// End of a result set
    CommandComplete {
        /// Command tag
        tag: String,
    },
    /// Server-reported error
    ErrorResponse(ErrorFields),
    /// Start of the COPY stream
    CopyOutResponse(CopyOutResponse),
    /// One chunk of the COPY stream
    CopyData(Vec<u8>),
    /// End of the COPY stream
    CopyDone,
}

impl BackendMessage {
    /// Decode a framed message.
    ///
    /// Asynchronous messages (notices, parameter status, notifications) are the
    /// message source's concern and are rejected here like any other kind that
    /// has no place in a BASE_BACKUP exchange.
    pub fn decode(raw: RawMessage<'_>) -> Result<Self> {
        let payload = raw.payload;
        match raw.type_byte {
            msg_type::ROW_DESCRIPTION => {
                let desc = RowDescription::parse(payload)?;
                let fields = desc
                    .iter()
                    .map(|field| FieldInfo {
                        name: field.name.to_string(),
                        format: field.format(),
                    })
                    .collect();
                Ok(Self::RowDescription { fields })
            }
            msg_type::DATA_ROW => {
                let values = DataRow::parse(payload)?
                    .values()?
                    .into_iter()
                    .map(|value| value.map(<[u8]>::to_vec))
                    .collect();
                Ok(Self::DataRow { values })
            }
            msg_type::COMMAND_COMPLETE => Ok(Self::CommandComplete {
                tag: CommandComplete::parse(payload)?.tag.to_string(),
            }),
            msg_type::ERROR_RESPONSE => Ok(Self::ErrorResponse(ErrorResponse::parse(payload)?.fields)),
            msg_type::COPY_OUT_RESPONSE => Ok(Self::CopyOutResponse(CopyOutResponse::parse(payload)?)),
            msg_type::COPY_DATA => Ok(Self::CopyData(CopyData::parse(payload)?.data.to_vec())),
            msg_type::COPY_DONE => {
                CopyDone::parse(payload)?;
                Ok(Self::CopyDone)
            }
            other => Err(Error::Protocol(format!(
                "Unexpected message type '{}'",
                char::from(other)
            ))),
        }
    }

    /// Short name of the message kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RowDescription { .. } => "RowDescription",
            Self::DataRow { .. } => "DataRow",
            Self::CommandComplete { .. } => "CommandComplete",
            Self::ErrorResponse(_) => "ErrorResponse",
            Self::CopyOutResponse(_) => "CopyOutResponse",
            Self::CopyData(_) => "CopyData",
            Self::CopyDone => "CopyDone",
        }
    }
}

/// Log and drop an asynchronous message.
///
/// Notices, parameter status changes and notifications may arrive at any point
/// of the exchange and carry nothing the backup needs. Returns `Ok(false)` if
/// `raw` is not an asynchronous message.
pub fn skip_async_message(raw: RawMessage<'_>) -> Result<bool> {
    match raw.type_byte {
        msg_type::NOTICE_RESPONSE => {
            let notice = NoticeResponse::parse(raw.payload)?;
            tracing::warn!(
                severity = notice.severity().unwrap_or_default(),
                "server notice: {}",
                notice.fields
            );
        }
        msg_type::PARAMETER_STATUS => {
            let param = ParameterStatus::parse(raw.payload)?;
            tracing::debug!(name = param.name, value = param.value, "parameter status");
        }
        msg_type::NOTIFICATION_RESPONSE => {
            let notification = NotificationResponse::parse(raw.payload)?;
            tracing::debug!(
                pid = notification.pid,
                channel = notification.channel,
                "ignoring notification"
            );
        }
        _ => return Ok(false),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_copy_messages() {
        let data = BackendMessage::decode(RawMessage::new(b'd', &[1, 2, 3])).unwrap();
        assert_eq!(data, BackendMessage::CopyData(vec![1, 2, 3]));

        let done = BackendMessage::decode(RawMessage::new(b'c', &[])).unwrap();
        assert_eq!(done, BackendMessage::CopyDone);

        let out = BackendMessage::decode(RawMessage::new(b'H', &[0, 0, 0])).unwrap();
        assert_eq!(out.kind(), "CopyOutResponse");
    }

    #[test]
    fn decode_data_row() {
        let mut payload = 2u16.to_be_bytes().to_vec();
        payload.extend_from_slice(&(-1i32).to_be_bytes());
        payload.extend_from_slice(&1i32.to_be_bytes());
        payload.push(b'x');

        let msg = BackendMessage::decode(RawMessage::new(b'D', &payload)).unwrap();
        assert_eq!(
            msg,
            BackendMessage::DataRow {
                values: vec![None, Some(b"x".to_vec())]
            }
        );
    }

    #[test]
    fn skip_async_messages() {
        assert!(skip_async_message(RawMessage::new(b'N', b"SWARNING\0Mhello\0\0")).unwrap());
        assert!(skip_async_message(RawMessage::new(b'S', b"TimeZone\0UTC\0")).unwrap());
        let mut notification = 42u32.to_be_bytes().to_vec();
        notification.extend_from_slice(b"chan\0payload\0");
        assert!(skip_async_message(RawMessage::new(b'A', &notification)).unwrap());
        assert!(!skip_async_message(RawMessage::new(b'd', &[1])).unwrap());
        assert!(skip_async_message(RawMessage::new(b'S', b"broken")).is_err());
    }

    #[test]
    fn decode_rejects_unknown_and_async_kinds() {
        for type_byte in [b'Z', b'N', b'S', b'W'] {
            let err = BackendMessage::decode(RawMessage::new(type_byte, &[])).unwrap_err();
            assert!(matches!(err, Error::Protocol(_)));
        }
    }
}
