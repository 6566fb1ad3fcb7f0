//! Scripted servers shared by the integration tests.

use std::collections::VecDeque;

use pg_basebackup::protocol::backend::CopyOutResponse;
use pg_basebackup::protocol::types::FormatCode;
use pg_basebackup::{BackendMessage, Error, ErrorFields, FieldInfo, Result};

pub fn description(names: &[&str]) -> BackendMessage {
    BackendMessage::RowDescription {
        fields: names.iter().map(|name| FieldInfo::new(*name)).collect(),
    }
}

pub fn row(values: &[Option<&[u8]>]) -> BackendMessage {
    BackendMessage::DataRow {
        values: values.iter().map(|v| v.map(<[u8]>::to_vec)).collect(),
    }
}

pub fn val(bytes: &[u8]) -> Option<&[u8]> {
    Some(bytes)
}

pub fn complete() -> BackendMessage {
    BackendMessage::CommandComplete {
        tag: "SELECT".into(),
    }
}

pub fn copy_out() -> BackendMessage {
    BackendMessage::CopyOutResponse(CopyOutResponse {
        format: FormatCode::Binary,
        column_formats: Vec::new(),
    })
}

pub fn server_error(code: &str, message: &str) -> BackendMessage {
    BackendMessage::ErrorResponse(ErrorFields {
        severity: Some("ERROR".into()),
        code: Some(code.into()),
        message: Some(message.into()),
        ..Default::default()
    })
}

/// Start position and timeline result set.
pub fn start_position(lsn: &str, timeline: u8) -> Vec<BackendMessage> {
    vec![
        description(&["recptr", "tli"]),
        row(&[val(lsn.as_bytes()), val(&[timeline])]),
        complete(),
    ]
}

/// Tablespace result set with only the main data directory.
pub fn main_tablespace() -> Vec<BackendMessage> {
    vec![
        description(&["spcoid", "spclocation", "size"]),
        row(&[None, val(b""), None]),
        complete(),
    ]
}

/// A full exchange streaming `chunks`.
pub fn exchange(chunks: &[&[u8]]) -> Vec<BackendMessage> {
    let mut msgs = start_position("0/3000028", 1);
    msgs.extend(main_tablespace());
    msgs.push(copy_out());
    msgs.extend(chunks.iter().map(|chunk| BackendMessage::CopyData(chunk.to_vec())));
    msgs.push(BackendMessage::CopyDone);
    msgs
}

/// Message source replaying a fixed script.
///
/// Running past the end of the script behaves like a closed connection.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    pub messages: VecDeque<BackendMessage>,
    pub sent: Vec<Vec<u8>>,
    pub received: usize,
}

impl ScriptedSource {
    pub fn new(messages: Vec<BackendMessage>) -> Self {
        Self {
            messages: messages.into(),
            ..Default::default()
        }
    }

    fn send_packet(&mut self, packet: &[u8]) -> Result<()> {
        self.sent.push(packet.to_vec());
        Ok(())
    }

    fn next_message(&mut self) -> Result<BackendMessage> {
        if self.sent.is_empty() {
            return Err(Error::Protocol("receive before send".into()));
        }
        let msg = self.messages.pop_front().ok_or_else(|| {
            Error::Transport(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed",
            ))
        })?;
        self.received += 1;
        Ok(msg)
    }
}

impl pg_basebackup::sync::MessageSource for ScriptedSource {
    fn send(&mut self, packet: &[u8]) -> Result<()> {
        self.send_packet(packet)
    }

    fn receive(&mut self) -> Result<BackendMessage> {
        self.next_message()
    }
}

impl pg_basebackup::tokio::AsyncMessageSource for ScriptedSource {
    async fn send(&mut self, packet: &[u8]) -> Result<()> {
        self.send_packet(packet)
    }

    async fn receive(&mut self) -> Result<BackendMessage> {
        self.next_message()
    }
}

/// Encode one backend frame.
pub fn frame(type_byte: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![type_byte];
    out.extend_from_slice(&(payload.len() as u32 + 4).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

fn cstr(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

pub fn row_description_frame(names: &[(&str, u16)]) -> Vec<u8> {
    let mut payload = (names.len() as u16).to_be_bytes().to_vec();
    for (name, format) in names {
        cstr(&mut payload, name);
        payload.extend_from_slice(&0u32.to_be_bytes()); // table oid
        payload.extend_from_slice(&0i16.to_be_bytes()); // column id
        payload.extend_from_slice(&25u32.to_be_bytes()); // type oid
        payload.extend_from_slice(&(-1i16).to_be_bytes()); // type size
        payload.extend_from_slice(&(-1i32).to_be_bytes()); // type modifier
        payload.extend_from_slice(&format.to_be_bytes());
    }
    frame(b'T', &payload)
}

pub fn data_row_frame(values: &[Option<&[u8]>]) -> Vec<u8> {
    let mut payload = (values.len() as u16).to_be_bytes().to_vec();
    for value in values {
        match value {
            Some(bytes) => {
                payload.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
                payload.extend_from_slice(bytes);
            }
            None => payload.extend_from_slice(&(-1i32).to_be_bytes()),
        }
    }
    frame(b'D', &payload)
}

pub fn command_complete_frame(tag: &str) -> Vec<u8> {
    let mut payload = Vec::new();
    cstr(&mut payload, tag);
    frame(b'C', &payload)
}

pub fn notice_frame(message: &str) -> Vec<u8> {
    let mut payload = Vec::new();
    cstr(&mut payload, "SNOTICE");
    cstr(&mut payload, &format!("M{message}"));
    payload.push(0);
    frame(b'N', &payload)
}

pub fn error_frame(code: &str, message: &str) -> Vec<u8> {
    let mut payload = Vec::new();
    cstr(&mut payload, "SERROR");
    cstr(&mut payload, &format!("C{code}"));
    cstr(&mut payload, &format!("M{message}"));
    payload.push(0);
    frame(b'E', &payload)
}

/// Wire bytes of a full exchange streaming `chunks`, with a notice and a
/// parameter status mixed in.
pub fn wire_exchange(chunks: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(row_description_frame(&[("recptr", 0), ("tli", 0)]));
    out.extend(data_row_frame(&[val(b"0/3000028"), val(&[1])]));
    out.extend(command_complete_frame("SELECT"));
    out.extend(notice_frame("checkpoint complete"));
    out.extend(row_description_frame(&[
        ("spcoid", 1),
        ("spclocation", 0),
        ("size", 1),
    ]));
    out.extend(data_row_frame(&[val(&[0, 0, 0x40, 0]), val(b"/srv/ts"), val(&[3])]));
    out.extend(data_row_frame(&[None, None, None]));
    out.extend(command_complete_frame("SELECT"));
    out.extend(frame(b'S', b"application_name\0backup\0"));
    out.extend(frame(b'H', &[1, 0, 0]));
    for chunk in chunks {
        out.extend(frame(b'd', chunk));
    }
    out.extend(frame(b'c', &[]));
    out
}
