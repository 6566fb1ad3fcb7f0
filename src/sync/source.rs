//! Blocking message sources.

use std::io::{BufReader, Read, Write};

use crate::error::{Error, Result};
use crate::message::{BackendMessage, skip_async_message};
use crate::protocol::backend::{MAX_MESSAGE_LEN, RawMessage};

/// An already-connected channel to the server.
///
/// Receiving blocks until the next message arrives. Closing the underlying
/// connection must make the next `receive` fail with [`Error::Transport`].
pub trait MessageSource {
    /// Send an encoded frontend message and flush it.
    fn send(&mut self, packet: &[u8]) -> Result<()>;

    /// Receive the next decoded message.
    fn receive(&mut self) -> Result<BackendMessage>;
}

impl<T: MessageSource + ?Sized> MessageSource for &mut T {
    fn send(&mut self, packet: &[u8]) -> Result<()> {
        (**self).send(packet)
    }

    fn receive(&mut self) -> Result<BackendMessage> {
        (**self).receive()
    }
}

/// Message source over a connected, authenticated byte stream.
///
/// Frames are read as type byte, 4-byte length (including itself) and payload.
/// Asynchronous messages are logged and skipped.
pub struct FramedSource<S: Read + Write> {
    stream: BufReader<S>,
    read_buffer: Vec<u8>,
}

impl<S: Read + Write> FramedSource<S> {
    /// Wrap a stream positioned at a message boundary.
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            read_buffer: Vec::with_capacity(8192),
        }
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.stream.get_ref()
    }

    /// Unwrap the underlying stream. Buffered unread bytes are lost.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }

    /// Read one frame into the read buffer, returning its type byte.
    fn read_frame(&mut self) -> Result<u8> {
        let mut header = [0u8; 5];
        self.stream.read_exact(&mut header)?;
        let [type_byte, length @ ..] = header;
        let length = u32::from_be_bytes(length);

        if !(4..=MAX_MESSAGE_LEN).contains(&length) {
            return Err(Error::Protocol(format!(
                "Invalid message length: {}",
                length
            )));
        }

        let payload_len = (length - 4) as usize;
        self.read_buffer.clear();
        self.read_buffer.resize(payload_len, 0);
        self.stream.read_exact(&mut self.read_buffer)?;
        Ok(type_byte)
    }
}

impl<S: Read + Write> MessageSource for FramedSource<S> {
    fn send(&mut self, packet: &[u8]) -> Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(packet)?;
        stream.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<BackendMessage> {
        loop {
            let type_byte = self.read_frame()?;
            let raw = RawMessage::new(type_byte, &self.read_buffer);
            if !skip_async_message(raw)? {
                return BackendMessage::decode(raw);
            }
        }
    }
}
