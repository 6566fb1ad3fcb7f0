//! Async message sources for tokio.

use std::future::Future;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{Error, Result};
use crate::message::{BackendMessage, skip_async_message};
use crate::protocol::backend::{MAX_MESSAGE_LEN, RawMessage};

/// An already-connected channel to the server.
///
/// Dropping the in-flight `receive` future or closing the connection is how a
/// caller cancels a backup; the backup cannot be resumed afterwards.
pub trait AsyncMessageSource {
    /// Send an encoded frontend message and flush it.
    fn send(&mut self, packet: &[u8]) -> impl Future<Output = Result<()>>;

    /// Receive the next decoded message.
    fn receive(&mut self) -> impl Future<Output = Result<BackendMessage>>;
}

/// Message source over a connected, authenticated async byte stream.
///
/// Asynchronous messages are logged and skipped.
pub struct FramedSource<S> {
    stream: BufReader<S>,
    read_buffer: Vec<u8>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> FramedSource<S> {
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

    async fn read_frame(&mut self) -> Result<u8> {
        let type_byte = self.stream.read_u8().await?;
        let length = self.stream.read_u32().await?;

        if !(4..=MAX_MESSAGE_LEN).contains(&length) {
            return Err(Error::Protocol(format!(
                "Invalid message length: {}",
                length
            )));
        }

        let payload_len = (length - 4) as usize;
        self.read_buffer.clear();
        self.read_buffer.resize(payload_len, 0);
        self.stream.read_exact(&mut self.read_buffer).await?;
        Ok(type_byte)
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> AsyncMessageSource for FramedSource<S> {
    async fn send(&mut self, packet: &[u8]) -> Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(packet).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<BackendMessage> {
        loop {
            let type_byte = self.read_frame().await?;
            let raw = RawMessage::new(type_byte, &self.read_buffer);
            if !skip_async_message(raw)? {
                return BackendMessage::decode(raw);
            }
        }
    }
}
