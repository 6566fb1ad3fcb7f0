//! Action types for state machine I/O requests.

/// Action requested by a state machine.
///
/// The caller should perform the requested I/O and then feed the next
/// message to the state machine's `step()` method.
#[derive(Debug)]
pub enum Action<'a> {
    /// Write the packet to the server and flush, then read a message.
    WritePacket(&'a [u8]),

    /// Read the next message from the server.
    ReadMessage,

    /// Write these backup bytes to the output sink, then read a message.
    ///
    /// The bytes are a single CopyData payload, unmodified.
    WriteOutput(&'a [u8]),

    /// The state machine has finished successfully.
    Finished,
}
