//! PostgreSQL frontend (client → server) messages.

pub mod simple;

pub use simple::write_query;

/// Frontend message type bytes.
pub mod msg_type {
    /// Query (simple query protocol)
    pub const QUERY: u8 = b'Q';
}
