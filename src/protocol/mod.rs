//! PostgreSQL wire protocol implementation.
//!
//! This module contains the payload-level encoding and decoding used by the
//! BASE_BACKUP exchange.
//!
//! # Structure
//!
//! - `backend`: Server → Client messages (parsing)
//! - `frontend`: Client → Server messages (encoding)
//! - `codec`: Low-level encoding/decoding primitives
//! - `types`: Common protocol types (FormatCode, Oid)

pub mod backend;
pub mod codec;
pub mod frontend;
pub mod types;

pub use backend::RawMessage;
pub use types::{FormatCode, Oid};
