//! PostgreSQL wire protocol encoding and decoding primitives.
//!
//! PostgreSQL uses big-endian (network byte order) for all integers.

use zerocopy::FromBytes;
use zerocopy::byteorder::big_endian::{I32 as I32BE, U16 as U16BE, U32 as U32BE};

use crate::error::{Error, Result};

/// Read 1-byte unsigned integer.
#[inline]
pub fn read_u8(data: &[u8]) -> Result<(u8, &[u8])> {
    match data.split_first() {
        Some((&value, rest)) => Ok((value, rest)),
        None => Err(Error::Protocol("read_u8: empty buffer".into())),
    }
}

/// Read 2-byte big-endian unsigned integer.
#[inline]
pub fn read_u16(data: &[u8]) -> Result<(u16, &[u8])> {
    let (value, rest) = U16BE::read_from_prefix(data).map_err(|_size| {
        Error::Protocol(format!("read_u16: buffer too short: {} < 2", data.len()))
    })?;
    Ok((value.get(), rest))
}

/// Read 4-byte big-endian signed integer.
#[inline]
pub fn read_i32(data: &[u8]) -> Result<(i32, &[u8])> {
    let (value, rest) = I32BE::read_from_prefix(data).map_err(|_size| {
        Error::Protocol(format!("read_i32: buffer too short: {} < 4", data.len()))
    })?;
    Ok((value.get(), rest))
}

/// Read 4-byte big-endian unsigned integer.
#[inline]
pub fn read_u32(data: &[u8]) -> Result<(u32, &[u8])> {
    let (value, rest) = U32BE::read_from_prefix(data).map_err(|_size| {
        Error::Protocol(format!("read_u32: buffer too short: {} < 4", data.len()))
    })?;
    Ok((value.get(), rest))
}

/// Read fixed-length bytes.
#[inline]
pub fn read_bytes(data: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    data.split_at_checked(len).ok_or_else(|| {
        Error::Protocol(format!(
            "read_bytes: buffer too short: {} < {}",
            data.len(),
            len
        ))
    })
}

/// Read null-terminated string (PostgreSQL String type).
/// Returns the string bytes (without the null terminator) and remaining data.
#[inline]
pub fn read_cstring(data: &[u8]) -> Result<(&[u8], &[u8])> {
    match memchr::memchr(0, data) {
        Some(pos) => Ok((&data[..pos], &data[pos + 1..])),
        None => Err(Error::Protocol(
            "read_cstring: no null terminator found".into(),
        )),
    }
}

/// Read null-terminated string as &str.
#[inline]
pub fn read_cstr(data: &[u8]) -> Result<(&str, &[u8])> {
    let (bytes, rest) = read_cstring(data)?;
    let s = simdutf8::basic::from_utf8(bytes)
        .map_err(|e| Error::Protocol(format!("read_cstr: invalid UTF-8: {e}")))?;
    Ok((s, rest))
}

/// Write null-terminated string (PostgreSQL String type).
#[inline]
pub fn write_cstring(out: &mut Vec<u8>, s: &[u8]) {
    out.extend_from_slice(s);
    out.push(0);
}

/// Message builder helper that handles the length field.
///
/// PostgreSQL message format:
/// - Type byte (1 byte) - NOT included in length
/// - Length (4 bytes) - includes itself
/// - Payload (Length - 4 bytes)
pub struct MessageBuilder<'a> {
    buf: &'a mut Vec<u8>,
    start: usize,
}

impl<'a> MessageBuilder<'a> {
    /// Start building a message with a type byte.
    pub fn new(buf: &'a mut Vec<u8>, type_byte: u8) -> Self {
        buf.push(type_byte);
        let start = buf.len();
        buf.extend_from_slice(&[0, 0, 0, 0]); // Placeholder for length
        Self { buf, start }
    }

    /// Write null-terminated string.
    pub fn write_cstr(&mut self, s: &str) {
        write_cstring(self.buf, s.as_bytes());
    }

    /// Finish building the message and fill in the length field.
    pub fn finish(self) {
        let len = (self.buf.len() - self.start) as u32;
        self.buf[self.start..self.start + 4].copy_from_slice(&len.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_integers_advance() {
        let data = [0x00, 0x05, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x01, 0x00, 0x2A];
        let (a, rest) = read_u16(&data).unwrap();
        let (b, rest) = read_i32(rest).unwrap();
        let (c, rest) = read_u32(rest).unwrap();
        let (d, rest) = read_u8(rest).unwrap();
        assert_eq!((a, b, c, d), (5, -1, 256, 42));
        assert!(rest.is_empty());
    }

    #[test]
    fn short_reads_are_protocol_errors() {
        assert!(matches!(read_u8(&[]), Err(Error::Protocol(_))));
        assert!(matches!(read_u16(&[1]), Err(Error::Protocol(_))));
        assert!(matches!(read_u32(&[1, 2, 3]), Err(Error::Protocol(_))));
        assert!(matches!(read_bytes(&[1, 2], 3), Err(Error::Protocol(_))));
        assert!(matches!(read_cstr(b"no terminator"), Err(Error::Protocol(_))));
    }

    #[test]
    fn cstr_splits_at_terminator() {
        let (s, rest) = read_cstr(b"spcoid\0tail").unwrap();
        assert_eq!(s, "spcoid");
        assert_eq!(rest, b"tail");
    }

    #[test]
    fn builder_fills_length() {
        let mut buf = Vec::new();
        let mut msg = MessageBuilder::new(&mut buf, b'Q');
        msg.write_cstr("x");
        msg.finish();
        assert_eq!(buf, [b'Q', 0, 0, 0, 6, b'x', 0]);
    }
}
