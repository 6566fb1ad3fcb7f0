//! Log sequence numbers.
//!
//! The wire form is two hexadecimal segments separated by `/`, e.g. `0/3000028`.
//! The high segment holds the upper 32 bits and the low segment the lower 32 bits.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Malformed LSN text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid LSN {input:?}: {reason}")]
pub struct ParseLsnError {
    /// The text that failed to parse
    pub input: String,
    /// What was wrong with it
    pub reason: &'static str,
}

impl ParseLsnError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// A 64-bit position in the write-ahead log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Lsn(pub u64);

impl Lsn {
    /// Build an LSN from its two 32-bit segments.
    pub const fn new(high: u32, low: u32) -> Self {
        Self(((high as u64) << 32) | low as u64)
    }

    /// Parse the `high/low` hexadecimal form.
    ///
    /// Exactly one `/` is accepted. Each side must be non-empty, consist only of
    /// hex digits (either case) and fit in 32 bits.
    pub fn parse(s: &str) -> Result<Self, ParseLsnError> {
        let (high, low) = s
            .split_once('/')
            .ok_or_else(|| ParseLsnError::new(s, "missing '/' separator"))?;
        if low.contains('/') {
            return Err(ParseLsnError::new(s, "more than one '/' separator"));
        }
        Ok(Self::new(parse_segment(s, high)?, parse_segment(s, low)?))
    }

    /// Upper 32 bits.
    pub const fn high(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Lower 32 bits.
    pub const fn low(self) -> u32 {
        self.0 as u32
    }
}

fn parse_segment(input: &str, segment: &str) -> Result<u32, ParseLsnError> {
    if segment.is_empty() {
        return Err(ParseLsnError::new(input, "empty segment"));
    }
    // from_str_radix tolerates a leading '+', the wire form does not
    if !segment.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseLsnError::new(input, "segment is not hexadecimal"));
    }
    u32::from_str_radix(segment, 16)
        .map_err(|_overflow| ParseLsnError::new(input, "segment overflows 32 bits"))
}

impl FromStr for Lsn {
    type Err = ParseLsnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for Lsn {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Lsn> for u64 {
    fn from(value: Lsn) -> Self {
        value.0
    }
}

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}/{:x}", self.high(), self.low())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_start_position() {
        let lsn = Lsn::parse("0/3000028").unwrap();
        assert_eq!(lsn.high(), 0);
        assert_eq!(lsn.low(), 0x3000028);
        assert_eq!(lsn.0, 0x3000028);
        assert_eq!(lsn.to_string(), "0/3000028");
    }

    #[test]
    fn parse_combines_segments() {
        let lsn: Lsn = "16/B374D848".parse().unwrap();
        assert_eq!(lsn, Lsn::new(0x16, 0xB374_D848));
        assert_eq!(lsn.0, 0x0000_0016_B374_D848);
        // re-encoding is lowercase
        assert_eq!(lsn.to_string(), "16/b374d848");
        assert_eq!(Lsn::parse("16/b374d848").unwrap(), lsn);
    }

    #[test]
    fn parse_extremes() {
        assert_eq!(Lsn::parse("0/0").unwrap(), Lsn(0));
        assert_eq!(Lsn::parse("FFFFFFFF/FFFFFFFF").unwrap(), Lsn(u64::MAX));
        assert_eq!(Lsn::parse("00000001/0000000A").unwrap(), Lsn::new(1, 10));
    }

    #[test]
    fn parse_rejects_malformed() {
        for input in ["bad", "1/2/3", "", "/", "1/", "/1", "+1/2", "1/-2", "g/1", "1 /2"] {
            let err = Lsn::parse(input).unwrap_err();
            assert_eq!(err.input, input);
        }
    }

    #[test]
    fn parse_rejects_overflow() {
        let err = Lsn::parse("100000000/0").unwrap_err();
        assert_eq!(err.reason, "segment overflows 32 bits");
        assert!(Lsn::parse("0/100000000").is_err());
    }

    #[test]
    fn ordering_follows_numeric_value() {
        assert!(Lsn::parse("0/FFFFFFFF").unwrap() < Lsn::parse("1/0").unwrap());
    }
}
