//! Asynchronous status messages the server may send at any point.

use crate::error::Result;
use crate::protocol::codec::{read_cstr, read_u32};

/// ParameterStatus message - a run-time parameter changed.
#[derive(Debug, Clone, Copy)]
pub struct ParameterStatus<'a> {
    /// Parameter name
    pub name: &'a str,
    /// New value
    pub value: &'a str,
}

impl<'a> ParameterStatus<'a> {
    /// Parse a ParameterStatus message from payload bytes.
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        let (name, rest) = read_cstr(payload)?;
        let (value, _) = read_cstr(rest)?;
        Ok(Self { name, value })
    }
}

/// NotificationResponse message - LISTEN/NOTIFY delivery.
#[derive(Debug, Clone, Copy)]
pub struct NotificationResponse<'a> {
    /// PID of the notifying backend process
    pub pid: u32,
    /// Channel name
    pub channel: &'a str,
    /// Notification payload
    pub payload: &'a str,
}

impl<'a> NotificationResponse<'a> {
    /// Parse a NotificationResponse message from payload bytes.
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        let (pid, rest) = read_u32(payload)?;
        let (channel, rest) = read_cstr(rest)?;
        let (payload, _) = read_cstr(rest)?;
        Ok(Self {
            pid,
            channel,
            payload,
        })
    }
}
