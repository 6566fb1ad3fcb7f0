//! Simple query protocol messages.

use crate::protocol::codec::MessageBuilder;

/// Write a Query message.
///
/// Replication commands such as `BASE_BACKUP` travel over this same message.
pub fn write_query(buf: &mut Vec<u8>, query: &str) {
    let mut msg = MessageBuilder::new(buf, super::msg_type::QUERY);
    msg.write_cstr(query);
    msg.finish();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_backup_query() {
        let mut buf = Vec::new();
        write_query(&mut buf, "BASE_BACKUP");

        assert_eq!(buf[0], b'Q');

        // Length should be 4 (length field) + 12 (command + null terminator)
        let len = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
        assert_eq!(len, 16);
        assert_eq!(&buf[5..], b"BASE_BACKUP\0");
    }
}
