//! Query-related backend messages.

use std::mem::size_of;

use zerocopy::byteorder::big_endian::{I16 as I16BE, I32 as I32BE, U16 as U16BE, U32 as U32BE};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::error::{Error, Result};
use crate::protocol::codec::{read_bytes, read_cstr, read_i32, read_u16};
use crate::protocol::types::FormatCode;

/// Fixed-size tail of a field description (18 bytes).
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct FieldDescriptionTail {
    /// Table OID (0 if not a table column)
    pub table_oid: U32BE,
    /// Column attribute number (0 if not a table column)
    pub column_id: I16BE,
    /// Data type OID
    pub type_oid: U32BE,
    /// Type size (-1 for variable, -2 for null-terminated)
    pub type_size: I16BE,
    /// Type modifier (type-specific)
    pub type_modifier: I32BE,
    /// Format code (0=text, 1=binary)
    pub format: U16BE,
}

/// Field description within a RowDescription.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescription<'a> {
    /// Field name
    pub name: &'a str,
    /// Fixed-size metadata
    pub tail: &'a FieldDescriptionTail,
}

impl FieldDescription<'_> {
    /// Format code (0=text, 1=binary)
    pub fn format(&self) -> FormatCode {
        FormatCode::from_u16(self.tail.format.get())
    }
}

/// RowDescription message - describes the columns in a result set.
#[derive(Debug)]
pub struct RowDescription<'a> {
    fields: Vec<FieldDescription<'a>>,
}

impl<'a> RowDescription<'a> {
    /// Parse a RowDescription message from payload bytes.
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        const TAIL_SIZE: usize = size_of::<FieldDescriptionTail>();

        let (num_fields, mut data) = read_u16(payload)?;
        let mut fields = Vec::with_capacity(usize::from(num_fields));

        for _ in 0..num_fields {
            let (name, rest) = read_cstr(data)?;
            let (tail, rest) = read_bytes(rest, TAIL_SIZE)?;
            let tail = FieldDescriptionTail::ref_from_bytes(tail).map_err(|_cast| {
                Error::Protocol(format!("FieldDescription tail for \"{name}\""))
            })?;

            fields.push(FieldDescription { name, tail });
            data = rest;
        }

        Ok(Self { fields })
    }

    /// Iterate over field descriptions.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescription<'a>> {
        self.fields.iter()
    }
}

/// DataRow message - contains a single row of data.
#[derive(Debug, Clone, Copy)]
pub struct DataRow<'a> {
    /// Number of columns
    num_columns: u16,
    /// Column data (after the column count)
    columns_data: &'a [u8],
}

impl<'a> DataRow<'a> {
    /// Parse a DataRow message from payload bytes.
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        let (num_columns, columns_data) = read_u16(payload)?;
        Ok(Self {
            num_columns,
            columns_data,
        })
    }

    /// Decode every column value.
    ///
    /// Each item is `Option<&[u8]>` where `None` represents NULL. Unlike
    /// iterating lazily, this fails if a length prefix runs past the payload
    /// or the column count disagrees with the data.
    pub fn values(&self) -> Result<Vec<Option<&'a [u8]>>> {
        let mut values = Vec::with_capacity(usize::from(self.num_columns));
        let mut data = self.columns_data;

        for index in 0..self.num_columns {
            let (len, rest) = read_i32(data)?;
            if len == -1 {
                values.push(None);
                data = rest;
                continue;
            }
            let len = usize::try_from(len).map_err(|_negative| {
                Error::Protocol(format!("DataRow column {index}: invalid length {len}"))
            })?;
            let (value, rest) = read_bytes(rest, len)?;
            values.push(Some(value));
            data = rest;
        }

        if !data.is_empty() {
            return Err(Error::Protocol(format!(
                "DataRow: {} trailing bytes after {} columns",
                data.len(),
                self.num_columns
            )));
        }

        Ok(values)
    }
}

/// CommandComplete message - indicates successful completion of a command.
#[derive(Debug, Clone, Copy)]
pub struct CommandComplete<'a> {
    /// Command tag (e.g., "SELECT 1")
    pub tag: &'a str,
}

impl<'a> CommandComplete<'a> {
    /// Parse a CommandComplete message from payload bytes.
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        let (tag, _) = read_cstr(payload)?;
        Ok(Self { tag })
    }
}
