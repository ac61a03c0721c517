// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Positioned read/write cursors over in-memory Portable payloads.
//!
//! Both cursors are bounds-checked and carry the byte order agreed by the
//! surrounding protocol. Reads past the end, or seeks outside the buffer,
//! surface as `SchemaError::MalformedData` with the offending offset.

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};

/// Wire byte order for fixed-width integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

/// Generate fixed-width read methods honouring the cursor byte order.
macro_rules! impl_read {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> SchemaResult<$type> {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.read_bytes($size)?);
            Ok(match self.order {
                ByteOrder::BigEndian => <$type>::from_be_bytes(bytes),
                ByteOrder::LittleEndian => <$type>::from_le_bytes(bytes),
            })
        }
    };
}

/// Generate fixed-width write methods honouring the cursor byte order.
macro_rules! impl_write {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            match self.order {
                ByteOrder::BigEndian => self.write_bytes(&value.to_be_bytes()),
                ByteOrder::LittleEndian => self.write_bytes(&value.to_le_bytes()),
            }
        }
    };
}

/// Read cursor over a serialized payload.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
    order: ByteOrder,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8], order: ByteOrder) -> Self {
        Self {
            buffer,
            offset: 0,
            order,
        }
    }

    /// Big-endian cursor, the default wire order.
    pub fn big_endian(buffer: &'a [u8]) -> Self {
        Self::new(buffer, ByteOrder::BigEndian)
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    /// Move to an absolute position. The end of the buffer is a valid target.
    pub fn set_position(&mut self, position: usize) -> SchemaResult<()> {
        if position > self.buffer.len() {
            return Err(SchemaError::malformed(
                position,
                format!("seek beyond end of buffer ({} bytes)", self.buffer.len()),
            ));
        }
        self.offset = position;
        Ok(())
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    impl_read!(read_i16, i16, 2);
    impl_read!(read_i32, i32, 4);
    impl_read!(read_i64, i64, 8);

    pub fn read_u8(&mut self) -> SchemaResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_bool(&mut self) -> SchemaResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read an `i32` at an absolute position without moving the cursor.
    pub fn read_i32_at(&self, position: usize) -> SchemaResult<i32> {
        let mut probe = Self {
            buffer: self.buffer,
            offset: position,
            order: self.order,
        };
        probe.read_i32()
    }

    pub fn read_bytes(&mut self, len: usize) -> SchemaResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| SchemaError::malformed(self.offset, "unexpected end of buffer"))?;
        let slice = &self.buffer[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }
}

/// Growable write cursor producing payloads in the same byte order.
#[derive(Debug, Clone)]
pub struct CursorMut {
    buffer: Vec<u8>,
    order: ByteOrder,
}

impl CursorMut {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            buffer: Vec::new(),
            order,
        }
    }

    pub fn big_endian() -> Self {
        Self::new(ByteOrder::BigEndian)
    }

    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    impl_write!(write_i16, i16);
    impl_write!(write_i32, i32);
    impl_write!(write_i64, i64);

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(u8::from(value));
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Overwrite an already written `i32` (offset tables are back-patched).
    pub fn write_i32_at(&mut self, position: usize, value: i32) -> SchemaResult<()> {
        if position + 4 > self.buffer.len() {
            return Err(SchemaError::malformed(
                position,
                "back-patch outside written region",
            ));
        }
        let bytes = match self.order {
            ByteOrder::BigEndian => value.to_be_bytes(),
            ByteOrder::LittleEndian => value.to_le_bytes(),
        };
        self.buffer[position..position + 4].copy_from_slice(&bytes);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_I32: i32 = 0x1234_5678;
    const TEST_I16: i16 = 0x0102;

    #[test]
    fn test_big_endian_layout() {
        let mut writer = CursorMut::big_endian();
        writer.write_i32(TEST_I32);
        writer.write_i16(TEST_I16);
        assert_eq!(writer.as_slice(), &[0x12, 0x34, 0x56, 0x78, 0x01, 0x02]);
    }

    #[test]
    fn test_little_endian_roundtrip() {
        let mut writer = CursorMut::new(ByteOrder::LittleEndian);
        writer.write_i32(-7);
        writer.write_i64(1 << 40);
        writer.write_bool(true);
        let bytes = writer.into_inner();
        assert_eq!(&bytes[..4], &(-7i32).to_le_bytes());

        let mut reader = Cursor::new(&bytes, ByteOrder::LittleEndian);
        assert_eq!(reader.read_i32().expect("read i32"), -7);
        assert_eq!(reader.read_i64().expect("read i64"), 1 << 40);
        assert!(reader.read_bool().expect("read bool"));
        assert!(reader.is_eof());
    }

    #[test]
    fn test_read_overflow_reports_offset() {
        let buffer = [0u8; 3];
        let mut cursor = Cursor::big_endian(&buffer);
        cursor.read_u8().expect("read u8");
        match cursor.read_i32().unwrap_err() {
            SchemaError::MalformedData { offset, reason } => {
                assert_eq!(offset, 1);
                assert_eq!(reason, "unexpected end of buffer");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_read_i32_at_keeps_position() {
        let mut writer = CursorMut::big_endian();
        writer.write_i32(1);
        writer.write_i32(2);
        let bytes = writer.into_inner();
        let mut cursor = Cursor::big_endian(&bytes);
        cursor.read_u8().expect("read u8");
        assert_eq!(cursor.read_i32_at(4).expect("read at"), 2);
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_seek_bounds() {
        let buffer = [0u8; 4];
        let mut cursor = Cursor::big_endian(&buffer);
        cursor.set_position(4).expect("seek to end");
        assert_eq!(cursor.remaining(), 0);
        assert!(matches!(
            cursor.set_position(5),
            Err(SchemaError::MalformedData { offset: 5, .. })
        ));
    }

    #[test]
    fn test_back_patch() {
        let mut writer = CursorMut::big_endian();
        writer.write_i32(0);
        writer.write_u8(9);
        writer.write_i32_at(0, 42).expect("patch");
        assert_eq!(Cursor::big_endian(writer.as_slice()).read_i32().unwrap(), 42);
        assert!(writer.write_i32_at(2, 1).is_err());
    }
}
