//! Fixed-width big-endian integers.
//!
//! Signed values have their sign bit flipped before being written
//! big-endian, which shifts the two's complement range onto an unsigned
//! one: i64::MIN becomes all zeros, -1 becomes 0x7FFF.., 0 becomes
//! 0x8000... Unsigned values are written big-endian unchanged. There is no
//! NULL encoding; keys with optional integers use the varint codecs.

use crate::cursor::Cursor;
use crate::error::CodecError;
use crate::{Codec, Order};
use std::convert::{TryFrom, TryInto};

/// Storage width of a fixed integer codec
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bytes(self) -> usize {
        match self {
            IntWidth::W8 => 1,
            IntWidth::W16 => 2,
            IntWidth::W32 => 4,
            IntWidth::W64 => 8,
        }
    }
}

/// Fixed-width signed integer codec over `i64`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedIntCodec {
    order: Order,
    width: IntWidth,
}

impl FixedIntCodec {
    pub const fn new(order: Order, width: IntWidth) -> Self {
        FixedIntCodec { order, width }
    }

    pub fn width(&self) -> IntWidth {
        self.width
    }
}

impl Codec for FixedIntCodec {
    type Value = i64;

    fn order(&self) -> Order {
        self.order
    }

    fn set_order(&mut self, order: Order) {
        self.order = order;
    }

    fn serialized_length(&self, _value: &i64) -> usize {
        self.width.bytes()
    }

    fn serialize(&self, value: &i64, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        let mask = self.order.mask();
        match self.width {
            IntWidth::W8 => {
                let v = i8::try_from(*value)
                    .map_err(|_| CodecError::OutOfRange("value does not fit an i8"))?;
                buffer.push((v as u8 ^ 0x80) ^ mask);
            }
            IntWidth::W16 => {
                let v = i16::try_from(*value)
                    .map_err(|_| CodecError::OutOfRange("value does not fit an i16"))?;
                for byte in &(v as u16 ^ 0x8000).to_be_bytes() {
                    buffer.push(byte ^ mask);
                }
            }
            IntWidth::W32 => {
                let v = i32::try_from(*value)
                    .map_err(|_| CodecError::OutOfRange("value does not fit an i32"))?;
                for byte in &(v as u32 ^ 0x8000_0000).to_be_bytes() {
                    buffer.push(byte ^ mask);
                }
            }
            IntWidth::W64 => {
                for byte in &(*value as u64 ^ 0x8000_0000_0000_0000).to_be_bytes() {
                    buffer.push(byte ^ mask);
                }
            }
        }
        Ok(())
    }

    fn skip(&self, cursor: &mut Cursor<'_>) -> Result<usize, CodecError> {
        cursor.advance(self.width.bytes())?;
        Ok(self.width.bytes())
    }

    fn deserialize(&self, cursor: &mut Cursor<'_>) -> Result<i64, CodecError> {
        let mask = self.order.mask();
        let raw = cursor.take(self.width.bytes())?;
        let mut bytes = [0_u8; 8];
        for (out, byte) in bytes[8 - raw.len()..].iter_mut().zip(raw) {
            *out = byte ^ mask;
        }
        let value = match self.width {
            IntWidth::W8 => i64::from((bytes[7] ^ 0x80) as i8),
            IntWidth::W16 => {
                let v = u16::from_be_bytes(bytes[6..].try_into().unwrap()) ^ 0x8000;
                i64::from(v as i16)
            }
            IntWidth::W32 => {
                let v = u32::from_be_bytes(bytes[4..].try_into().unwrap()) ^ 0x8000_0000;
                i64::from(v as i32)
            }
            IntWidth::W64 => {
                let v = u64::from_be_bytes(bytes) ^ 0x8000_0000_0000_0000;
                v as i64
            }
        };
        Ok(value)
    }
}

/// Fixed-width unsigned integer codec over `u64`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedUnsignedCodec {
    order: Order,
    width: IntWidth,
}

impl FixedUnsignedCodec {
    pub const fn new(order: Order, width: IntWidth) -> Self {
        FixedUnsignedCodec { order, width }
    }

    pub fn width(&self) -> IntWidth {
        self.width
    }
}

impl Codec for FixedUnsignedCodec {
    type Value = u64;

    fn order(&self) -> Order {
        self.order
    }

    fn set_order(&mut self, order: Order) {
        self.order = order;
    }

    fn serialized_length(&self, _value: &u64) -> usize {
        self.width.bytes()
    }

    fn serialize(&self, value: &u64, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        let width = self.width.bytes();
        if width < 8 && *value >> (8 * width) != 0 {
            return Err(CodecError::OutOfRange(
                "value does not fit the configured width",
            ));
        }
        let mask = self.order.mask();
        for byte in &value.to_be_bytes()[8 - width..] {
            buffer.push(byte ^ mask);
        }
        Ok(())
    }

    fn skip(&self, cursor: &mut Cursor<'_>) -> Result<usize, CodecError> {
        cursor.advance(self.width.bytes())?;
        Ok(self.width.bytes())
    }

    fn deserialize(&self, cursor: &mut Cursor<'_>) -> Result<u64, CodecError> {
        let mask = self.order.mask();
        let raw = cursor.take(self.width.bytes())?;
        let mut value = 0_u64;
        for &byte in raw {
            value = (value << 8) | u64::from(byte ^ mask);
        }
        Ok(value)
    }
}
