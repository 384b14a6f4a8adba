//! UTF-8 row keys.
//!
//! Every body byte is shifted up by two, keeping 0x00 free as the NULL
//! sentinel and 0x01 as the terminator. The shift cannot overflow because
//! UTF-8 never contains bytes above 0xF4. Descending output is the
//! ascending stream with every byte inverted. Unlike the escaped byte
//! codec this one rejects arbitrary binary input, in exchange NULL gets a
//! real one-byte encoding that sorts below the empty string.

use crate::cursor::Cursor;
use crate::error::CodecError;
use crate::{Codec, Order};

const NULL_SENTINEL: u8 = 0x00;
const TERMINATOR: u8 = 0x01;

/// UTF-8 string codec over `Option<String>`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextCodec {
    order: Order,
    must_terminate: bool,
}

impl TextCodec {
    pub const fn new(order: Order) -> Self {
        TextCodec {
            order,
            must_terminate: true,
        }
    }

    pub fn must_terminate(&self) -> bool {
        self.must_terminate
    }

    /// Allows the terminator to be omitted for a final ascending field.
    /// In that mode NULL encodes as zero bytes and an empty string still
    /// writes its terminator, keeping the two distinct. Descending keys
    /// must always terminate.
    pub fn set_must_terminate(&mut self, must_terminate: bool) -> Result<(), CodecError> {
        if !must_terminate && self.order.is_descending() {
            return Err(CodecError::InvalidConfiguration(
                "descending text keys must terminate",
            ));
        }
        self.must_terminate = must_terminate;
        Ok(())
    }

    /// Borrowing equivalent of [`Codec::serialized_length`]
    pub fn str_length(&self, value: Option<&str>) -> usize {
        match value {
            None => {
                if self.must_terminate {
                    1
                } else {
                    0
                }
            }
            Some(text) => {
                text.len() + if self.must_terminate || text.is_empty() { 1 } else { 0 }
            }
        }
    }

    /// Borrowing equivalent of [`Codec::serialize`]
    pub fn serialize_str(
        &self,
        value: Option<&str>,
        buffer: &mut Vec<u8>,
    ) -> Result<(), CodecError> {
        let mask = self.order.mask();
        let text = match value {
            None => {
                if self.must_terminate {
                    buffer.push(NULL_SENTINEL ^ mask);
                }
                return Ok(());
            }
            Some(text) => text,
        };
        for byte in text.bytes() {
            buffer.push((byte + 2) ^ mask);
        }
        if self.must_terminate || text.is_empty() {
            buffer.push(TERMINATOR ^ mask);
        }
        Ok(())
    }
}

impl Codec for TextCodec {
    type Value = Option<String>;

    fn order(&self) -> Order {
        self.order
    }

    fn set_order(&mut self, order: Order) {
        self.order = order;
        if order.is_descending() {
            self.must_terminate = true;
        }
    }

    fn serialized_length(&self, value: &Option<String>) -> usize {
        self.str_length(value.as_ref().map(|t| t.as_str()))
    }

    fn serialize(&self, value: &Option<String>, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        self.serialize_str(value.as_ref().map(|t| t.as_str()), buffer)
    }

    fn skip(&self, cursor: &mut Cursor<'_>) -> Result<usize, CodecError> {
        let mask = self.order.mask();
        let start = cursor.position();
        if cursor.is_empty() && !self.must_terminate {
            return Ok(0);
        }
        if cursor.peek()? ^ mask == NULL_SENTINEL {
            cursor.advance(1)?;
            return Ok(1);
        }
        loop {
            if cursor.is_empty() {
                if self.must_terminate {
                    return Err(CodecError::Truncated);
                }
                break;
            }
            if cursor.next_byte()? ^ mask == TERMINATOR {
                break;
            }
        }
        Ok(cursor.position() - start)
    }

    fn deserialize(&self, cursor: &mut Cursor<'_>) -> Result<Option<String>, CodecError> {
        let mask = self.order.mask();
        if cursor.is_empty() && !self.must_terminate {
            return Ok(None);
        }
        if cursor.peek()? ^ mask == NULL_SENTINEL {
            cursor.advance(1)?;
            return Ok(None);
        }
        let mut body = vec![];
        loop {
            if cursor.is_empty() {
                if self.must_terminate {
                    return Err(CodecError::Truncated);
                }
                break;
            }
            match cursor.next_byte()? ^ mask {
                TERMINATOR => break,
                NULL_SENTINEL => {
                    return Err(CodecError::Corrupt("null byte inside a text key"));
                }
                shifted => body.push(shifted - 2),
            }
        }
        String::from_utf8(body)
            .map(Some)
            .map_err(|_| CodecError::Corrupt("text key is not valid utf-8"))
    }
}
