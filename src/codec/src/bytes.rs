//! Null-terminated byte sequences.
//!
//! Body bytes are shifted up by one so the terminator value never occurs
//! inside the body; the two bytes that would overflow (0xFE, 0xFF) become
//! two-byte escapes led by a continuator byte that still compares above
//! every shifted byte. With the terminator appended, an encoding compares
//! strictly below any encoding it is a prefix of, so these keys stay
//! correctly ordered inside larger composite keys.
//!
//! Ascending wire format per input byte, terminator 0x00:
//! - 0x00..=0xFD  ->  byte + 1
//! - 0xFE, 0xFF   ->  0xFF, byte + 3 (mod 256)
//!
//! Descending is the same stream with every byte inverted, giving
//! terminator 0xFF and continuator 0x00.
//!
//! There is no spare byte for a NULL sentinel (0x00 is the terminator and
//! every non-null encoding starts at 0x01 or above), so NULL encodes as
//! the empty byte string: it sorts below everything and round-trips
//! standalone or in final-field position, where decoding at end of input
//! yields NULL.

use crate::cursor::Cursor;
use crate::error::CodecError;
use crate::{Codec, Order};

const TERMINATOR: u8 = 0x00;
const CONTINUATOR: u8 = 0xFF;

/// Escaped, terminated byte sequence codec over `Option<Vec<u8>>`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BytesCodec {
    order: Order,
    must_terminate: bool,
}

impl BytesCodec {
    pub const fn new(order: Order) -> Self {
        BytesCodec {
            order,
            must_terminate: true,
        }
    }

    pub fn must_terminate(&self) -> bool {
        self.must_terminate
    }

    /// Allows the terminator to be omitted for a final ascending field;
    /// decoding then treats end of input as the terminator. Descending
    /// keys must always terminate (a prefix would sort on the wrong side
    /// of its extensions).
    pub fn set_must_terminate(&mut self, must_terminate: bool) -> Result<(), CodecError> {
        if !must_terminate && self.order.is_descending() {
            return Err(CodecError::InvalidConfiguration(
                "descending byte keys must terminate",
            ));
        }
        self.must_terminate = must_terminate;
        Ok(())
    }

    fn writes_terminator(&self, body: &[u8]) -> bool {
        // An implicit empty encoding would collide with NULL
        self.must_terminate || body.is_empty()
    }

    /// Borrowing equivalent of [`Codec::serialized_length`]
    pub fn slice_length(&self, value: Option<&[u8]>) -> usize {
        match value {
            None => 0,
            Some(body) => {
                let escapes = body.iter().filter(|b| **b >= 0xFE).count();
                body.len() + escapes + if self.writes_terminator(body) { 1 } else { 0 }
            }
        }
    }

    /// Borrowing equivalent of [`Codec::serialize`]
    pub fn serialize_slice(
        &self,
        value: Option<&[u8]>,
        buffer: &mut Vec<u8>,
    ) -> Result<(), CodecError> {
        let body = match value {
            None => return Ok(()),
            Some(body) => body,
        };
        let mask = self.order.mask();
        for &byte in body {
            if byte < 0xFE {
                buffer.push((byte + 1) ^ mask);
            } else {
                buffer.push(CONTINUATOR ^ mask);
                buffer.push(byte.wrapping_add(3) ^ mask);
            }
        }
        if self.writes_terminator(body) {
            buffer.push(TERMINATOR ^ mask);
        }
        Ok(())
    }
}

impl Codec for BytesCodec {
    type Value = Option<Vec<u8>>;

    fn order(&self) -> Order {
        self.order
    }

    fn set_order(&mut self, order: Order) {
        self.order = order;
        if order.is_descending() {
            self.must_terminate = true;
        }
    }

    fn serialized_length(&self, value: &Option<Vec<u8>>) -> usize {
        self.slice_length(value.as_ref().map(|b| b.as_slice()))
    }

    fn serialize(&self, value: &Option<Vec<u8>>, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        self.serialize_slice(value.as_ref().map(|b| b.as_slice()), buffer)
    }

    fn skip(&self, cursor: &mut Cursor<'_>) -> Result<usize, CodecError> {
        let mask = self.order.mask();
        let start = cursor.position();
        loop {
            if cursor.is_empty() {
                if self.must_terminate && cursor.position() != start {
                    return Err(CodecError::Truncated);
                }
                break;
            }
            match cursor.next_byte()? ^ mask {
                TERMINATOR => break,
                CONTINUATOR => {
                    cursor.advance(1)?;
                }
                _ => {}
            }
        }
        Ok(cursor.position() - start)
    }

    fn deserialize(&self, cursor: &mut Cursor<'_>) -> Result<Option<Vec<u8>>, CodecError> {
        if cursor.is_empty() {
            return Ok(None);
        }
        let mask = self.order.mask();
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
                CONTINUATOR => {
                    let escaped = (cursor.next_byte()? ^ mask).wrapping_sub(3);
                    if escaped < 0xFE {
                        return Err(CodecError::Corrupt("invalid byte escape"));
                    }
                    body.push(escaped);
                }
                shifted => body.push(shifted - 1),
            }
        }
        Ok(Some(body))
    }
}
