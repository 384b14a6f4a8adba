//! Arbitrary-precision decimals.
//!
//! A decimal is canonicalized by stripping trailing zeros from its
//! significand, so numerically equal values share one encoding. The
//! canonical value `±d.dddd * 10^e` is then written as:
//!
//! - the adjusted exponent `e` as a signed varint ceding its top two
//!   header bits, which carry the value's sign class: under ascending,
//!   negatives get 00, zero 01 and positives 10, inverted for descending.
//!   The header bits alone decide comparisons across signs and against
//!   zero; zero is a single header byte with no exponent or significand.
//! - the significand digits as packed BCD, digits 0-9 stored as nibbles
//!   1-10 with a zero nibble terminating, so a significand compares
//!   strictly below any extension of itself.
//!
//! Exponent and significand bytes are XORed with the combination of the
//! order mask and the significand sign: for a negative value a larger
//! magnitude must sort earlier, which is exactly a descending encode of
//! exponent and digits.

use crate::cursor::Cursor;
use crate::error::CodecError;
use crate::varint::VarIntCodec;
use crate::{Codec, Order};
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint, Sign};
use std::convert::TryFrom;

// The adjusted exponent of any value fits 33 bits (a 32 bit scale plus a
// digit count)
const EXPONENT_LIMIT: i128 = 1 << 32;

/// Arbitrary-precision decimal codec over `Option<BigDecimal>`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecimalCodec {
    order: Order,
}

impl DecimalCodec {
    pub const fn new(order: Order) -> Self {
        DecimalCodec { order }
    }

    fn zero_header(&self) -> u8 {
        if self.order.is_descending() {
            0b10 << 6
        } else {
            0b01 << 6
        }
    }

    fn sign_header_bits(&self, negative: bool) -> u8 {
        let ascending_bits = if negative { 0b00 } else { 0b10 };
        if self.order.is_descending() {
            ascending_bits ^ 0b11
        } else {
            ascending_bits
        }
    }

    /// Sign class from the top two header bits, or `Corrupt` if the bits
    /// don't belong to a non-zero value under this codec's order
    fn read_sign(&self, header: u8) -> Result<bool, CodecError> {
        match (self.order, header >> 6) {
            (Order::Ascending, 0b00) | (Order::Descending, 0b11) => Ok(true),
            (Order::Ascending, 0b10) | (Order::Descending, 0b01) => Ok(false),
            _ => Err(CodecError::Corrupt("invalid decimal header")),
        }
    }

    /// Mask applied to the exponent and significand bytes
    fn extension_mask(&self, negative: bool) -> u8 {
        self.order.mask() ^ if negative { 0xFF } else { 0x00 }
    }

    fn exponent_codec(&self, negative: bool) -> VarIntCodec {
        let order = if self.extension_mask(negative) == 0xFF {
            Order::Descending
        } else {
            Order::Ascending
        };
        // Two reserved bits always sit within the signed limit
        VarIntCodec::with_reserved_bits(order, 2).unwrap()
    }

    /// Borrowing equivalent of [`Codec::serialized_length`]
    pub fn decimal_length(&self, value: Option<&BigDecimal>) -> usize {
        let value = match value {
            None => return 1,
            Some(v) => v,
        };
        let (sign, digits, exponent) = canonicalize(value);
        if sign == Sign::NoSign {
            return 1;
        }
        let exponent_length = self
            .exponent_codec(sign == Sign::Minus)
            .serialized_length(&Some(exponent as i64));
        exponent_length + (digits.len() + 2) / 2
    }

    /// Borrowing equivalent of [`Codec::serialize`]
    pub fn serialize_decimal(
        &self,
        value: Option<&BigDecimal>,
        buffer: &mut Vec<u8>,
    ) -> Result<(), CodecError> {
        let value = match value {
            None => {
                buffer.push(self.order.mask());
                return Ok(());
            }
            Some(v) => v,
        };
        let (sign, digits, exponent) = canonicalize(value);
        if sign == Sign::NoSign {
            buffer.push(self.zero_header());
            return Ok(());
        }
        let negative = sign == Sign::Minus;
        if exponent < -EXPONENT_LIMIT || exponent >= EXPONENT_LIMIT {
            return Err(CodecError::OutOfRange(
                "decimal adjusted exponent does not fit 33 bits",
            ));
        }

        let header_index = buffer.len();
        self.exponent_codec(negative)
            .serialize(&Some(exponent as i64), buffer)?;
        buffer[header_index] |= self.sign_header_bits(negative) << 6;

        let mask = self.extension_mask(negative);
        let digits = digits.as_bytes();
        let mut index = 0;
        while index < digits.len() {
            let high = digits[index] - b'0' + 1;
            let low = if index + 1 < digits.len() {
                digits[index + 1] - b'0' + 1
            } else {
                0
            };
            buffer.push(((high << 4) | low) ^ mask);
            index += 2;
        }
        if digits.len() % 2 == 0 {
            // Terminator nibble starts a fresh byte
            buffer.push(mask);
        }
        Ok(())
    }
}

/// Canonical form of a decimal: sign, decimal digits of the significand
/// with trailing zeros stripped, and the adjusted exponent
fn canonicalize(value: &BigDecimal) -> (Sign, String, i128) {
    let (bigint, scale) = value.clone().normalized().as_bigint_and_exponent();
    let (sign, magnitude) = bigint.into_parts();
    let digits = magnitude.to_str_radix(10);
    let exponent = digits.len() as i128 - 1 - i128::from(scale);
    (sign, digits, exponent)
}

impl Codec for DecimalCodec {
    type Value = Option<BigDecimal>;

    fn order(&self) -> Order {
        self.order
    }

    fn set_order(&mut self, order: Order) {
        self.order = order;
    }

    fn serialized_length(&self, value: &Option<BigDecimal>) -> usize {
        self.decimal_length(value.as_ref())
    }

    fn serialize(&self, value: &Option<BigDecimal>, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        self.serialize_decimal(value.as_ref(), buffer)
    }

    fn skip(&self, cursor: &mut Cursor<'_>) -> Result<usize, CodecError> {
        let first = cursor.peek()?;
        if first == self.order.mask() || first == self.zero_header() {
            cursor.advance(1)?;
            return Ok(1);
        }
        let negative = self.read_sign(first)?;
        let start = cursor.position();
        self.exponent_codec(negative).skip(cursor)?;
        let mask = self.extension_mask(negative);
        loop {
            let byte = cursor.next_byte()? ^ mask;
            if byte >> 4 == 0 || byte & 0x0F == 0 {
                break;
            }
        }
        Ok(cursor.position() - start)
    }

    fn deserialize(&self, cursor: &mut Cursor<'_>) -> Result<Option<BigDecimal>, CodecError> {
        let first = cursor.peek()?;
        if first == self.order.mask() {
            cursor.advance(1)?;
            return Ok(None);
        }
        if first == self.zero_header() {
            cursor.advance(1)?;
            return Ok(Some(BigDecimal::from(0_i64)));
        }
        let negative = self.read_sign(first)?;

        let exponent = self
            .exponent_codec(negative)
            .deserialize(cursor)?
            .ok_or(CodecError::Corrupt("missing decimal exponent"))?;
        if i128::from(exponent) < -EXPONENT_LIMIT || i128::from(exponent) >= EXPONENT_LIMIT {
            return Err(CodecError::Corrupt("decimal exponent overflow"));
        }

        let mask = self.extension_mask(negative);
        let mut digits: Vec<u8> = vec![];
        loop {
            let byte = cursor.next_byte()? ^ mask;
            let high = byte >> 4;
            let low = byte & 0x0F;
            if high == 0 {
                if low != 0 {
                    return Err(CodecError::Corrupt("nonzero decimal padding nibble"));
                }
                break;
            }
            if high > 10 {
                return Err(CodecError::Corrupt("invalid decimal digit nibble"));
            }
            digits.push(b'0' + high - 1);
            if low == 0 {
                break;
            }
            if low > 10 {
                return Err(CodecError::Corrupt("invalid decimal digit nibble"));
            }
            digits.push(b'0' + low - 1);
        }
        if digits.is_empty() {
            return Err(CodecError::Corrupt("empty decimal significand"));
        }

        let scale = digits.len() as i128 - 1 - i128::from(exponent);
        let scale = i64::try_from(scale)
            .map_err(|_| CodecError::Corrupt("decimal exponent overflow"))?;
        let magnitude = BigUint::parse_bytes(&digits, 10)
            .ok_or(CodecError::Corrupt("invalid decimal digit nibble"))?;
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Ok(Some(BigDecimal::new(
            BigInt::from_biguint(sign, magnitude),
            scale,
        )))
    }
}
