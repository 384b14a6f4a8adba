//! IEEE-754 floats with total ordering.
//!
//! The bit pattern is transformed so unsigned byte comparison matches the
//! IEEE total order: the sign bit is flipped, and negative values have
//! every bit flipped, giving
//! -inf < -MAX < .. < -0.0 < +0.0 < .. < +inf < NaN.
//! All NaN payloads collapse to the canonical quiet NaN before encoding.
//! Transformed non-negative words are biased by one so the all-zero word
//! never occurs and can serve as the NULL sentinel; negative words can
//! never be all-zero (that would require the eliminated all-ones NaN
//! payload).

use crate::cursor::Cursor;
use crate::error::CodecError;
use crate::{Codec, Order};
use std::convert::TryInto;

/// 64 bit float codec over `Option<f64>`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Float64Codec {
    order: Order,
}

impl Float64Codec {
    pub const fn new(order: Order) -> Self {
        Float64Codec { order }
    }
}

impl Codec for Float64Codec {
    type Value = Option<f64>;

    fn order(&self) -> Order {
        self.order
    }

    fn set_order(&mut self, order: Order) {
        self.order = order;
    }

    fn serialized_length(&self, _value: &Option<f64>) -> usize {
        8
    }

    fn serialize(&self, value: &Option<f64>, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        const SIGN: u64 = 1 << 63;
        let word = match value {
            None => 0,
            Some(v) => {
                let bits = if v.is_nan() {
                    f64::NAN.to_bits()
                } else {
                    v.to_bits()
                };
                let flip = ((bits as i64) >> 63) as u64 | SIGN;
                if bits & SIGN == 0 {
                    (bits ^ flip) + 1
                } else {
                    bits ^ flip
                }
            }
        };
        let mask = self.order.mask();
        for byte in &word.to_be_bytes() {
            buffer.push(byte ^ mask);
        }
        Ok(())
    }

    fn skip(&self, cursor: &mut Cursor<'_>) -> Result<usize, CodecError> {
        cursor.advance(8)?;
        Ok(8)
    }

    fn deserialize(&self, cursor: &mut Cursor<'_>) -> Result<Option<f64>, CodecError> {
        const SIGN: u64 = 1 << 63;
        let raw: [u8; 8] = cursor.take(8)?.try_into().unwrap();
        let mut word = u64::from_be_bytes(raw);
        if self.order.is_descending() {
            word = !word;
        }
        if word == 0 {
            return Ok(None);
        }
        let bits = if word & SIGN != 0 {
            (word - 1) ^ SIGN
        } else {
            !word
        };
        Ok(Some(f64::from_bits(bits)))
    }
}

/// 32 bit float codec over `Option<f32>`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Float32Codec {
    order: Order,
}

impl Float32Codec {
    pub const fn new(order: Order) -> Self {
        Float32Codec { order }
    }
}

impl Codec for Float32Codec {
    type Value = Option<f32>;

    fn order(&self) -> Order {
        self.order
    }

    fn set_order(&mut self, order: Order) {
        self.order = order;
    }

    fn serialized_length(&self, _value: &Option<f32>) -> usize {
        4
    }

    fn serialize(&self, value: &Option<f32>, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        const SIGN: u32 = 1 << 31;
        let word = match value {
            None => 0,
            Some(v) => {
                let bits = if v.is_nan() {
                    f32::NAN.to_bits()
                } else {
                    v.to_bits()
                };
                let flip = ((bits as i32) >> 31) as u32 | SIGN;
                if bits & SIGN == 0 {
                    (bits ^ flip) + 1
                } else {
                    bits ^ flip
                }
            }
        };
        let mask = self.order.mask();
        for byte in &word.to_be_bytes() {
            buffer.push(byte ^ mask);
        }
        Ok(())
    }

    fn skip(&self, cursor: &mut Cursor<'_>) -> Result<usize, CodecError> {
        cursor.advance(4)?;
        Ok(4)
    }

    fn deserialize(&self, cursor: &mut Cursor<'_>) -> Result<Option<f32>, CodecError> {
        const SIGN: u32 = 1 << 31;
        let raw: [u8; 4] = cursor.take(4)?.try_into().unwrap();
        let mut word = u32::from_be_bytes(raw);
        if self.order.is_descending() {
            word = !word;
        }
        if word == 0 {
            return Ok(None);
        }
        let bits = if word & SIGN != 0 {
            (word - 1) ^ SIGN
        } else {
            !word
        };
        Ok(Some(f32::from_bits(bits)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let codec = Float32Codec::new(Order::Ascending);
        assert_eq!(
            codec.encode_to_vec(&Some(0.0)).unwrap(),
            vec![0x80, 0x00, 0x00, 0x01]
        );
        assert_eq!(
            codec.encode_to_vec(&Some(-0.0)).unwrap(),
            vec![0x7F, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(
            codec.encode_to_vec(&Some(f32::INFINITY)).unwrap(),
            vec![0xFF, 0x80, 0x00, 0x01]
        );
        assert_eq!(
            codec.encode_to_vec(&None).unwrap(),
            vec![0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_all_nans_collapse() {
        let codec = Float64Codec::new(Order::Ascending);
        let canonical = codec.encode_to_vec(&Some(f64::NAN)).unwrap();
        for bits in &[
            0x7FF0_0000_0000_0001_u64,
            0x7FF8_0000_0000_0001,
            0xFFF8_0000_0000_0000,
            0xFFFF_FFFF_FFFF_FFFF,
        ] {
            let payload = f64::from_bits(*bits);
            assert!(payload.is_nan());
            assert_eq!(codec.encode_to_vec(&Some(payload)).unwrap(), canonical);
        }
        // NaN sorts above everything else
        assert!(canonical > codec.encode_to_vec(&Some(f64::INFINITY)).unwrap());
    }

    #[test]
    fn test_sort_order_and_round_trip() {
        let numbers: Vec<Option<f64>> = vec![
            None,
            Some(f64::NEG_INFINITY),
            Some(f64::MIN),
            Some(-1.5),
            Some(-f64::MIN_POSITIVE),
            Some(-0.0),
            Some(0.0),
            Some(f64::MIN_POSITIVE),
            Some(1.5),
            Some(f64::MAX),
            Some(f64::INFINITY),
            Some(f64::NAN),
        ];
        let asc = Float64Codec::new(Order::Ascending);
        let desc = Float64Codec::new(Order::Descending);
        let mut asc_byte_arrays = vec![];
        let mut desc_byte_arrays = vec![];
        for f in &numbers {
            asc_byte_arrays.push(asc.encode_to_vec(f).unwrap());
            desc_byte_arrays.push(desc.encode_to_vec(f).unwrap());
        }
        asc_byte_arrays.sort();
        desc_byte_arrays.sort();
        desc_byte_arrays.reverse();

        for ((expected, asc_buf), desc_buf) in
            numbers.iter().zip(asc_byte_arrays).zip(desc_byte_arrays)
        {
            for (codec, buf) in &[(asc, asc_buf), (desc, desc_buf)] {
                let mut cursor = Cursor::new(buf);
                let decoded = codec.deserialize(&mut cursor).unwrap();
                assert!(cursor.is_empty());
                match (expected, decoded) {
                    (Some(e), Some(d)) if e.is_nan() => assert!(d.is_nan()),
                    // -0.0 == 0.0 under PartialEq, compare bits instead
                    (Some(e), Some(d)) => assert_eq!(e.to_bits(), d.to_bits()),
                    (None, None) => {}
                    other => panic!("mismatched decode: {:?}", other),
                }
            }
        }
    }

    #[test]
    fn test_subnormals_round_trip() {
        let codec = Float32Codec::new(Order::Descending);
        for value in &[
            Some(f32::from_bits(1)),
            Some(-f32::from_bits(1)),
            Some(f32::MIN_POSITIVE / 2.0),
            None,
        ] {
            let encoded = codec.encode_to_vec(value).unwrap();
            assert_eq!(encoded.len(), 4);
            let mut cursor = Cursor::new(&encoded);
            let decoded = codec.deserialize(&mut cursor).unwrap();
            assert_eq!(
                value.map(f32::to_bits),
                decoded.map(f32::to_bits)
            );
        }
    }

    #[test]
    fn test_truncated() {
        let codec = Float64Codec::new(Order::Ascending);
        let mut cursor = Cursor::new(&[0x80, 0x00, 0x00]);
        assert_eq!(codec.deserialize(&mut cursor), Err(CodecError::Truncated));
    }
}
