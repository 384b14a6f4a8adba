//! Composite row keys.
//!
//! A row codec concatenates the encodings of its fields in declaration
//! order; because every field codec is prefix-safe, the concatenation
//! sorts like the tuple of field values. Descending a whole row is pushed
//! down into the fields by flipping each one's direction, no wrapper bytes
//! are added.

use crate::bytes::BytesCodec;
use crate::cursor::Cursor;
use crate::decimal::DecimalCodec;
use crate::error::CodecError;
use crate::fixbytes::FixedBytesCodec;
use crate::fixint::{FixedIntCodec, FixedUnsignedCodec};
use crate::float::{Float32Codec, Float64Codec};
use crate::text::TextCodec;
use crate::value::Value;
use crate::varint::{
    UnsignedVarInt32Codec, UnsignedVarIntCodec, VarInt32Codec, VarIntCodec,
};
use crate::{Codec, Order};

/// One field of a row key: a concrete codec behind a common face,
/// exchanging dynamically typed [`Value`]s
#[derive(Clone, Debug, PartialEq)]
pub enum FieldCodec {
    VarInt(VarIntCodec),
    VarInt32(VarInt32Codec),
    UnsignedVarInt(UnsignedVarIntCodec),
    UnsignedVarInt32(UnsignedVarInt32Codec),
    FixedInt(FixedIntCodec),
    FixedUnsigned(FixedUnsignedCodec),
    FixedBytes(FixedBytesCodec),
    Float32(Float32Codec),
    Float64(Float64Codec),
    Decimal(DecimalCodec),
    Bytes(BytesCodec),
    Text(TextCodec),
}

fn mismatch(expected: &'static str, value: &Value) -> CodecError {
    CodecError::TypeMismatch {
        expected,
        actual: value.kind(),
    }
}

fn int_value(value: &Value) -> Result<Option<i64>, CodecError> {
    match value {
        Value::Null => Ok(None),
        Value::Int(i) => Ok(Some(*i)),
        other => Err(mismatch("integer", other)),
    }
}

fn uint_value(value: &Value) -> Result<Option<u64>, CodecError> {
    match value {
        Value::Null => Ok(None),
        Value::UInt(u) => Ok(Some(*u)),
        other => Err(mismatch("unsigned integer", other)),
    }
}

fn narrow_int_value(value: &Value) -> Result<Option<i32>, CodecError> {
    use std::convert::TryFrom;
    match int_value(value)? {
        None => Ok(None),
        Some(i) => i32::try_from(i)
            .map(Some)
            .map_err(|_| CodecError::OutOfRange("value does not fit an i32")),
    }
}

fn narrow_uint_value(value: &Value) -> Result<Option<u32>, CodecError> {
    use std::convert::TryFrom;
    match uint_value(value)? {
        None => Ok(None),
        Some(u) => u32::try_from(u)
            .map(Some)
            .map_err(|_| CodecError::OutOfRange("value does not fit a u32")),
    }
}

impl FieldCodec {
    pub fn order(&self) -> Order {
        match self {
            FieldCodec::VarInt(codec) => codec.order(),
            FieldCodec::VarInt32(codec) => codec.order(),
            FieldCodec::UnsignedVarInt(codec) => codec.order(),
            FieldCodec::UnsignedVarInt32(codec) => codec.order(),
            FieldCodec::FixedInt(codec) => codec.order(),
            FieldCodec::FixedUnsigned(codec) => codec.order(),
            FieldCodec::FixedBytes(codec) => codec.order(),
            FieldCodec::Float32(codec) => codec.order(),
            FieldCodec::Float64(codec) => codec.order(),
            FieldCodec::Decimal(codec) => codec.order(),
            FieldCodec::Bytes(codec) => codec.order(),
            FieldCodec::Text(codec) => codec.order(),
        }
    }

    pub fn set_order(&mut self, order: Order) {
        match self {
            FieldCodec::VarInt(codec) => codec.set_order(order),
            FieldCodec::VarInt32(codec) => codec.set_order(order),
            FieldCodec::UnsignedVarInt(codec) => codec.set_order(order),
            FieldCodec::UnsignedVarInt32(codec) => codec.set_order(order),
            FieldCodec::FixedInt(codec) => codec.set_order(order),
            FieldCodec::FixedUnsigned(codec) => codec.set_order(order),
            FieldCodec::FixedBytes(codec) => codec.set_order(order),
            FieldCodec::Float32(codec) => codec.set_order(order),
            FieldCodec::Float64(codec) => codec.set_order(order),
            FieldCodec::Decimal(codec) => codec.set_order(order),
            FieldCodec::Bytes(codec) => codec.set_order(order),
            FieldCodec::Text(codec) => codec.set_order(order),
        }
    }

    /// Whether this codec can lean on end-of-buffer instead of writing a
    /// terminator when it is the final ascending field of a row
    pub fn supports_implicit_termination(&self) -> bool {
        match self {
            FieldCodec::Bytes(_) | FieldCodec::Text(_) => true,
            _ => false,
        }
    }

    pub fn set_must_terminate(&mut self, must_terminate: bool) -> Result<(), CodecError> {
        match self {
            FieldCodec::Bytes(codec) => codec.set_must_terminate(must_terminate),
            FieldCodec::Text(codec) => codec.set_must_terminate(must_terminate),
            _ if must_terminate => Ok(()),
            _ => Err(CodecError::InvalidConfiguration(
                "codec is always self-delimiting",
            )),
        }
    }

    pub fn serialized_length(&self, value: &Value) -> Result<usize, CodecError> {
        match self {
            FieldCodec::VarInt(codec) => Ok(codec.serialized_length(&int_value(value)?)),
            FieldCodec::VarInt32(codec) => Ok(codec.serialized_length(&narrow_int_value(value)?)),
            FieldCodec::UnsignedVarInt(codec) => Ok(codec.serialized_length(&uint_value(value)?)),
            FieldCodec::UnsignedVarInt32(codec) => {
                Ok(codec.serialized_length(&narrow_uint_value(value)?))
            }
            FieldCodec::FixedInt(codec) => match value {
                Value::Int(i) => Ok(codec.serialized_length(i)),
                other => Err(mismatch("integer", other)),
            },
            FieldCodec::FixedUnsigned(codec) => match value {
                Value::UInt(u) => Ok(codec.serialized_length(u)),
                other => Err(mismatch("unsigned integer", other)),
            },
            FieldCodec::FixedBytes(codec) => match value {
                Value::Bytes(b) => Ok(codec.serialized_length(b)),
                other => Err(mismatch("bytes", other)),
            },
            FieldCodec::Float32(codec) => match value {
                Value::Null => Ok(codec.serialized_length(&None)),
                Value::Float32(f) => Ok(codec.serialized_length(&Some(*f))),
                other => Err(mismatch("float32", other)),
            },
            FieldCodec::Float64(codec) => match value {
                Value::Null => Ok(codec.serialized_length(&None)),
                Value::Float64(f) => Ok(codec.serialized_length(&Some(*f))),
                other => Err(mismatch("float64", other)),
            },
            FieldCodec::Decimal(codec) => match value {
                Value::Null => Ok(codec.decimal_length(None)),
                Value::Decimal(d) => Ok(codec.decimal_length(Some(d))),
                other => Err(mismatch("decimal", other)),
            },
            FieldCodec::Bytes(codec) => match value {
                Value::Null => Ok(codec.slice_length(None)),
                Value::Bytes(b) => Ok(codec.slice_length(Some(b))),
                other => Err(mismatch("bytes", other)),
            },
            FieldCodec::Text(codec) => match value {
                Value::Null => Ok(codec.str_length(None)),
                Value::Text(t) => Ok(codec.str_length(Some(t))),
                other => Err(mismatch("text", other)),
            },
        }
    }

    pub fn serialize(&self, value: &Value, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        match self {
            FieldCodec::VarInt(codec) => codec.serialize(&int_value(value)?, buffer),
            FieldCodec::VarInt32(codec) => codec.serialize(&narrow_int_value(value)?, buffer),
            FieldCodec::UnsignedVarInt(codec) => codec.serialize(&uint_value(value)?, buffer),
            FieldCodec::UnsignedVarInt32(codec) => {
                codec.serialize(&narrow_uint_value(value)?, buffer)
            }
            FieldCodec::FixedInt(codec) => match value {
                Value::Int(i) => codec.serialize(i, buffer),
                other => Err(mismatch("integer", other)),
            },
            FieldCodec::FixedUnsigned(codec) => match value {
                Value::UInt(u) => codec.serialize(u, buffer),
                other => Err(mismatch("unsigned integer", other)),
            },
            FieldCodec::FixedBytes(codec) => match value {
                Value::Bytes(b) => codec.serialize_slice(b, buffer),
                other => Err(mismatch("bytes", other)),
            },
            FieldCodec::Float32(codec) => match value {
                Value::Null => codec.serialize(&None, buffer),
                Value::Float32(f) => codec.serialize(&Some(*f), buffer),
                other => Err(mismatch("float32", other)),
            },
            FieldCodec::Float64(codec) => match value {
                Value::Null => codec.serialize(&None, buffer),
                Value::Float64(f) => codec.serialize(&Some(*f), buffer),
                other => Err(mismatch("float64", other)),
            },
            FieldCodec::Decimal(codec) => match value {
                Value::Null => codec.serialize_decimal(None, buffer),
                Value::Decimal(d) => codec.serialize_decimal(Some(d), buffer),
                other => Err(mismatch("decimal", other)),
            },
            FieldCodec::Bytes(codec) => match value {
                Value::Null => codec.serialize_slice(None, buffer),
                Value::Bytes(b) => codec.serialize_slice(Some(b), buffer),
                other => Err(mismatch("bytes", other)),
            },
            FieldCodec::Text(codec) => match value {
                Value::Null => codec.serialize_str(None, buffer),
                Value::Text(t) => codec.serialize_str(Some(t), buffer),
                other => Err(mismatch("text", other)),
            },
        }
    }

    pub fn skip(&self, cursor: &mut Cursor<'_>) -> Result<usize, CodecError> {
        match self {
            FieldCodec::VarInt(codec) => codec.skip(cursor),
            FieldCodec::VarInt32(codec) => codec.skip(cursor),
            FieldCodec::UnsignedVarInt(codec) => codec.skip(cursor),
            FieldCodec::UnsignedVarInt32(codec) => codec.skip(cursor),
            FieldCodec::FixedInt(codec) => codec.skip(cursor),
            FieldCodec::FixedUnsigned(codec) => codec.skip(cursor),
            FieldCodec::FixedBytes(codec) => codec.skip(cursor),
            FieldCodec::Float32(codec) => codec.skip(cursor),
            FieldCodec::Float64(codec) => codec.skip(cursor),
            FieldCodec::Decimal(codec) => codec.skip(cursor),
            FieldCodec::Bytes(codec) => codec.skip(cursor),
            FieldCodec::Text(codec) => codec.skip(cursor),
        }
    }

    pub fn deserialize(&self, cursor: &mut Cursor<'_>) -> Result<Value, CodecError> {
        let value = match self {
            FieldCodec::VarInt(codec) => codec.deserialize(cursor)?.map(Value::Int),
            FieldCodec::VarInt32(codec) => codec
                .deserialize(cursor)?
                .map(|i| Value::Int(i64::from(i))),
            FieldCodec::UnsignedVarInt(codec) => codec.deserialize(cursor)?.map(Value::UInt),
            FieldCodec::UnsignedVarInt32(codec) => codec
                .deserialize(cursor)?
                .map(|u| Value::UInt(u64::from(u))),
            FieldCodec::FixedInt(codec) => Some(Value::Int(codec.deserialize(cursor)?)),
            FieldCodec::FixedUnsigned(codec) => Some(Value::UInt(codec.deserialize(cursor)?)),
            FieldCodec::FixedBytes(codec) => Some(Value::Bytes(codec.deserialize(cursor)?)),
            FieldCodec::Float32(codec) => codec.deserialize(cursor)?.map(Value::Float32),
            FieldCodec::Float64(codec) => codec.deserialize(cursor)?.map(Value::Float64),
            FieldCodec::Decimal(codec) => codec.deserialize(cursor)?.map(Value::Decimal),
            FieldCodec::Bytes(codec) => codec.deserialize(cursor)?.map(Value::Bytes),
            FieldCodec::Text(codec) => codec.deserialize(cursor)?.map(Value::Text),
        };
        Ok(value.unwrap_or(Value::Null))
    }
}

/// Composite key codec over an ordered list of fields
#[derive(Clone, Debug, PartialEq)]
pub struct RowCodec {
    fields: Vec<FieldCodec>,
    order: Order,
}

impl RowCodec {
    /// Builds an ascending row over the given fields. The final field
    /// drops its terminator when its direction allows it; interior
    /// variable-length fields always terminate so decoding can find the
    /// field boundaries.
    pub fn new(fields: Vec<FieldCodec>) -> Self {
        let mut row = RowCodec {
            fields,
            order: Order::Ascending,
        };
        row.apply_termination_contract();
        row
    }

    pub fn fields(&self) -> &[FieldCodec] {
        &self.fields
    }

    pub fn order(&self) -> Order {
        self.order
    }

    /// Flips every field's direction when the row's direction changes, so
    /// the whole key inverts without any wrapper bytes
    pub fn set_order(&mut self, order: Order) {
        if order == self.order {
            return;
        }
        self.order = order;
        for field in &mut self.fields {
            let flipped = field.order().reverse();
            field.set_order(flipped);
        }
        self.apply_termination_contract();
    }

    fn apply_termination_contract(&mut self) {
        let count = self.fields.len();
        for (index, field) in self.fields.iter_mut().enumerate() {
            let implicit = index + 1 == count
                && field.order().is_ascending()
                && field.supports_implicit_termination();
            // Infallible: re-enabling termination is always legal and
            // implicit is only requested where the codec allows it
            field.set_must_terminate(!implicit).unwrap();
        }
    }

    fn check_arity(&self, actual: usize) -> Result<(), CodecError> {
        if actual != self.fields.len() {
            return Err(CodecError::ArityMismatch {
                expected: self.fields.len(),
                actual,
            });
        }
        Ok(())
    }

    pub fn serialized_length(&self, values: &[Value]) -> Result<usize, CodecError> {
        self.check_arity(values.len())?;
        let mut total = 0;
        for (field, value) in self.fields.iter().zip(values) {
            total += field.serialized_length(value)?;
        }
        Ok(total)
    }

    pub fn serialize(&self, values: &[Value], buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        self.check_arity(values.len())?;
        for (index, (field, value)) in self.fields.iter().zip(values).enumerate() {
            // A null byte sequence encodes as zero bytes, which only an
            // end-of-key decoder can recognize
            if value.is_null() && index + 1 != self.fields.len() {
                if let FieldCodec::Bytes(_) = field {
                    return Err(CodecError::InvalidConfiguration(
                        "null byte sequences are only encodable in the final field",
                    ));
                }
            }
            field.serialize(value, buffer)?;
        }
        Ok(())
    }

    pub fn encode_to_vec(&self, values: &[Value]) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Vec::with_capacity(self.serialized_length(values)?);
        self.serialize(values, &mut buffer)?;
        Ok(buffer)
    }

    pub fn skip(&self, cursor: &mut Cursor<'_>) -> Result<usize, CodecError> {
        let mut total = 0;
        for field in &self.fields {
            total += field.skip(cursor)?;
        }
        Ok(total)
    }

    pub fn deserialize(&self, cursor: &mut Cursor<'_>) -> Result<Vec<Value>, CodecError> {
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            values.push(field.deserialize(cursor)?);
        }
        Ok(values)
    }
}
