// Re-exported as almost every crate composing keys will also need the decimal type
pub use bigdecimal::BigDecimal;

pub mod bytes;
pub mod cursor;
pub mod decimal;
pub mod error;
pub mod fixbytes;
pub mod fixint;
pub mod float;
pub mod row;
pub mod text;
pub mod value;
pub mod varint;

pub use crate::cursor::Cursor;
pub use crate::error::CodecError;
pub use crate::row::{FieldCodec, RowCodec};
pub use crate::value::Value;

/// Sort direction of an encoded field.
///
/// Descending is implemented by inverting the bytes an ascending encoder
/// would produce, so descending keys still compare with plain unsigned
/// byte comparison.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    /// The byte every produced byte is XORed with for this direction
    pub fn mask(self) -> u8 {
        match self {
            Order::Ascending => 0x00,
            Order::Descending => 0xFF,
        }
    }

    pub fn is_ascending(self) -> bool {
        self == Order::Ascending
    }

    pub fn is_descending(self) -> bool {
        self == Order::Descending
    }

    pub fn reverse(self) -> Order {
        match self {
            Order::Ascending => Order::Descending,
            Order::Descending => Order::Ascending,
        }
    }
}

/// The capability set shared by every concrete codec.
///
/// A codec is a pure mapping between values of its domain and byte
/// sequences whose unsigned lexicographic order matches the natural order
/// of the values (reversed for descending codecs). Codecs are plain data,
/// immutable once configured, and freely shareable across threads; all
/// per-call state lives in the caller's buffer or [`Cursor`].
pub trait Codec {
    type Value;

    fn order(&self) -> Order;

    fn set_order(&mut self, order: Order);

    /// Exact number of bytes `serialize` will produce for `value`
    fn serialized_length(&self, value: &Self::Value) -> usize;

    /// Appends the encoding of `value` to `buffer`
    fn serialize(&self, value: &Self::Value, buffer: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Advances the cursor over one encoded value without materializing it,
    /// returning the number of bytes skipped
    fn skip(&self, cursor: &mut Cursor<'_>) -> Result<usize, CodecError>;

    fn deserialize(&self, cursor: &mut Cursor<'_>) -> Result<Self::Value, CodecError>;

    /// Encodes into a fresh, exactly sized buffer
    fn encode_to_vec(&self, value: &Self::Value) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Vec::with_capacity(self.serialized_length(value));
        self.serialize(value, &mut buffer)?;
        Ok(buffer)
    }
}
