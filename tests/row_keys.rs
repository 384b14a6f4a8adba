//! End to end checks over composite row keys: encoded keys must sort
//! exactly like the tuples they encode, in both directions, and decode
//! back to the same values.

use codec::bytes::BytesCodec;
use codec::decimal::DecimalCodec;
use codec::fixint::{FixedIntCodec, IntWidth};
use codec::float::Float64Codec;
use codec::text::TextCodec;
use codec::varint::{UnsignedVarIntCodec, VarIntCodec};
use codec::{BigDecimal, Codec, Cursor, FieldCodec, Order, RowCodec, Value};
use std::str::FromStr;

fn decimal(text: &str) -> Value {
    Value::Decimal(BigDecimal::from_str(text).unwrap())
}

/// A representative table key: tenant id, name, balance, score, payload
fn table_key() -> RowCodec {
    RowCodec::new(vec![
        FieldCodec::UnsignedVarInt(UnsignedVarIntCodec::new(Order::Ascending)),
        FieldCodec::Text(TextCodec::new(Order::Ascending)),
        FieldCodec::Decimal(DecimalCodec::new(Order::Ascending)),
        FieldCodec::Float64(Float64Codec::new(Order::Ascending)),
        FieldCodec::Bytes(BytesCodec::new(Order::Ascending)),
    ])
}

fn table_tuples() -> Vec<Vec<Value>> {
    // Already sorted by tuple order, nulls first within each field
    vec![
        vec![
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
        ],
        vec![
            Value::Null,
            Value::from("zz"),
            decimal("1"),
            Value::Float64(1.0),
            Value::Bytes(vec![]),
        ],
        vec![
            Value::UInt(1),
            Value::Null,
            decimal("-0.5"),
            Value::Float64(0.0),
            Value::Bytes(vec![0x00]),
        ],
        vec![
            Value::UInt(1),
            Value::from(""),
            decimal("11.5"),
            Value::Null,
            Value::Null,
        ],
        vec![
            Value::UInt(1),
            Value::from("alice"),
            Value::Null,
            Value::Float64(-2.5),
            Value::Bytes(vec![0xFF, 0x00]),
        ],
        vec![
            Value::UInt(1),
            Value::from("alice"),
            decimal("-3200"),
            Value::Float64(9.75),
            Value::Bytes(vec![0x41]),
        ],
        vec![
            Value::UInt(1),
            Value::from("alice"),
            decimal("7.25"),
            Value::Float64(f64::NEG_INFINITY),
            Value::Null,
        ],
        vec![
            Value::UInt(1),
            Value::from("aliced"),
            decimal("0"),
            Value::Float64(0.0),
            Value::Bytes(vec![]),
        ],
        vec![
            Value::UInt(1),
            Value::from("bob"),
            decimal("0.001"),
            Value::Float64(0.25),
            Value::Bytes(vec![0x00, 0x01]),
        ],
        vec![
            Value::UInt(200),
            Value::from("a"),
            decimal("55"),
            Value::Float64(1e300),
            Value::Bytes(vec![0xFE]),
        ],
        vec![
            Value::UInt(70000),
            Value::Null,
            decimal("-99999999999999999999.5"),
            Value::Float64(f64::NAN),
            Value::Bytes(vec![0x01, 0x02, 0x03]),
        ],
    ]
}

fn assert_tuple_values_eq(left: &[Value], right: &[Value]) {
    assert_eq!(left.len(), right.len());
    for (l, r) in left.iter().zip(right) {
        match (l, r) {
            (Value::Float64(a), Value::Float64(b)) if a.is_nan() => assert!(b.is_nan()),
            (l, r) => assert_eq!(l, r),
        }
    }
}

#[test]
fn test_composite_keys_sort_like_tuples() {
    let row = table_key();
    let tuples = table_tuples();
    let mut encodings: Vec<Vec<u8>> = tuples
        .iter()
        .map(|tuple| row.encode_to_vec(tuple).unwrap())
        .collect();
    let expected = encodings.clone();
    encodings.sort();
    assert_eq!(encodings, expected);

    for tuple in &tuples {
        let encoded = row.encode_to_vec(tuple).unwrap();
        assert_eq!(encoded.len(), row.serialized_length(tuple).unwrap());
        let mut cursor = Cursor::new(&encoded);
        assert_tuple_values_eq(&row.deserialize(&mut cursor).unwrap(), tuple);
        assert!(cursor.is_empty());
    }
}

#[test]
fn test_descending_inverts_the_whole_key() {
    let mut row = table_key();
    row.set_order(Order::Descending);
    let tuples = table_tuples();
    let mut encodings: Vec<Vec<u8>> = tuples
        .iter()
        .map(|tuple| row.encode_to_vec(tuple).unwrap())
        .collect();
    let mut expected = encodings.clone();
    expected.reverse();
    encodings.sort();
    assert_eq!(encodings, expected);

    for tuple in &tuples {
        let encoded = row.encode_to_vec(tuple).unwrap();
        let mut cursor = Cursor::new(&encoded);
        assert_tuple_values_eq(&row.deserialize(&mut cursor).unwrap(), tuple);
        assert!(cursor.is_empty());
    }

    // And back again
    row.set_order(Order::Ascending);
    let ascending = table_key();
    for tuple in &tuples {
        assert_eq!(
            row.encode_to_vec(tuple).unwrap(),
            ascending.encode_to_vec(tuple).unwrap()
        );
    }
}

#[test]
fn test_skip_positions_match_field_boundaries() {
    let row = table_key();
    for tuple in &table_tuples() {
        let encoded = row.encode_to_vec(tuple).unwrap();
        let mut skipper = Cursor::new(&encoded);
        let mut total = 0;
        for field in row.fields() {
            total += field.skip(&mut skipper).unwrap();
        }
        assert_eq!(total, encoded.len());
        assert!(skipper.is_empty());
    }
}

#[test]
fn test_fixed_width_prefix_scans() {
    // Fixed-width prefix fields keep every key the same distance from the
    // variable tail, the layout used for table id prefixes
    let row = RowCodec::new(vec![
        FieldCodec::FixedInt(FixedIntCodec::new(Order::Ascending, IntWidth::W32)),
        FieldCodec::VarInt(VarIntCodec::new(Order::Ascending)),
    ]);
    let mut previous: Option<Vec<u8>> = None;
    for (table, row_id) in &[(-5_i64, 100_i64), (-5, 101), (0, -7), (0, 0), (7, i64::MIN)] {
        let encoded = row
            .encode_to_vec(&[Value::Int(*table), Value::Int(*row_id)])
            .unwrap();
        // The table prefix occupies the first four bytes exactly
        assert_eq!(
            encoded[..4],
            FixedIntCodec::new(Order::Ascending, IntWidth::W32)
                .encode_to_vec(table)
                .unwrap()[..],
            "prefix for table {}",
            table
        );
        if let Some(previous) = previous {
            assert!(previous < encoded);
        }
        previous = Some(encoded);
    }
}

#[test]
fn test_spec_decimal_ordering_example() {
    let codec = DecimalCodec::new(Order::Ascending);
    let values = ["-5", "-0.5", "0", "0.5", "5", "55"];
    let mut encodings: Vec<Vec<u8>> = values
        .iter()
        .map(|text| {
            codec
                .encode_to_vec(&Some(BigDecimal::from_str(text).unwrap()))
                .unwrap()
        })
        .collect();
    let expected = encodings.clone();
    encodings.sort();
    assert_eq!(encodings, expected);
}

#[test]
fn test_null_sorts_first_in_every_nullable_codec() {
    // Varints, floats, decimals and text all reserve their smallest
    // ascending encoding (largest descending) for NULL
    let varint_asc = VarIntCodec::new(Order::Ascending);
    assert!(
        varint_asc.encode_to_vec(&None).unwrap()
            < varint_asc.encode_to_vec(&Some(i64::MIN)).unwrap()
    );
    let float_desc = Float64Codec::new(Order::Descending);
    assert!(
        float_desc.encode_to_vec(&None).unwrap()
            > float_desc.encode_to_vec(&Some(f64::NAN)).unwrap()
    );
    let decimal_asc = DecimalCodec::new(Order::Ascending);
    assert!(
        decimal_asc.encode_to_vec(&None).unwrap()
            < decimal_asc
                .encode_to_vec(&Some(BigDecimal::from_str("-1e100").unwrap()))
                .unwrap()
    );
    let text_asc = TextCodec::new(Order::Ascending);
    assert!(
        text_asc.encode_to_vec(&None).unwrap()
            < text_asc.encode_to_vec(&Some(String::new())).unwrap()
    );
}
