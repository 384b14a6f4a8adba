use clap::{App, Arg, ArgMatches, SubCommand};
use codec::bytes::BytesCodec;
use codec::decimal::DecimalCodec;
use codec::fixbytes::FixedBytesCodec;
use codec::fixint::{FixedIntCodec, FixedUnsignedCodec, IntWidth};
use codec::float::{Float32Codec, Float64Codec};
use codec::text::TextCodec;
use codec::varint::{UnsignedVarInt32Codec, UnsignedVarIntCodec, VarInt32Codec, VarIntCodec};
use codec::{Cursor, FieldCodec, Order, RowCodec, Value};
use std::error::Error;

/// Keys in a byte-ordered store are opaque without their schema; this
/// binary decodes them (and builds them) given a comma separated list of
/// field types, so stored data stays inspectable from a shell.
fn main() -> Result<(), Box<dyn Error>> {
    let schema_arg = Arg::with_name("schema")
        .long("schema")
        .takes_value(true)
        .required(true)
        .help("Comma separated field types: bigint, int, ubigint, uint, int8-int64, uint8-uint64, float32, float64, decimal, bytes, fixedbytes:<len>, text");
    let desc_arg = Arg::with_name("desc")
        .long("desc")
        .help("Use descending order for every field");

    let matches = App::new("ordkey")
        .about("Inspect and build order-preserving row keys")
        .subcommand(
            SubCommand::with_name("decode")
                .about("Decode a hex encoded row key")
                .arg(schema_arg.clone())
                .arg(desc_arg.clone())
                .arg(
                    Arg::with_name("key")
                        .required(true)
                        .help("Hex encoded row key"),
                ),
        )
        .subcommand(
            SubCommand::with_name("encode")
                .about("Encode field values into a hex row key")
                .arg(schema_arg)
                .arg(desc_arg)
                .arg(
                    Arg::with_name("values")
                        .multiple(true)
                        .help("One literal per field, 'null' for a null field"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("decode", Some(sub)) => decode(sub),
        ("encode", Some(sub)) => encode(sub),
        _ => {
            eprintln!("{}", matches.usage());
            std::process::exit(2);
        }
    }
}

fn parse_row(sub: &ArgMatches) -> Result<RowCodec, Box<dyn Error>> {
    let order = if sub.is_present("desc") {
        Order::Descending
    } else {
        Order::Ascending
    };
    let mut fields = vec![];
    for token in sub
        .value_of("schema")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
    {
        fields.push(field_codec(token, order)?);
    }
    Ok(RowCodec::new(fields))
}

fn field_codec(token: &str, order: Order) -> Result<FieldCodec, Box<dyn Error>> {
    let codec = match token {
        "bigint" => FieldCodec::VarInt(VarIntCodec::new(order)),
        "int" => FieldCodec::VarInt32(VarInt32Codec::new(order)),
        "ubigint" => FieldCodec::UnsignedVarInt(UnsignedVarIntCodec::new(order)),
        "uint" => FieldCodec::UnsignedVarInt32(UnsignedVarInt32Codec::new(order)),
        "int8" => FieldCodec::FixedInt(FixedIntCodec::new(order, IntWidth::W8)),
        "int16" => FieldCodec::FixedInt(FixedIntCodec::new(order, IntWidth::W16)),
        "int32" => FieldCodec::FixedInt(FixedIntCodec::new(order, IntWidth::W32)),
        "int64" => FieldCodec::FixedInt(FixedIntCodec::new(order, IntWidth::W64)),
        "uint8" => FieldCodec::FixedUnsigned(FixedUnsignedCodec::new(order, IntWidth::W8)),
        "uint16" => FieldCodec::FixedUnsigned(FixedUnsignedCodec::new(order, IntWidth::W16)),
        "uint32" => FieldCodec::FixedUnsigned(FixedUnsignedCodec::new(order, IntWidth::W32)),
        "uint64" => FieldCodec::FixedUnsigned(FixedUnsignedCodec::new(order, IntWidth::W64)),
        "float32" => FieldCodec::Float32(Float32Codec::new(order)),
        "float64" => FieldCodec::Float64(Float64Codec::new(order)),
        "decimal" => FieldCodec::Decimal(DecimalCodec::new(order)),
        "bytes" => FieldCodec::Bytes(BytesCodec::new(order)),
        "text" => FieldCodec::Text(TextCodec::new(order)),
        other => {
            if let Some(length) = other.strip_prefix("fixedbytes:") {
                let length: usize = length
                    .parse()
                    .map_err(|_| format!("bad fixedbytes length in '{}'", other))?;
                FieldCodec::FixedBytes(FixedBytesCodec::new(order, length))
            } else {
                return Err(format!("unknown field type '{}'", other).into());
            }
        }
    };
    Ok(codec)
}

fn decode(sub: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let row = parse_row(sub)?;
    let key = hex::decode(sub.value_of("key").unwrap_or_default())?;
    let mut cursor = Cursor::new(&key);
    let values = row.deserialize(&mut cursor)?;
    if !cursor.is_empty() {
        eprintln!(
            "warning: {} trailing bytes after the last field",
            cursor.remaining()
        );
    }
    for value in values {
        println!("{}", render(&value));
    }
    Ok(())
}

fn encode(sub: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let row = parse_row(sub)?;
    let literals: Vec<&str> = sub
        .values_of("values")
        .map(|values| values.collect())
        .unwrap_or_default();
    if literals.len() != row.fields().len() {
        return Err(format!(
            "schema has {} fields but {} values were given",
            row.fields().len(),
            literals.len()
        )
        .into());
    }
    let mut values = vec![];
    for (field, literal) in row.fields().iter().zip(&literals) {
        values.push(parse_value(field, *literal)?);
    }
    println!("{}", hex::encode(row.encode_to_vec(&values)?));
    Ok(())
}

fn parse_value(field: &FieldCodec, literal: &str) -> Result<Value, Box<dyn Error>> {
    if literal == "null" {
        return Ok(Value::Null);
    }
    let value = match field {
        FieldCodec::VarInt(_) | FieldCodec::VarInt32(_) | FieldCodec::FixedInt(_) => {
            Value::Int(literal.parse()?)
        }
        FieldCodec::UnsignedVarInt(_)
        | FieldCodec::UnsignedVarInt32(_)
        | FieldCodec::FixedUnsigned(_) => Value::UInt(literal.parse()?),
        FieldCodec::Float32(_) => Value::Float32(literal.parse()?),
        FieldCodec::Float64(_) => Value::Float64(literal.parse()?),
        FieldCodec::Decimal(_) => Value::Decimal(literal.parse()?),
        FieldCodec::Bytes(_) | FieldCodec::FixedBytes(_) => Value::Bytes(hex::decode(literal)?),
        FieldCodec::Text(_) => Value::Text(literal.to_string()),
    };
    Ok(value)
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float32(f) => f.to_string(),
        Value::Float64(f) => f.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::Bytes(b) => format!("0x{}", hex::encode(b)),
        Value::Text(t) => format!("{:?}", t),
    }
}
