// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Presto SerializedPage decoder
//!
//! Page layout (little-endian):
//! - header: i32 row count, u8 codec markers, i32 uncompressed size,
//!   i32 size, i64 checksum
//! - body: i32 column count, then per column an i32 length-prefixed encoding
//!   name followed by the encoded block
//!
//! Null flags are a `has_nulls` byte followed, when set, by one bit per
//! position packed MSB first. Fixed-width encodings store values only for
//! non-null positions.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use byteorder::{LittleEndian, ReadBytesExt};
use refq_common::{ReferenceError, Result, RowType, Type};
use refq_plan::{RowVector, Value};
use std::io::{Cursor, Read};

pub(crate) const CODEC_COMPRESSED: u8 = 0x1;
pub(crate) const CODEC_ENCRYPTED: u8 = 0x2;
pub(crate) const CODEC_CHECKSUMMED: u8 = 0x4;

pub(crate) const BYTE_ARRAY: &str = "BYTE_ARRAY";
pub(crate) const SHORT_ARRAY: &str = "SHORT_ARRAY";
pub(crate) const INT_ARRAY: &str = "INT_ARRAY";
pub(crate) const LONG_ARRAY: &str = "LONG_ARRAY";
pub(crate) const INT128_ARRAY: &str = "INT128_ARRAY";
pub(crate) const VARIABLE_WIDTH: &str = "VARIABLE_WIDTH";
pub(crate) const ARRAY: &str = "ARRAY";
pub(crate) const MAP: &str = "MAP";
pub(crate) const ROW: &str = "ROW";
pub(crate) const RLE: &str = "RLE";
pub(crate) const DICTIONARY: &str = "DICTIONARY";

/// Decodes one base64-encoded page from a `binaryData` entry.
pub fn decode_page(encoded: &str, row_type: &RowType) -> Result<RowVector> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| ReferenceError::Decode(format!("Invalid base64 page: {}", e)))?;
    decode_page_bytes(&bytes, row_type)
}

/// Decodes one serialized page into a batch of `row_type`.
pub fn decode_page_bytes(bytes: &[u8], row_type: &RowType) -> Result<RowVector> {
    let mut cursor = Cursor::new(bytes);
    read_page(&mut cursor, row_type).map_err(|e| match e {
        ReferenceError::Io(io) => ReferenceError::Decode(format!("Truncated page: {}", io)),
        other => other,
    })
}

#[derive(Debug)]
struct PageHeader {
    num_rows: usize,
    codec: u8,
    uncompressed_size: usize,
    size: usize,
}

impl PageHeader {
    fn read(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let num_rows = read_count(cursor, "row count")?;
        let codec = cursor.read_u8()?;
        let uncompressed_size = read_count(cursor, "uncompressed size")?;
        let size = read_count(cursor, "size")?;
        let _checksum = cursor.read_i64::<LittleEndian>()?;

        Ok(PageHeader {
            num_rows,
            codec,
            uncompressed_size,
            size,
        })
    }
}

fn read_page(cursor: &mut Cursor<&[u8]>, row_type: &RowType) -> Result<RowVector> {
    let header = PageHeader::read(cursor)?;

    if header.codec & CODEC_COMPRESSED != 0 {
        return Err(ReferenceError::Decode("Compressed pages are not supported".to_string()));
    }
    if header.codec & CODEC_ENCRYPTED != 0 {
        return Err(ReferenceError::Decode("Encrypted pages are not supported".to_string()));
    }

    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if header.size != remaining || header.uncompressed_size != header.size {
        return Err(ReferenceError::Decode(format!(
            "Page body is {} bytes, header declares {} (uncompressed {})",
            remaining, header.size, header.uncompressed_size
        )));
    }

    let num_columns = read_count(cursor, "column count")?;
    if num_columns != row_type.len() {
        return Err(ReferenceError::Decode(format!(
            "Page has {} columns, result metadata declares {}",
            num_columns,
            row_type.len()
        )));
    }

    let mut columns = Vec::with_capacity(num_columns);
    for (name, ty) in row_type.fields() {
        let column = read_block(cursor, ty)?;
        if column.len() != header.num_rows {
            return Err(ReferenceError::Decode(format!(
                "Column '{}' has {} rows, expected {}",
                name,
                column.len(),
                header.num_rows
            )));
        }
        columns.push(column);
    }

    tracing::debug!(
        "Decoded page: {} rows x {} columns",
        header.num_rows,
        num_columns
    );

    RowVector::with_num_rows(row_type.clone(), header.num_rows, columns)
}

fn read_count(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<usize> {
    let value = cursor.read_i32::<LittleEndian>()?;
    usize::try_from(value)
        .map_err(|_| ReferenceError::Decode(format!("Negative {}: {}", what, value)))
}

fn read_encoding(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let len = read_count(cursor, "encoding name length")?;
    let mut name = vec![0u8; len];
    cursor.read_exact(&mut name)?;
    String::from_utf8(name).map_err(|e| ReferenceError::Decode(format!("Invalid encoding name: {}", e)))
}

/// Per-position null flags, `None` when the block has no nulls.
fn read_nulls(cursor: &mut Cursor<&[u8]>, count: usize) -> Result<Option<Vec<bool>>> {
    if cursor.read_u8()? == 0 {
        return Ok(None);
    }

    let mut packed = vec![0u8; count.div_ceil(8)];
    cursor.read_exact(&mut packed)?;
    Ok(Some(
        (0..count)
            .map(|i| packed[i / 8] & (0x80 >> (i % 8)) != 0)
            .collect(),
    ))
}

fn is_null(nulls: &Option<Vec<bool>>, position: usize) -> bool {
    nulls.as_ref().map_or(false, |n| n[position])
}

fn read_offsets(cursor: &mut Cursor<&[u8]>, count: usize) -> Result<Vec<usize>> {
    (0..count).map(|_| read_count(cursor, "offset")).collect()
}

fn read_block(cursor: &mut Cursor<&[u8]>, ty: &Type) -> Result<Vec<Value>> {
    let encoding = read_encoding(cursor)?;
    match encoding.as_str() {
        BYTE_ARRAY => read_fixed_width::<i8>(cursor, ty),
        SHORT_ARRAY => read_fixed_width::<i16>(cursor, ty),
        INT_ARRAY => read_fixed_width::<i32>(cursor, ty),
        LONG_ARRAY => read_fixed_width::<i64>(cursor, ty),
        INT128_ARRAY => read_fixed_width::<i128>(cursor, ty),
        VARIABLE_WIDTH => read_variable_width(cursor, ty),
        ARRAY => read_array(cursor, ty),
        MAP => read_map(cursor, ty),
        ROW => read_row(cursor, ty),
        RLE => read_rle(cursor, ty),
        DICTIONARY => read_dictionary(cursor, ty),
        other => Err(ReferenceError::Decode(format!("Unsupported block encoding: {}", other))),
    }
}

fn type_mismatch(encoding: &str, ty: &Type) -> ReferenceError {
    ReferenceError::Decode(format!("Encoding {} cannot hold values of type {}", encoding, ty))
}

/// Fixed-width physical value and its mapping onto logical types
trait FromBytes: Sized {
    const ENCODING: &'static str;
    fn read_from(cursor: &mut Cursor<&[u8]>) -> Result<Self>;
    fn to_value(self, ty: &Type) -> Result<Value>;
}

impl FromBytes for i8 {
    const ENCODING: &'static str = BYTE_ARRAY;

    fn read_from(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(cursor.read_i8()?)
    }

    fn to_value(self, ty: &Type) -> Result<Value> {
        match ty {
            Type::Boolean => Ok(Value::Boolean(self != 0)),
            Type::TinyInt => Ok(Value::TinyInt(self)),
            _ => Err(type_mismatch(Self::ENCODING, ty)),
        }
    }
}

impl FromBytes for i16 {
    const ENCODING: &'static str = SHORT_ARRAY;

    fn read_from(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(cursor.read_i16::<LittleEndian>()?)
    }

    fn to_value(self, ty: &Type) -> Result<Value> {
        match ty {
            Type::SmallInt => Ok(Value::SmallInt(self)),
            _ => Err(type_mismatch(Self::ENCODING, ty)),
        }
    }
}

impl FromBytes for i32 {
    const ENCODING: &'static str = INT_ARRAY;

    fn read_from(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(cursor.read_i32::<LittleEndian>()?)
    }

    fn to_value(self, ty: &Type) -> Result<Value> {
        match ty {
            Type::Integer => Ok(Value::Integer(self)),
            Type::Date => Ok(Value::Date(self)),
            Type::Real => Ok(Value::Real(f32::from_bits(self as u32))),
            Type::IntervalYearMonth => Ok(Value::IntervalYearMonth(self)),
            _ => Err(type_mismatch(Self::ENCODING, ty)),
        }
    }
}

impl FromBytes for i64 {
    const ENCODING: &'static str = LONG_ARRAY;

    fn read_from(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(cursor.read_i64::<LittleEndian>()?)
    }

    fn to_value(self, ty: &Type) -> Result<Value> {
        match ty {
            Type::BigInt => Ok(Value::BigInt(self)),
            Type::Double => Ok(Value::Double(f64::from_bits(self as u64))),
            Type::Timestamp => Ok(Value::Timestamp(self)),
            Type::IntervalDayTime => Ok(Value::IntervalDayTime(self)),
            Type::Decimal { .. } if ty.is_short_decimal() => Ok(Value::Decimal(self as i128)),
            _ => Err(type_mismatch(Self::ENCODING, ty)),
        }
    }
}

impl FromBytes for i128 {
    const ENCODING: &'static str = INT128_ARRAY;

    /// Low word first; the high word carries the sign bit of a sign-magnitude
    /// value.
    fn read_from(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let low = cursor.read_i64::<LittleEndian>()?;
        let high = cursor.read_i64::<LittleEndian>()?;
        let magnitude = (((high & i64::MAX) as u128) << 64 | (low as u64 as u128)) as i128;
        Ok(if high < 0 { -magnitude } else { magnitude })
    }

    fn to_value(self, ty: &Type) -> Result<Value> {
        match ty {
            Type::Decimal { .. } if !ty.is_short_decimal() => Ok(Value::Decimal(self)),
            Type::HugeInt | Type::Uuid | Type::IpAddress => Ok(Value::HugeInt(self)),
            _ => Err(type_mismatch(Self::ENCODING, ty)),
        }
    }
}

fn read_fixed_width<T: FromBytes>(cursor: &mut Cursor<&[u8]>, ty: &Type) -> Result<Vec<Value>> {
    let count = read_count(cursor, "position count")?;
    let nulls = read_nulls(cursor, count)?;

    let mut values = Vec::with_capacity(count);
    for position in 0..count {
        if is_null(&nulls, position) {
            values.push(Value::Null);
            continue;
        }
        let raw = T::read_from(cursor)?;
        // UNKNOWN columns are all null but still arrive in a concrete encoding
        values.push(if *ty == Type::Unknown { Value::Null } else { raw.to_value(ty)? });
    }
    Ok(values)
}

fn read_variable_width(cursor: &mut Cursor<&[u8]>, ty: &Type) -> Result<Vec<Value>> {
    let count = read_count(cursor, "position count")?;
    let end_offsets = read_offsets(cursor, count)?;
    let nulls = read_nulls(cursor, count)?;
    let total = read_count(cursor, "slice length")?;
    let mut data = vec![0u8; total];
    cursor.read_exact(&mut data)?;

    let mut values = Vec::with_capacity(count);
    let mut start = 0usize;
    for (position, &end) in end_offsets.iter().enumerate() {
        if end < start || end > data.len() {
            return Err(ReferenceError::Decode(format!(
                "Variable width offset {} out of range [{}, {}]",
                end,
                start,
                data.len()
            )));
        }
        let bytes = &data[start..end];
        start = end;

        if is_null(&nulls, position) {
            values.push(Value::Null);
            continue;
        }
        values.push(match ty {
            Type::Varchar | Type::Json => Value::Varchar(String::from_utf8_lossy(bytes).to_string()),
            Type::Varbinary | Type::HyperLogLog | Type::TDigest(_) | Type::IpPrefix => {
                Value::Varbinary(bytes.to_vec())
            }
            Type::Unknown => Value::Null,
            _ => return Err(type_mismatch(VARIABLE_WIDTH, ty)),
        });
    }
    Ok(values)
}

/// Slices `elements` by `offsets` (count + 1 entries), null positions
/// become `Value::Null`.
fn slice_by_offsets<T: Clone>(
    elements: &[T],
    offsets: &[usize],
    nulls: &Option<Vec<bool>>,
    build: impl Fn(Vec<T>) -> Value,
) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(offsets.len().saturating_sub(1));
    for (position, window) in offsets.windows(2).enumerate() {
        let (start, end) = (window[0], window[1]);
        if start > end || end > elements.len() {
            return Err(ReferenceError::Decode(format!(
                "Nested offsets [{}, {}) out of range for {} elements",
                start,
                end,
                elements.len()
            )));
        }
        if is_null(nulls, position) {
            values.push(Value::Null);
        } else {
            values.push(build(elements[start..end].to_vec()));
        }
    }
    Ok(values)
}

fn read_array(cursor: &mut Cursor<&[u8]>, ty: &Type) -> Result<Vec<Value>> {
    let element_type = match ty {
        Type::Array(element) => element.as_ref(),
        _ => return Err(type_mismatch(ARRAY, ty)),
    };

    let elements = read_block(cursor, element_type)?;
    let count = read_count(cursor, "position count")?;
    let offsets = read_offsets(cursor, count + 1)?;
    let nulls = read_nulls(cursor, count)?;

    slice_by_offsets(&elements, &offsets, &nulls, Value::Array)
}

fn read_map(cursor: &mut Cursor<&[u8]>, ty: &Type) -> Result<Vec<Value>> {
    let (key_type, value_type) = match ty {
        Type::Map(key, value) => (key.as_ref(), value.as_ref()),
        _ => return Err(type_mismatch(MAP, ty)),
    };

    let keys = read_block(cursor, key_type)?;
    let values = read_block(cursor, value_type)?;
    if keys.len() != values.len() {
        return Err(ReferenceError::Decode(format!(
            "Map has {} keys but {} values",
            keys.len(),
            values.len()
        )));
    }

    // Optional hash table, not needed to rebuild entries
    let hash_table_len = cursor.read_i32::<LittleEndian>()?;
    for _ in 0..hash_table_len.max(0) {
        cursor.read_i32::<LittleEndian>()?;
    }

    let count = read_count(cursor, "position count")?;
    let offsets = read_offsets(cursor, count + 1)?;
    let nulls = read_nulls(cursor, count)?;

    let entries: Vec<(Value, Value)> = keys.into_iter().zip(values).collect();
    slice_by_offsets(&entries, &offsets, &nulls, Value::Map)
}

fn read_row(cursor: &mut Cursor<&[u8]>, ty: &Type) -> Result<Vec<Value>> {
    let row_type = match ty {
        Type::Row(row_type) => row_type,
        _ => return Err(type_mismatch(ROW, ty)),
    };

    let num_fields = read_count(cursor, "field count")?;
    if num_fields != row_type.len() {
        return Err(ReferenceError::Decode(format!(
            "Row block has {} fields, type {} has {}",
            num_fields,
            ty,
            row_type.len()
        )));
    }
    let fields = row_type
        .types()
        .iter()
        .map(|field_type| read_block(cursor, field_type))
        .collect::<Result<Vec<_>>>()?;

    let count = read_count(cursor, "position count")?;
    let offsets = read_offsets(cursor, count + 1)?;
    let nulls = read_nulls(cursor, count)?;

    let mut values = Vec::with_capacity(count);
    for position in 0..count {
        if is_null(&nulls, position) {
            values.push(Value::Null);
            continue;
        }
        let index = offsets[position];
        let row = fields
            .iter()
            .map(|field| {
                field.get(index).cloned().ok_or_else(|| {
                    ReferenceError::Decode(format!("Row field offset {} out of range", index))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        values.push(Value::Row(row));
    }
    Ok(values)
}

fn read_rle(cursor: &mut Cursor<&[u8]>, ty: &Type) -> Result<Vec<Value>> {
    let count = read_count(cursor, "position count")?;
    let single = read_block(cursor, ty)?;
    match single.as_slice() {
        [value] => Ok(vec![value.clone(); count]),
        _ => Err(ReferenceError::Decode(format!(
            "RLE block must wrap a single value, got {}",
            single.len()
        ))),
    }
}

fn read_dictionary(cursor: &mut Cursor<&[u8]>, ty: &Type) -> Result<Vec<Value>> {
    let count = read_count(cursor, "position count")?;
    let dictionary = read_block(cursor, ty)?;

    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let id = read_count(cursor, "dictionary id")?;
        let value = dictionary.get(id).cloned().ok_or_else(|| {
            ReferenceError::Decode(format!(
                "Dictionary id {} out of range for {} entries",
                id,
                dictionary.len()
            ))
        })?;
        values.push(value);
    }

    // Dictionary instance id: most significant bits, least significant bits, sequence
    for _ in 0..3 {
        cursor.read_i64::<LittleEndian>()?;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_writer::{encode_page, write_block, write_encoding};
    use byteorder::WriteBytesExt;

    fn single_column(name: &str, ty: Type) -> RowType {
        RowType::from_fields(vec![(name, ty)])
    }

    /// Wraps a hand-written body (column count plus blocks) in a page header.
    fn page(num_rows: i32, codec: u8, body: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.write_i32::<LittleEndian>(num_rows).unwrap();
        bytes.write_u8(codec).unwrap();
        bytes.write_i32::<LittleEndian>(body.len() as i32).unwrap();
        bytes.write_i32::<LittleEndian>(body.len() as i32).unwrap();
        bytes.write_i64::<LittleEndian>(0).unwrap();
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn test_decode_long_array_with_nulls() {
        let mut body = Vec::new();
        body.write_i32::<LittleEndian>(1).unwrap();
        write_encoding(&mut body, LONG_ARRAY).unwrap();
        body.write_i32::<LittleEndian>(3).unwrap();
        body.write_u8(1).unwrap();
        body.write_u8(0b0100_0000).unwrap(); // position 1 is null
        body.write_i64::<LittleEndian>(7).unwrap();
        body.write_i64::<LittleEndian>(-9).unwrap();

        let vector = decode_page_bytes(&page(3, 0, &body), &single_column("c0", Type::BigInt)).unwrap();
        assert_eq!(vector.column(0), &[Value::BigInt(7), Value::Null, Value::BigInt(-9)]);
    }

    #[test]
    fn test_decode_variable_width() {
        let mut body = Vec::new();
        body.write_i32::<LittleEndian>(1).unwrap();
        write_encoding(&mut body, VARIABLE_WIDTH).unwrap();
        body.write_i32::<LittleEndian>(3).unwrap();
        for end in [2, 2, 5] {
            body.write_i32::<LittleEndian>(end).unwrap();
        }
        body.write_u8(1).unwrap();
        body.write_u8(0b0100_0000).unwrap();
        body.write_i32::<LittleEndian>(5).unwrap();
        body.extend_from_slice(b"abxyz");

        let vector = decode_page_bytes(&page(3, 0, &body), &single_column("s", Type::Varchar)).unwrap();
        assert_eq!(
            vector.column(0),
            &[
                Value::Varchar("ab".to_string()),
                Value::Null,
                Value::Varchar("xyz".to_string())
            ]
        );
    }

    #[test]
    fn test_decode_int128_sign_magnitude() {
        let mut body = Vec::new();
        body.write_i32::<LittleEndian>(1).unwrap();
        write_encoding(&mut body, INT128_ARRAY).unwrap();
        body.write_i32::<LittleEndian>(2).unwrap();
        body.write_u8(0).unwrap();
        body.write_i64::<LittleEndian>(5).unwrap();
        body.write_i64::<LittleEndian>(0).unwrap();
        body.write_i64::<LittleEndian>(5).unwrap();
        body.write_i64::<LittleEndian>(i64::MIN | 1).unwrap();

        let ty = Type::Decimal { precision: 38, scale: 2 };
        let vector = decode_page_bytes(&page(2, 0, &body), &single_column("d", ty)).unwrap();
        assert_eq!(
            vector.column(0),
            &[Value::Decimal(5), Value::Decimal(-((1i128 << 64) + 5))]
        );
    }

    #[test]
    fn test_decode_rle_and_dictionary() {
        let ty = Type::Integer;
        let mut body = Vec::new();
        body.write_i32::<LittleEndian>(2).unwrap();

        write_encoding(&mut body, RLE).unwrap();
        body.write_i32::<LittleEndian>(3).unwrap();
        write_block(&mut body, &ty, &[Value::Integer(42)]).unwrap();

        write_encoding(&mut body, DICTIONARY).unwrap();
        body.write_i32::<LittleEndian>(3).unwrap();
        write_block(&mut body, &ty, &[Value::Integer(10), Value::Null]).unwrap();
        for id in [1, 0, 0] {
            body.write_i32::<LittleEndian>(id).unwrap();
        }
        for _ in 0..3 {
            body.write_i64::<LittleEndian>(0).unwrap();
        }

        let row_type = RowType::from_fields(vec![("a", ty.clone()), ("b", ty)]);
        let vector = decode_page_bytes(&page(3, 0, &body), &row_type).unwrap();
        assert_eq!(vector.column(0), &vec![Value::Integer(42); 3][..]);
        assert_eq!(vector.column(1), &[Value::Null, Value::Integer(10), Value::Integer(10)]);
    }

    #[test]
    fn test_decode_nested_page_written_by_encoder() {
        let row_type = RowType::from_fields(vec![
            ("a", Type::Array(Box::new(Type::Real))),
            ("m", Type::Map(Box::new(Type::Varchar), Box::new(Type::Boolean))),
            (
                "r",
                Type::Row(RowType::from_fields(vec![("x", Type::Date), ("y", Type::SmallInt)])),
            ),
        ]);
        let vector = RowVector::new(
            row_type.clone(),
            vec![
                vec![
                    Value::Array(vec![Value::Real(1.5), Value::Null]),
                    Value::Null,
                    Value::Array(vec![]),
                ],
                vec![
                    Value::Map(vec![(Value::Varchar("k".to_string()), Value::Boolean(true))]),
                    Value::Map(vec![]),
                    Value::Null,
                ],
                vec![
                    Value::Null,
                    Value::Row(vec![Value::Date(19000), Value::Null]),
                    Value::Row(vec![Value::Null, Value::SmallInt(-3)]),
                ],
            ],
        )
        .unwrap();

        let encoded = BASE64.encode(encode_page(&vector).unwrap());
        assert_eq!(decode_page(&encoded, &row_type).unwrap(), vector);
    }

    #[test]
    fn test_zero_column_page_keeps_row_count() {
        let mut body = Vec::new();
        body.write_i32::<LittleEndian>(0).unwrap();
        let vector = decode_page_bytes(&page(4, 0, &body), &RowType::default()).unwrap();
        assert_eq!(vector.num_rows(), 4);
        assert_eq!(vector.num_columns(), 0);
    }

    #[test]
    fn test_rejects_compressed_and_mismatched_pages() {
        let mut body = Vec::new();
        body.write_i32::<LittleEndian>(0).unwrap();

        let compressed = decode_page_bytes(&page(0, CODEC_COMPRESSED, &body), &RowType::default());
        assert!(matches!(compressed, Err(ReferenceError::Decode(_))));

        let checksummed = decode_page_bytes(&page(0, CODEC_CHECKSUMMED, &body), &RowType::default());
        assert!(checksummed.is_ok());

        let wrong_columns = decode_page_bytes(&page(0, 0, &body), &single_column("c0", Type::BigInt));
        assert!(matches!(wrong_columns, Err(ReferenceError::Decode(_))));

        let truncated = decode_page_bytes(&[1, 0, 0], &RowType::default());
        assert!(matches!(truncated, Err(ReferenceError::Decode(_))));

        assert!(decode_page("not base64!", &RowType::default()).is_err());
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let mut body = Vec::new();
        body.write_i32::<LittleEndian>(1).unwrap();
        write_encoding(&mut body, SHORT_ARRAY).unwrap();
        body.write_i32::<LittleEndian>(1).unwrap();
        body.write_u8(0).unwrap();
        body.write_i16::<LittleEndian>(1).unwrap();

        let result = decode_page_bytes(&page(1, 0, &body), &single_column("c0", Type::Varchar));
        assert!(matches!(result, Err(ReferenceError::Decode(_))));
    }
}
