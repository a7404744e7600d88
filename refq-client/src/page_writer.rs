// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Presto SerializedPage encoder
//!
//! Produces uncompressed pages in the layout `presto_page` decodes. Used by
//! mock engines and test fixtures; the reference engine itself is the
//! producer in production.

use crate::presto_page::*;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use byteorder::{LittleEndian, WriteBytesExt};
use refq_common::{ReferenceError, Result, Type};
use refq_plan::{RowVector, Value};

/// Serializes a batch as one page.
pub fn encode_page(vector: &RowVector) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    body.write_i32::<LittleEndian>(to_i32(vector.num_columns())?)?;
    for (column, ty) in vector.columns().iter().zip(vector.row_type().types()) {
        write_block(&mut body, ty, column)?;
    }

    let mut page = Vec::with_capacity(body.len() + 21);
    page.write_i32::<LittleEndian>(to_i32(vector.num_rows())?)?;
    page.write_u8(0)?;
    page.write_i32::<LittleEndian>(to_i32(body.len())?)?;
    page.write_i32::<LittleEndian>(to_i32(body.len())?)?;
    page.write_i64::<LittleEndian>(0)?;
    page.extend_from_slice(&body);
    Ok(page)
}

/// Serializes a batch as one base64 `binaryData` entry.
pub fn encode_page_base64(vector: &RowVector) -> Result<String> {
    Ok(BASE64.encode(encode_page(vector)?))
}

fn to_i32(value: usize) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| ReferenceError::InvalidArgument(format!("{} does not fit a page field", value)))
}

pub(crate) fn write_encoding(buf: &mut Vec<u8>, name: &str) -> Result<()> {
    buf.write_i32::<LittleEndian>(to_i32(name.len())?)?;
    buf.extend_from_slice(name.as_bytes());
    Ok(())
}

fn write_nulls(buf: &mut Vec<u8>, values: &[Value]) -> Result<()> {
    if !values.iter().any(Value::is_null) {
        buf.write_u8(0)?;
        return Ok(());
    }

    buf.write_u8(1)?;
    for chunk in values.chunks(8) {
        let mut byte = 0u8;
        for (i, value) in chunk.iter().enumerate() {
            if value.is_null() {
                byte |= 0x80 >> i;
            }
        }
        buf.write_u8(byte)?;
    }
    Ok(())
}

fn write_offsets(buf: &mut Vec<u8>, offsets: &[usize]) -> Result<()> {
    for &offset in offsets {
        buf.write_i32::<LittleEndian>(to_i32(offset)?)?;
    }
    Ok(())
}

fn mismatch(value: &Value, ty: &Type) -> ReferenceError {
    ReferenceError::InvalidArgument(format!("Value {:?} does not match type {}", value, ty))
}

fn write_fixed_width(
    buf: &mut Vec<u8>,
    encoding: &str,
    values: &[Value],
    mut write_value: impl FnMut(&mut Vec<u8>, &Value) -> Result<()>,
) -> Result<()> {
    write_encoding(buf, encoding)?;
    buf.write_i32::<LittleEndian>(to_i32(values.len())?)?;
    write_nulls(buf, values)?;
    for value in values.iter().filter(|v| !v.is_null()) {
        write_value(buf, value)?;
    }
    Ok(())
}

fn write_int128(buf: &mut Vec<u8>, value: i128) -> Result<()> {
    if value == i128::MIN {
        return Err(ReferenceError::InvalidArgument(
            "i128::MIN has no sign-magnitude encoding".to_string(),
        ));
    }
    let magnitude = value.unsigned_abs();
    let low = magnitude as u64 as i64;
    let mut high = (magnitude >> 64) as i64;
    if value < 0 {
        high |= i64::MIN;
    }
    buf.write_i64::<LittleEndian>(low)?;
    buf.write_i64::<LittleEndian>(high)?;
    Ok(())
}

/// Writes `values` as one block of type `ty`, including its encoding name.
pub(crate) fn write_block(buf: &mut Vec<u8>, ty: &Type, values: &[Value]) -> Result<()> {
    match ty {
        Type::Boolean | Type::TinyInt | Type::Unknown => {
            write_fixed_width(buf, BYTE_ARRAY, values, |buf, value| {
                match (ty, value) {
                    (Type::Boolean, Value::Boolean(v)) => buf.write_i8(*v as i8)?,
                    (Type::TinyInt, Value::TinyInt(v)) => buf.write_i8(*v)?,
                    _ => return Err(mismatch(value, ty)),
                }
                Ok(())
            })
        }
        Type::SmallInt => write_fixed_width(buf, SHORT_ARRAY, values, |buf, value| match value {
            Value::SmallInt(v) => Ok(buf.write_i16::<LittleEndian>(*v)?),
            _ => Err(mismatch(value, ty)),
        }),
        Type::Integer | Type::Date | Type::Real | Type::IntervalYearMonth => {
            write_fixed_width(buf, INT_ARRAY, values, |buf, value| {
                let raw = match (ty, value) {
                    (Type::Integer, Value::Integer(v)) => *v,
                    (Type::Date, Value::Date(v)) => *v,
                    (Type::Real, Value::Real(v)) => v.to_bits() as i32,
                    (Type::IntervalYearMonth, Value::IntervalYearMonth(v)) => *v,
                    _ => return Err(mismatch(value, ty)),
                };
                Ok(buf.write_i32::<LittleEndian>(raw)?)
            })
        }
        Type::Decimal { .. } if ty.is_short_decimal() => {
            write_fixed_width(buf, LONG_ARRAY, values, |buf, value| match value {
                Value::Decimal(v) => {
                    let raw = i64::try_from(*v).map_err(|_| mismatch(value, ty))?;
                    Ok(buf.write_i64::<LittleEndian>(raw)?)
                }
                _ => Err(mismatch(value, ty)),
            })
        }
        Type::BigInt | Type::Double | Type::Timestamp | Type::IntervalDayTime => {
            write_fixed_width(buf, LONG_ARRAY, values, |buf, value| {
                let raw = match (ty, value) {
                    (Type::BigInt, Value::BigInt(v)) => *v,
                    (Type::Double, Value::Double(v)) => v.to_bits() as i64,
                    (Type::Timestamp, Value::Timestamp(v)) => *v,
                    (Type::IntervalDayTime, Value::IntervalDayTime(v)) => *v,
                    _ => return Err(mismatch(value, ty)),
                };
                Ok(buf.write_i64::<LittleEndian>(raw)?)
            })
        }
        Type::Decimal { .. } | Type::HugeInt | Type::Uuid | Type::IpAddress => {
            write_fixed_width(buf, INT128_ARRAY, values, |buf, value| match value {
                Value::Decimal(v) | Value::HugeInt(v) => write_int128(buf, *v),
                _ => Err(mismatch(value, ty)),
            })
        }
        Type::Varchar
        | Type::Json
        | Type::Varbinary
        | Type::HyperLogLog
        | Type::TDigest(_)
        | Type::IpPrefix => write_variable_width(buf, ty, values),
        Type::Array(element) => write_array(buf, element, values),
        Type::Map(key, value) => write_map(buf, key, value, values),
        Type::Row(row_type) => write_row(buf, row_type.types(), values),
        Type::BingTile => Err(ReferenceError::NotSupported(format!(
            "Cannot encode values of type {}",
            ty
        ))),
    }
}

fn write_variable_width(buf: &mut Vec<u8>, ty: &Type, values: &[Value]) -> Result<()> {
    let mut data = Vec::new();
    let mut end_offsets = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Null => {}
            Value::Varchar(s) => data.extend_from_slice(s.as_bytes()),
            Value::Varbinary(bytes) => data.extend_from_slice(bytes),
            _ => return Err(mismatch(value, ty)),
        }
        end_offsets.push(data.len());
    }

    write_encoding(buf, VARIABLE_WIDTH)?;
    buf.write_i32::<LittleEndian>(to_i32(values.len())?)?;
    write_offsets(buf, &end_offsets)?;
    write_nulls(buf, values)?;
    buf.write_i32::<LittleEndian>(to_i32(data.len())?)?;
    buf.extend_from_slice(&data);
    Ok(())
}

fn write_array(buf: &mut Vec<u8>, element_type: &Type, values: &[Value]) -> Result<()> {
    let mut elements = Vec::new();
    let mut offsets = vec![0usize];
    for value in values {
        match value {
            Value::Null => {}
            Value::Array(items) => elements.extend(items.iter().cloned()),
            _ => return Err(mismatch(value, &Type::Array(Box::new(element_type.clone())))),
        }
        offsets.push(elements.len());
    }

    write_encoding(buf, ARRAY)?;
    write_block(buf, element_type, &elements)?;
    buf.write_i32::<LittleEndian>(to_i32(values.len())?)?;
    write_offsets(buf, &offsets)?;
    write_nulls(buf, values)
}

fn write_map(buf: &mut Vec<u8>, key_type: &Type, value_type: &Type, values: &[Value]) -> Result<()> {
    let mut keys = Vec::new();
    let mut items = Vec::new();
    let mut offsets = vec![0usize];
    for value in values {
        match value {
            Value::Null => {}
            Value::Map(entries) => {
                for (k, v) in entries {
                    keys.push(k.clone());
                    items.push(v.clone());
                }
            }
            _ => {
                let map_type = Type::Map(Box::new(key_type.clone()), Box::new(value_type.clone()));
                return Err(mismatch(value, &map_type));
            }
        }
        offsets.push(keys.len());
    }

    write_encoding(buf, MAP)?;
    write_block(buf, key_type, &keys)?;
    write_block(buf, value_type, &items)?;
    // No hash table
    buf.write_i32::<LittleEndian>(-1)?;
    buf.write_i32::<LittleEndian>(to_i32(values.len())?)?;
    write_offsets(buf, &offsets)?;
    write_nulls(buf, values)
}

fn write_row(buf: &mut Vec<u8>, field_types: &[Type], values: &[Value]) -> Result<()> {
    let mut fields: Vec<Vec<Value>> = vec![Vec::new(); field_types.len()];
    let mut offsets = vec![0usize];
    let mut non_null = 0usize;
    for value in values {
        match value {
            Value::Null => {}
            Value::Row(row) if row.len() == field_types.len() => {
                for (field, item) in fields.iter_mut().zip(row) {
                    field.push(item.clone());
                }
                non_null += 1;
            }
            _ => {
                return Err(ReferenceError::InvalidArgument(format!(
                    "Value {:?} is not a row of {} fields",
                    value,
                    field_types.len()
                )))
            }
        }
        offsets.push(non_null);
    }

    write_encoding(buf, ROW)?;
    buf.write_i32::<LittleEndian>(to_i32(field_types.len())?)?;
    for (ty, field) in field_types.iter().zip(&fields) {
        write_block(buf, ty, field)?;
    }
    buf.write_i32::<LittleEndian>(to_i32(values.len())?)?;
    write_offsets(buf, &offsets)?;
    write_nulls(buf, values)
}
