// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Writes row batches as a Parquet file the reference engine can scan

use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, Date32Array, Decimal128Array, Float32Array, Float64Array,
    Int16Array, Int32Array, Int64Array, Int8Array, ListArray, MapArray, StringArray, StructArray,
    TimestampMillisecondArray,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{DataType, Field, FieldRef, Fields, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use refq_common::{ReferenceError, Result, RowType, Type};
use refq_plan::{RowVector, Value};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

fn storage_error(context: &str, err: impl std::fmt::Display) -> ReferenceError {
    ReferenceError::Storage(format!("{}: {}", context, err))
}

fn mismatch(ty: &Type, value: &Value) -> ReferenceError {
    ReferenceError::InvalidArgument(format!("Value {} does not match column type {}", value, ty))
}

fn map_entry_fields(key: &Type, value: &Type) -> Result<Fields> {
    Ok(Fields::from(vec![
        Field::new("key", data_type(key)?, false),
        Field::new("value", data_type(value)?, true),
    ]))
}

fn list_item_field(element: &Type) -> Result<FieldRef> {
    Ok(Arc::new(Field::new("item", data_type(element)?, true)))
}

fn struct_fields(row_type: &RowType) -> Result<Fields> {
    row_type
        .fields()
        .map(|(name, ty)| Ok(Field::new(name, data_type(ty)?, true)))
        .collect::<Result<Vec<_>>>()
        .map(Fields::from)
}

/// Arrow type a column of `ty` is written as.
pub fn data_type(ty: &Type) -> Result<DataType> {
    let data_type = match ty {
        Type::Boolean => DataType::Boolean,
        Type::TinyInt => DataType::Int8,
        Type::SmallInt => DataType::Int16,
        Type::Integer => DataType::Int32,
        Type::BigInt => DataType::Int64,
        Type::Real => DataType::Float32,
        Type::Double => DataType::Float64,
        Type::Varchar => DataType::Utf8,
        Type::Varbinary => DataType::Binary,
        Type::Timestamp => DataType::Timestamp(TimeUnit::Millisecond, None),
        Type::Date => DataType::Date32,
        Type::Decimal { precision, scale } => DataType::Decimal128(*precision, *scale as i8),
        Type::Array(element) => DataType::List(list_item_field(element)?),
        Type::Map(key, value) => DataType::Map(
            Arc::new(Field::new(
                "entries",
                DataType::Struct(map_entry_fields(key, value)?),
                false,
            )),
            false,
        ),
        Type::Row(row_type) => DataType::Struct(struct_fields(row_type)?),
        other => {
            return Err(ReferenceError::NotSupported(format!(
                "Cannot store {} columns in a Parquet table",
                other
            )))
        }
    };
    Ok(data_type)
}

pub fn schema(row_type: &RowType) -> Result<SchemaRef> {
    Ok(Arc::new(Schema::new(struct_fields(row_type)?)))
}

fn collect_values<'a, T>(
    ty: &Type,
    values: &'a [Value],
    extract: impl Fn(&'a Value) -> Option<T>,
) -> Result<Vec<Option<T>>> {
    values
        .iter()
        .map(|value| match value {
            Value::Null => Ok(None),
            other => extract(other).map(Some).ok_or_else(|| mismatch(ty, other)),
        })
        .collect()
}

fn null_buffer(valid: Vec<bool>) -> Option<NullBuffer> {
    if valid.iter().all(|v| *v) {
        None
    } else {
        Some(NullBuffer::from(valid))
    }
}

/// Builds one arrow array from a column of values.
pub fn to_array(ty: &Type, values: &[Value]) -> Result<ArrayRef> {
    let array: ArrayRef = match ty {
        Type::Boolean => Arc::new(BooleanArray::from(collect_values(ty, values, |v| match v {
            Value::Boolean(b) => Some(*b),
            _ => None,
        })?)),
        Type::TinyInt => Arc::new(Int8Array::from(collect_values(ty, values, |v| match v {
            Value::TinyInt(n) => Some(*n),
            _ => None,
        })?)),
        Type::SmallInt => Arc::new(Int16Array::from(collect_values(ty, values, |v| match v {
            Value::SmallInt(n) => Some(*n),
            _ => None,
        })?)),
        Type::Integer => Arc::new(Int32Array::from(collect_values(ty, values, |v| match v {
            Value::Integer(n) => Some(*n),
            _ => None,
        })?)),
        Type::BigInt => Arc::new(Int64Array::from(collect_values(ty, values, |v| match v {
            Value::BigInt(n) => Some(*n),
            _ => None,
        })?)),
        Type::Real => Arc::new(Float32Array::from(collect_values(ty, values, |v| match v {
            Value::Real(n) => Some(*n),
            _ => None,
        })?)),
        Type::Double => Arc::new(Float64Array::from(collect_values(ty, values, |v| match v {
            Value::Double(n) => Some(*n),
            _ => None,
        })?)),
        Type::Varchar => Arc::new(StringArray::from(collect_values(ty, values, |v| match v {
            Value::Varchar(s) => Some(s.as_str()),
            _ => None,
        })?)),
        Type::Varbinary => Arc::new(BinaryArray::from(collect_values(ty, values, |v| match v {
            Value::Varbinary(bytes) => Some(bytes.as_slice()),
            _ => None,
        })?)),
        Type::Timestamp => Arc::new(TimestampMillisecondArray::from(collect_values(ty, values, |v| match v {
            Value::Timestamp(ms) => Some(*ms),
            _ => None,
        })?)),
        Type::Date => Arc::new(Date32Array::from(collect_values(ty, values, |v| match v {
            Value::Date(days) => Some(*days),
            _ => None,
        })?)),
        Type::Decimal { precision, scale } => {
            let unscaled = collect_values(ty, values, |v| match v {
                Value::Decimal(n) => Some(*n),
                _ => None,
            })?;
            let array = Decimal128Array::from(unscaled)
                .with_precision_and_scale(*precision, *scale as i8)
                .map_err(|e| storage_error("Invalid decimal column", e))?;
            Arc::new(array)
        }
        Type::Array(element) => array_column(ty, element, values)?,
        Type::Map(key, value) => map_column(ty, key, value, values)?,
        Type::Row(row_type) => row_column(ty, row_type, values)?,
        other => {
            return Err(ReferenceError::NotSupported(format!(
                "Cannot store {} columns in a Parquet table",
                other
            )))
        }
    };
    Ok(array)
}

fn array_column(ty: &Type, element: &Type, values: &[Value]) -> Result<ArrayRef> {
    let mut lengths = Vec::with_capacity(values.len());
    let mut valid = Vec::with_capacity(values.len());
    let mut elements = Vec::new();
    for value in values {
        match value {
            Value::Null => {
                lengths.push(0);
                valid.push(false);
            }
            Value::Array(items) => {
                lengths.push(items.len());
                valid.push(true);
                elements.extend(items.iter().cloned());
            }
            other => return Err(mismatch(ty, other)),
        }
    }

    let list = ListArray::try_new(
        list_item_field(element)?,
        OffsetBuffer::from_lengths(lengths),
        to_array(element, &elements)?,
        null_buffer(valid),
    )
    .map_err(|e| storage_error("Invalid array column", e))?;
    Ok(Arc::new(list))
}

fn map_column(ty: &Type, key: &Type, value: &Type, values: &[Value]) -> Result<ArrayRef> {
    let mut lengths = Vec::with_capacity(values.len());
    let mut valid = Vec::with_capacity(values.len());
    let mut keys = Vec::new();
    let mut map_values = Vec::new();
    for cell in values {
        match cell {
            Value::Null => {
                lengths.push(0);
                valid.push(false);
            }
            Value::Map(entries) => {
                lengths.push(entries.len());
                valid.push(true);
                for (k, v) in entries {
                    if k.is_null() {
                        return Err(ReferenceError::InvalidArgument("Map keys cannot be null".to_string()));
                    }
                    keys.push(k.clone());
                    map_values.push(v.clone());
                }
            }
            other => return Err(mismatch(ty, other)),
        }
    }

    let entry_fields = map_entry_fields(key, value)?;
    let entries = StructArray::try_new(
        entry_fields.clone(),
        vec![to_array(key, &keys)?, to_array(value, &map_values)?],
        None,
    )
    .map_err(|e| storage_error("Invalid map entries", e))?;
    let map = MapArray::try_new(
        Arc::new(Field::new("entries", DataType::Struct(entry_fields), false)),
        OffsetBuffer::from_lengths(lengths),
        entries,
        null_buffer(valid),
        false,
    )
    .map_err(|e| storage_error("Invalid map column", e))?;
    Ok(Arc::new(map))
}

fn row_column(ty: &Type, row_type: &RowType, values: &[Value]) -> Result<ArrayRef> {
    let mut children: Vec<Vec<Value>> = vec![Vec::with_capacity(values.len()); row_type.len()];
    let mut valid = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Null => {
                valid.push(false);
                children.iter_mut().for_each(|child| child.push(Value::Null));
            }
            Value::Row(fields) if fields.len() == row_type.len() => {
                valid.push(true);
                for (child, field) in children.iter_mut().zip(fields.iter()) {
                    child.push(field.clone());
                }
            }
            other => return Err(mismatch(ty, other)),
        }
    }

    let arrays = row_type
        .types()
        .iter()
        .zip(children.iter())
        .map(|(child_type, child)| to_array(child_type, child))
        .collect::<Result<Vec<_>>>()?;
    let row = StructArray::try_new(struct_fields(row_type)?, arrays, null_buffer(valid))
        .map_err(|e| storage_error("Invalid row column", e))?;
    Ok(Arc::new(row))
}

pub fn to_record_batch(schema: &SchemaRef, row_type: &RowType, vector: &RowVector) -> Result<RecordBatch> {
    let columns = row_type
        .types()
        .iter()
        .zip(vector.columns().iter())
        .map(|(ty, column)| to_array(ty, column))
        .collect::<Result<Vec<_>>>()?;
    RecordBatch::try_new(schema.clone(), columns).map_err(|e| storage_error("Invalid record batch", e))
}

/// Writes `vectors` to a new Parquet file at `path`, replacing any existing
/// file. Every batch must have `row_type`, which needs at least one column.
pub fn write_parquet(path: &Path, row_type: &RowType, vectors: &[RowVector]) -> Result<()> {
    if row_type.is_empty() {
        return Err(ReferenceError::InvalidArgument(format!(
            "Cannot write {} without columns",
            path.display()
        )));
    }
    if let Some(vector) = vectors.iter().find(|v| v.row_type() != row_type) {
        return Err(ReferenceError::InvalidArgument(format!(
            "Batch of type {} does not match table type {}",
            vector.row_type(),
            row_type
        )));
    }

    let schema = schema(row_type)?;
    let file = File::create(path)?;
    let properties = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(properties))
        .map_err(|e| storage_error("Failed to open Parquet writer", e))?;

    for vector in vectors {
        let batch = to_record_batch(&schema, row_type, vector)?;
        writer
            .write(&batch)
            .map_err(|e| storage_error("Failed to write row group", e))?;
    }
    writer
        .close()
        .map_err(|e| storage_error("Failed to finish Parquet file", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::{Int32Type, Int64Type};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    fn read_back(path: &Path) -> Vec<RecordBatch> {
        let file = File::open(path).unwrap();
        ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap()
            .map(|batch| batch.unwrap())
            .collect()
    }

    #[test]
    fn test_write_scalars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t_0.parquet");
        let row_type = RowType::from_fields(vec![
            ("c0", Type::Integer),
            ("c1", Type::Varchar),
            ("c2", Type::Decimal { precision: 10, scale: 2 }),
        ]);
        let batch = |base: i32| {
            RowVector::new(
                row_type.clone(),
                vec![
                    vec![Value::Integer(base), Value::Null],
                    vec![Value::Varchar(format!("v{}", base)), Value::Null],
                    vec![Value::Decimal(12345), Value::Null],
                ],
            )
            .unwrap()
        };

        write_parquet(&path, &row_type, &[batch(1), batch(2)]).unwrap();

        let batches = read_back(&path);
        let total: usize = batches.iter().map(RecordBatch::num_rows).sum();
        assert_eq!(total, 4);
        let ints: Vec<Option<i32>> = batches
            .iter()
            .flat_map(|b| b.column(0).as_primitive::<Int32Type>().iter().collect::<Vec<_>>())
            .collect();
        assert_eq!(ints, vec![Some(1), None, Some(2), None]);
        assert_eq!(batches[0].schema().field(2).data_type(), &DataType::Decimal128(10, 2));
    }

    #[test]
    fn test_write_nested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested.parquet");
        let row_type = RowType::from_fields(vec![
            ("a", Type::Array(Box::new(Type::BigInt))),
            ("m", Type::Map(Box::new(Type::Varchar), Box::new(Type::Double))),
            ("r", Type::Row(RowType::from_fields(vec![("x", Type::Boolean), ("y", Type::Date)]))),
        ]);
        let vector = RowVector::new(
            row_type.clone(),
            vec![
                vec![
                    Value::Array(vec![Value::BigInt(1), Value::Null, Value::BigInt(3)]),
                    Value::Null,
                    Value::Array(vec![]),
                ],
                vec![
                    Value::Map(vec![(Value::Varchar("k".to_string()), Value::Double(0.5))]),
                    Value::Map(vec![]),
                    Value::Null,
                ],
                vec![
                    Value::Row(vec![Value::Boolean(true), Value::Date(1)]),
                    Value::Null,
                    Value::Row(vec![Value::Null, Value::Null]),
                ],
            ],
        )
        .unwrap();

        write_parquet(&path, &row_type, &[vector]).unwrap();

        let batches = read_back(&path);
        assert_eq!(batches.len(), 1);
        let lists = batches[0].column(0).as_list::<i32>();
        assert_eq!(lists.len(), 3);
        assert!(lists.is_null(1));
        assert_eq!(lists.value(0).as_primitive::<Int64Type>().null_count(), 1);
        assert!(batches[0].column(1).is_null(2));
        assert!(batches[0].column(2).is_null(1));
    }

    #[test]
    fn test_rejects_unstorable_and_mismatched_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.parquet");

        let json = RowType::from_fields(vec![("j", Type::Json)]);
        let vector = RowVector::new(json.clone(), vec![vec![Value::Varchar("{}".to_string())]]).unwrap();
        assert!(matches!(
            write_parquet(&path, &json, &[vector]),
            Err(ReferenceError::NotSupported(_))
        ));

        let ints = RowType::from_fields(vec![("c0", Type::Integer)]);
        let vector = RowVector::new(ints.clone(), vec![vec![Value::BigInt(1)]]).unwrap();
        assert!(matches!(
            write_parquet(&path, &ints, &[vector]),
            Err(ReferenceError::InvalidArgument(_))
        ));

        assert!(write_parquet(&path, &RowType::default(), &[]).is_err());
    }
}
