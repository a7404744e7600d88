// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Cell values and columnar row batches

use refq_common::{ReferenceError, Result, RowType, Type};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Cell value
///
/// Temporal and decimal values keep their physical representation: timestamps
/// are milliseconds since the epoch, dates are days since the epoch and
/// decimals are unscaled integers whose scale comes from the column type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    HugeInt(i128),
    Real(f32),
    Double(f64),
    Varchar(String),
    Varbinary(Vec<u8>),
    Timestamp(i64),
    Date(i32),
    Decimal(i128),
    IntervalDayTime(i64),
    IntervalYearMonth(i32),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Row(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::TinyInt(_) => 2,
            Value::SmallInt(_) => 3,
            Value::Integer(_) => 4,
            Value::BigInt(_) => 5,
            Value::HugeInt(_) => 6,
            Value::Real(_) => 7,
            Value::Double(_) => 8,
            Value::Varchar(_) => 9,
            Value::Varbinary(_) => 10,
            Value::Timestamp(_) => 11,
            Value::Date(_) => 12,
            Value::Decimal(_) => 13,
            Value::IntervalDayTime(_) => 14,
            Value::IntervalYearMonth(_) => 15,
            Value::Array(_) => 16,
            Value::Map(_) => 17,
            Value::Row(_) => 18,
        }
    }
}

// Total order, so NaN equals NaN and result multisets can be sorted and compared.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (TinyInt(a), TinyInt(b)) => a.cmp(b),
            (SmallInt(a), SmallInt(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (BigInt(a), BigInt(b)) => a.cmp(b),
            (HugeInt(a), HugeInt(b)) => a.cmp(b),
            (Real(a), Real(b)) => a.total_cmp(b),
            (Double(a), Double(b)) => a.total_cmp(b),
            (Varchar(a), Varchar(b)) => a.cmp(b),
            (Varbinary(a), Varbinary(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (Decimal(a), Decimal(b)) => a.cmp(b),
            (IntervalDayTime(a), IntervalDayTime(b)) => a.cmp(b),
            (IntervalYearMonth(a), IntervalYearMonth(b)) => a.cmp(b),
            (Array(a), Array(b)) => a.cmp(b),
            (Map(a), Map(b)) => a.cmp(b),
            (Row(a), Row(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", value)?;
            }
            Ok(())
        }

        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::TinyInt(v) => write!(f, "{}", v),
            Value::SmallInt(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::HugeInt(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Varchar(v) => f.write_str(v),
            Value::Varbinary(bytes) => {
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::Timestamp(v) => write!(f, "{}ms", v),
            Value::Date(v) => write!(f, "{}d", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::IntervalDayTime(v) => write!(f, "{}ms", v),
            Value::IntervalYearMonth(v) => write!(f, "{}mo", v),
            Value::Array(values) => {
                f.write_str("[")?;
                join(f, values)?;
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                f.write_str("}")
            }
            Value::Row(values) => {
                f.write_str("{")?;
                join(f, values)?;
                f.write_str("}")
            }
        }
    }
}

/// Row of data
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }
}

/// Columnar batch of rows. May have zero columns and a non-zero row count.
#[derive(Debug, Clone, PartialEq)]
pub struct RowVector {
    row_type: RowType,
    num_rows: usize,
    columns: Vec<Vec<Value>>,
}

impl RowVector {
    /// Builds a batch from one value vector per column. The row count is the
    /// length of the columns, or zero when there are none.
    pub fn new(row_type: RowType, columns: Vec<Vec<Value>>) -> Result<Self> {
        let num_rows = columns.first().map(Vec::len).unwrap_or(0);
        Self::with_num_rows(row_type, num_rows, columns)
    }

    pub fn with_num_rows(row_type: RowType, num_rows: usize, columns: Vec<Vec<Value>>) -> Result<Self> {
        if columns.len() != row_type.len() {
            return Err(ReferenceError::InvalidArgument(format!(
                "row type {} has {} columns, got {}",
                row_type,
                row_type.len(),
                columns.len()
            )));
        }
        for (i, column) in columns.iter().enumerate() {
            if column.len() != num_rows {
                return Err(ReferenceError::InvalidArgument(format!(
                    "Column {} has {} rows, expected {}",
                    i,
                    column.len(),
                    num_rows
                )));
            }
        }
        Ok(Self {
            row_type,
            num_rows,
            columns,
        })
    }

    pub fn from_rows(row_type: RowType, rows: &[Row]) -> Result<Self> {
        let mut columns: Vec<Vec<Value>> = (0..row_type.len())
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for (i, row) in rows.iter().enumerate() {
            if row.values.len() != row_type.len() {
                return Err(ReferenceError::InvalidArgument(format!(
                    "Row {} has {} values, expected {}",
                    i,
                    row.values.len(),
                    row_type.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(row.values.iter()) {
                column.push(value.clone());
            }
        }
        Self::with_num_rows(row_type, rows.len(), columns)
    }

    pub fn empty(row_type: RowType) -> Self {
        let columns = (0..row_type.len()).map(|_| Vec::new()).collect();
        Self {
            row_type,
            num_rows: 0,
            columns,
        }
    }

    pub fn row_type(&self) -> &RowType {
        &self.row_type
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Vec<Value>] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> &[Value] {
        &self.columns[index]
    }

    pub fn value_at(&self, row: usize, column: usize) -> &Value {
        &self.columns[column][row]
    }

    /// Transposes the batch into rows.
    pub fn rows(&self) -> Vec<Row> {
        (0..self.num_rows)
            .map(|row| Row::new(self.columns.iter().map(|column| column[row].clone()).collect()))
            .collect()
    }
}

/// Flattens batches into a sorted multiset of rows.
pub fn materialize(vectors: &[RowVector]) -> Vec<Row> {
    let mut rows: Vec<Row> = vectors.iter().flat_map(RowVector::rows).collect();
    rows.sort();
    rows
}

/// Single all-null BOOLEAN column with as many rows as `vectors` together.
/// Stands in for zero-column input, which cannot be written as a table.
pub fn null_rows(vectors: &[RowVector], column_name: &str) -> RowVector {
    let num_rows = vectors.iter().map(RowVector::num_rows).sum();
    RowVector {
        row_type: RowType::from_fields(vec![(column_name.to_string(), Type::Boolean)]),
        num_rows,
        columns: vec![vec![Value::Null; num_rows]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_columns() -> RowType {
        RowType::from_fields(vec![("c0", Type::Integer), ("c1", Type::Varchar)])
    }

    #[test]
    fn test_new_checks_column_lengths() {
        let result = RowVector::new(
            two_columns(),
            vec![
                vec![Value::Integer(1), Value::Integer(2)],
                vec![Value::Varchar("a".to_string())],
            ],
        );
        assert!(result.is_err());

        let result = RowVector::new(two_columns(), vec![vec![Value::Integer(1)]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rows_transposes_columns() {
        let vector = RowVector::new(
            two_columns(),
            vec![
                vec![Value::Integer(1), Value::Null],
                vec![Value::Varchar("a".to_string()), Value::Varchar("b".to_string())],
            ],
        )
        .unwrap();

        let rows = vector.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].values, vec![Value::Null, Value::Varchar("b".to_string())]);
        assert_eq!(RowVector::from_rows(two_columns(), &rows).unwrap(), vector);
    }

    #[test]
    fn test_materialize_sorts_across_batches() {
        let row_type = RowType::from_fields(vec![("x", Type::Double)]);
        let first = RowVector::new(row_type.clone(), vec![vec![Value::Double(f64::NAN), Value::Double(2.0)]]).unwrap();
        let second = RowVector::new(row_type, vec![vec![Value::Null, Value::Double(-1.0)]]).unwrap();

        let rows = materialize(&[first, second]);
        let values: Vec<Value> = rows.into_iter().map(|r| r.values[0].clone()).collect();
        assert_eq!(values[0], Value::Null);
        assert_eq!(values[1], Value::Double(-1.0));
        assert_eq!(values[2], Value::Double(2.0));
        assert_eq!(values[3], Value::Double(f64::NAN));
    }

    #[test]
    fn test_null_rows_covers_zero_column_input() {
        let empty = RowVector::with_num_rows(RowType::default(), 3, vec![]).unwrap();
        assert_eq!(empty.num_columns(), 0);
        assert_eq!(empty.num_rows(), 3);

        let nulls = null_rows(&[empty.clone(), empty], "t_0x");
        assert_eq!(nulls.num_rows(), 6);
        assert_eq!(nulls.row_type().name_of(0), "t_0x");
        assert!(nulls.column(0).iter().all(Value::is_null));
    }
}
