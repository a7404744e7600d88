// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Native type system
//!
//! Types mirror what the reference engine can describe in its result
//! metadata. `Type::to_sql` renders the reference dialect's spelling, which
//! is also what `type_parser::parse_type` accepts back.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column/value type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    /// 128-bit integer, not a native type of the reference engine
    HugeInt,
    Real,
    Double,
    Varchar,
    Varbinary,
    /// Milliseconds since the epoch
    Timestamp,
    /// Days since the epoch
    Date,
    Decimal { precision: u8, scale: u8 },
    IntervalDayTime,
    IntervalYearMonth,
    Json,
    Uuid,
    IpAddress,
    IpPrefix,
    HyperLogLog,
    TDigest(Box<Type>),
    BingTile,
    /// Type of an untyped NULL
    Unknown,
    Array(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Row(RowType),
}

/// Ordered list of named fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowType {
    names: Vec<String>,
    types: Vec<Type>,
}

impl RowType {
    /// Panics when `names` and `types` differ in length.
    pub fn new(names: Vec<String>, types: Vec<Type>) -> Self {
        assert_eq!(
            names.len(),
            types.len(),
            "row type needs one name per field type"
        );
        Self { names, types }
    }

    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Type)>,
        S: Into<String>,
    {
        let (names, types) = fields
            .into_iter()
            .map(|(name, ty)| (name.into(), ty))
            .unzip();
        Self { names, types }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn name_of(&self, index: usize) -> &str {
        &self.names[index]
    }

    pub fn child_at(&self, index: usize) -> &Type {
        &self.types[index]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.names.iter().map(String::as_str).zip(self.types.iter())
    }

    /// Appends `other`'s fields after this row type's fields.
    pub fn concat(&self, other: &RowType) -> RowType {
        let mut names = self.names.clone();
        let mut types = self.types.clone();
        names.extend(other.names.iter().cloned());
        types.extend(other.types.iter().cloned());
        RowType { names, types }
    }

    pub fn to_sql(&self) -> String {
        let fields: Vec<String> = self
            .fields()
            .map(|(name, ty)| {
                if name.is_empty() {
                    ty.to_sql()
                } else {
                    format!("{} {}", quote_identifier(name), ty.to_sql())
                }
            })
            .collect();
        format!("ROW({})", fields.join(", "))
    }
}

impl Type {
    /// Scalar types, including the custom ones carried in scalar storage.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Type::Array(_) | Type::Map(_, _) | Type::Row(_))
    }

    /// Decimals that fit in 64 bits on the wire.
    pub fn is_short_decimal(&self) -> bool {
        matches!(self, Type::Decimal { precision, .. } if *precision <= 18)
    }

    /// Lowercase name without parameters, as used in function signatures.
    pub fn base_name(&self) -> &'static str {
        match self {
            Type::Boolean => "boolean",
            Type::TinyInt => "tinyint",
            Type::SmallInt => "smallint",
            Type::Integer => "integer",
            Type::BigInt => "bigint",
            Type::HugeInt => "hugeint",
            Type::Real => "real",
            Type::Double => "double",
            Type::Varchar => "varchar",
            Type::Varbinary => "varbinary",
            Type::Timestamp => "timestamp",
            Type::Date => "date",
            Type::Decimal { .. } => "decimal",
            Type::IntervalDayTime => "interval day to second",
            Type::IntervalYearMonth => "interval year to month",
            Type::Json => "json",
            Type::Uuid => "uuid",
            Type::IpAddress => "ipaddress",
            Type::IpPrefix => "ipprefix",
            Type::HyperLogLog => "hyperloglog",
            Type::TDigest(_) => "tdigest",
            Type::BingTile => "bingtile",
            Type::Unknown => "unknown",
            Type::Array(_) => "array",
            Type::Map(_, _) => "map",
            Type::Row(_) => "row",
        }
    }

    pub fn children(&self) -> Vec<&Type> {
        match self {
            Type::TDigest(element) | Type::Array(element) => vec![element.as_ref()],
            Type::Map(key, value) => vec![key.as_ref(), value.as_ref()],
            Type::Row(row) => row.types().iter().collect(),
            _ => Vec::new(),
        }
    }

    /// True if this type or any nested type satisfies `predicate`.
    pub fn any(&self, predicate: &dyn Fn(&Type) -> bool) -> bool {
        predicate(self) || self.children().into_iter().any(|child| child.any(predicate))
    }

    /// Type text in the reference dialect
    pub fn to_sql(&self) -> String {
        match self {
            Type::Decimal { precision, scale } => format!("DECIMAL({}, {})", precision, scale),
            Type::TDigest(element) => format!("TDIGEST({})", element.to_sql()),
            Type::Array(element) => format!("ARRAY({})", element.to_sql()),
            Type::Map(key, value) => format!("MAP({}, {})", key.to_sql(), value.to_sql()),
            Type::Row(row) => row.to_sql(),
            other => other.base_name().to_uppercase(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

const RESERVED_WORDS: &[&str] = &[
    "all", "and", "as", "between", "by", "case", "cast", "create", "cross", "delete", "distinct",
    "drop", "else", "end", "exists", "false", "from", "full", "group", "having", "in", "inner",
    "is", "join", "left", "like", "limit", "not", "null", "on", "or", "order", "outer", "over",
    "partition", "range", "right", "row", "rows", "select", "table", "then", "true", "union",
    "values", "when", "where", "with",
];

/// Returns `name` as-is when it is a plain lowercase identifier, otherwise
/// double-quoted with embedded quotes doubled.
pub fn quote_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) => {
            (first.is_ascii_lowercase() || first == '_')
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        None => false,
    };

    if plain && !RESERVED_WORDS.contains(&name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_to_sql() {
        assert_eq!(Type::BigInt.to_sql(), "BIGINT");
        assert_eq!(Type::IntervalDayTime.to_sql(), "INTERVAL DAY TO SECOND");
        assert_eq!(Type::Decimal { precision: 10, scale: 2 }.to_sql(), "DECIMAL(10, 2)");
    }

    #[test]
    fn test_nested_to_sql() {
        let row = RowType::from_fields(vec![
            ("a", Type::Array(Box::new(Type::Integer))),
            ("Mixed Case", Type::Map(Box::new(Type::Varchar), Box::new(Type::Double))),
        ]);
        assert_eq!(
            Type::Row(row).to_sql(),
            "ROW(a ARRAY(INTEGER), \"Mixed Case\" MAP(VARCHAR, DOUBLE))"
        );
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("c0"), "c0");
        assert_eq!(quote_identifier("row_number"), "row_number");
        assert_eq!(quote_identifier("C0"), "\"C0\"");
        assert_eq!(quote_identifier("order"), "\"order\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_identifier(""), "\"\"");
    }

    #[test]
    fn test_any_searches_nested_types() {
        let ty = Type::Array(Box::new(Type::Map(
            Box::new(Type::Varchar),
            Box::new(Type::Json),
        )));
        assert!(ty.any(&|t| matches!(t, Type::Json)));
        assert!(!ty.any(&|t| matches!(t, Type::Uuid)));
        assert!(!ty.is_primitive());
    }

    #[test]
    #[should_panic(expected = "one name per field type")]
    fn test_row_type_length_mismatch_panics() {
        RowType::new(vec!["a".to_string()], vec![]);
    }
}
