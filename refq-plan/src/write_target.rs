// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Layout metadata of a table write
//!
//! A `TableWrite` plan node carries its target as a trait object so that SQL
//! generation only sees partitioning, bucketing and sort metadata, never a
//! concrete connector type.

use refq_common::Type;
use std::fmt;

/// Bucketed-by column sort spec
#[derive(Debug, Clone, PartialEq)]
pub struct SortingColumn {
    pub column: String,
    pub ascending: bool,
}

impl SortingColumn {
    pub fn new(column: impl Into<String>, ascending: bool) -> Self {
        Self {
            column: column.into(),
            ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketProperty {
    pub bucket_count: u32,
    pub bucketed_by: Vec<String>,
    pub sorted_by: Vec<SortingColumn>,
}

/// Table layout exposed by any connector that can be written to.
pub trait PartitionedWriteTarget: fmt::Debug + Send + Sync {
    /// Partition key column names, in table column order.
    fn partition_keys(&self) -> Vec<String>;

    fn bucket_property(&self) -> Option<&BucketProperty>;

    /// Storage format name, e.g. `ORC` or `PARQUET`.
    fn storage_format(&self) -> &str;

    fn is_partitioned(&self) -> bool {
        !self.partition_keys().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HiveColumn {
    pub name: String,
    pub ty: Type,
    pub is_partition_key: bool,
}

impl HiveColumn {
    pub fn regular(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            is_partition_key: false,
        }
    }

    pub fn partition_key(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            is_partition_key: true,
        }
    }
}

/// Hive-style insert target
#[derive(Debug, Clone, PartialEq)]
pub struct HiveInsertTarget {
    pub input_columns: Vec<HiveColumn>,
    pub bucket_property: Option<BucketProperty>,
    pub format: String,
}

impl HiveInsertTarget {
    pub fn new(input_columns: Vec<HiveColumn>, format: impl Into<String>) -> Self {
        Self {
            input_columns,
            bucket_property: None,
            format: format.into(),
        }
    }

    pub fn with_buckets(mut self, bucket_property: BucketProperty) -> Self {
        self.bucket_property = Some(bucket_property);
        self
    }
}

impl PartitionedWriteTarget for HiveInsertTarget {
    fn partition_keys(&self) -> Vec<String> {
        self.input_columns
            .iter()
            .filter(|c| c.is_partition_key)
            .map(|c| c.name.clone())
            .collect()
    }

    fn bucket_property(&self) -> Option<&BucketProperty> {
        self.bucket_property.as_ref()
    }

    fn storage_format(&self) -> &str {
        &self.format
    }
}
