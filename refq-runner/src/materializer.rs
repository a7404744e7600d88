// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Input table materialization
//!
//! The reference engine is asked to create the table itself, so that the
//! metastore entry and the storage directory are its own. A single all-null
//! placeholder row reveals where that directory is (`"$path"`), the row is
//! deleted again, and the generated data is written there as a file the
//! engine picks up on its next scan.

use crate::parquet_writer::write_parquet;
use dashmap::DashMap;
use refq_client::PrestoClient;
use refq_common::constants::{PATH_PSEUDO_COLUMN, TABLE_FILE_EXTENSION};
use refq_common::types::quote_identifier;
use refq_common::{ReferenceError, Result, RowType};
use refq_plan::{RowVector, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

pub struct TableMaterializer {
    client: Arc<PrestoClient>,
    table_format: String,
    /// One lock per table name
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TableMaterializer {
    pub fn new(client: Arc<PrestoClient>, table_format: impl Into<String>) -> Self {
        Self {
            client,
            table_format: table_format.into(),
            locks: DashMap::new(),
        }
    }

    /// Replaces table `name` with one holding exactly the rows of `vectors`.
    /// Returns the path of the written data file.
    pub async fn materialize(&self, name: &str, row_type: &RowType, vectors: &[RowVector]) -> Result<PathBuf> {
        let lock = self.locks.entry(name.to_string()).or_default().clone();
        let _guard = lock.lock().await;

        let directory = self.create_table(name, row_type).await?;
        let file_path = directory.join(format!("{}.{}", name, TABLE_FILE_EXTENSION));

        let num_rows: usize = vectors.iter().map(RowVector::num_rows).sum();
        info!(table = name, rows = num_rows, path = %file_path.display(), "Writing table data");

        let path = file_path.clone();
        let row_type = row_type.clone();
        let vectors = vectors.to_vec();
        tokio::task::spawn_blocking(move || write_parquet(&path, &row_type, &vectors))
            .await
            .map_err(|e| ReferenceError::Storage(format!("Table writer task failed: {}", e)))??;

        Ok(file_path)
    }

    /// Creates an empty table and returns its storage directory.
    async fn create_table(&self, name: &str, row_type: &RowType) -> Result<PathBuf> {
        let table = quote_identifier(name);
        let columns: Vec<String> = row_type.names().iter().map(|n| quote_identifier(n)).collect();
        let nulls: Vec<String> = row_type
            .types()
            .iter()
            .map(|ty| format!("cast(null as {})", ty.to_sql()))
            .collect();

        self.client.execute(&format!("DROP TABLE IF EXISTS {}", table)).await?;
        self.client
            .execute(&format!(
                "CREATE TABLE {}({}) WITH (format = '{}') AS SELECT {}",
                table,
                columns.join(", "),
                self.table_format,
                nulls.join(", ")
            ))
            .await?;

        let results = self
            .client
            .execute(&format!("SELECT {} FROM {}", PATH_PSEUDO_COLUMN, table))
            .await?;
        let location = single_varchar(&results)?;
        let directory = table_directory(&location)?;
        debug!(table = name, directory = %directory.display(), "Resolved table location");

        self.client.execute(&format!("DELETE FROM {}", table)).await?;
        Ok(directory)
    }
}

fn single_varchar(results: &[RowVector]) -> Result<String> {
    let mut values = results
        .iter()
        .filter(|v| v.num_columns() > 0)
        .flat_map(|v| v.column(0).iter());
    match (values.next(), values.next()) {
        (Some(Value::Varchar(text)), None) => Ok(text.clone()),
        (Some(other), None) => Err(ReferenceError::Protocol(format!(
            "Expected a VARCHAR table location, got {}",
            other
        ))),
        _ => Err(ReferenceError::Protocol(
            "Expected exactly one table location row".to_string(),
        )),
    }
}

/// Parent directory of a data file location, given as a `file:` URI or a
/// plain path.
pub fn table_directory(location: &str) -> Result<PathBuf> {
    let file = if location.starts_with('/') {
        PathBuf::from(location)
    } else {
        let url = Url::parse(location)
            .map_err(|e| ReferenceError::Storage(format!("Invalid table location {}: {}", location, e)))?;
        if url.scheme() != "file" {
            return Err(ReferenceError::NotSupported(format!(
                "Table location {} is not on the local filesystem",
                location
            )));
        }
        url.to_file_path()
            .map_err(|_| ReferenceError::Storage(format!("Invalid file location {}", location)))?
    };

    file.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ReferenceError::Storage(format!("Table location {} has no parent directory", location)))
}
