// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Statement protocol responses

use crate::presto_page::decode_page;
use refq_common::{parse_type, ReferenceError, Result, RowType};
use refq_plan::RowVector;
use serde::{Deserialize, Serialize};

/// Error reported by the reference engine for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryError {
    pub error_code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_name: Option<String>,
    pub message: String,
}

/// Result column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// One reply of the statement protocol. Unknown fields (stats, warnings,
/// update type) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Column>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_data: Option<Vec<String>>,
}

impl ServerResponse {
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| ReferenceError::Protocol(format!("Malformed statement response: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ReferenceError::Protocol(format!("Cannot serialize response: {}", e)))
    }

    /// Response of a query that is still running.
    pub fn running(id: impl Into<String>, next_uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            next_uri: Some(next_uri.into()),
            ..Default::default()
        }
    }

    /// Final response of a query.
    pub fn finished(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn failed(id: impl Into<String>, error_code: i64, error_name: &str, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            error: Some(QueryError {
                error_code,
                error_name: Some(error_name.to_string()),
                message: message.into(),
            }),
            ..Default::default()
        }
    }

    /// Attaches result columns and base64 pages.
    pub fn with_data(mut self, row_type: &RowType, pages: Vec<String>) -> Self {
        self.columns = Some(
            row_type
                .fields()
                .map(|(name, ty)| Column {
                    name: name.to_string(),
                    type_name: ty.to_sql(),
                })
                .collect(),
        );
        self.binary_data = Some(pages);
        self
    }

    pub fn check_error(&self) -> Result<()> {
        match &self.error {
            Some(error) => Err(ReferenceError::QueryFailed {
                code: error.error_code,
                name: error.error_name.clone(),
                message: error.message.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.next_uri.is_none()
    }

    /// Row type rebuilt from the `columns` metadata.
    pub fn row_type(&self) -> Result<RowType> {
        let columns = self.columns.as_deref().unwrap_or_default();
        let mut names = Vec::with_capacity(columns.len());
        let mut types = Vec::with_capacity(columns.len());
        for column in columns {
            names.push(column.name.clone());
            types.push(parse_type(&column.type_name)?);
        }
        Ok(RowType::new(names, types))
    }

    /// Decodes every page carried by this response.
    pub fn query_results(&self) -> Result<Vec<RowVector>> {
        let pages = match &self.binary_data {
            Some(pages) if !pages.is_empty() => pages,
            _ => return Ok(Vec::new()),
        };

        if self.columns.is_none() {
            return Err(ReferenceError::Protocol(format!(
                "Query {} returned data without column metadata",
                self.id
            )));
        }
        let row_type = self.row_type()?;
        pages.iter().map(|page| decode_page(page, &row_type)).collect()
    }
}
