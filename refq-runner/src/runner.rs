// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Runs plans against the reference engine

use crate::materializer::TableMaterializer;
use crate::result::{ReferenceQueryErrorCode, ReferenceQueryResult};
use refq_client::{PrestoClient, SessionProperties, StatementTransport};
use refq_common::constants::TABLE_WRITE_TARGET;
use refq_common::{Config, Result, Type};
use refq_plan::{materialize, null_rows, FunctionSignature, PlanNode, Row, RowVector, TypedExpr};
use refq_sql::{support, DataSpec};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Compiles plans, materializes their inputs and runs them on one reference
/// coordinator.
pub struct ReferenceQueryRunner {
    client: Arc<PrestoClient>,
    materializer: TableMaterializer,
}

impl ReferenceQueryRunner {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_client(Arc::new(PrestoClient::new(config)?), config))
    }

    /// Runner over a caller-provided transport, e.g. a mock engine.
    pub fn with_transport(config: &Config, transport: Arc<dyn StatementTransport>) -> Self {
        Self::with_client(Arc::new(PrestoClient::with_transport(config, transport)), config)
    }

    pub fn with_client(client: Arc<PrestoClient>, config: &Config) -> Self {
        let materializer = TableMaterializer::new(client.clone(), config.table_format.clone());
        Self { client, materializer }
    }

    pub fn supported_scalar_types(&self) -> &'static [Type] {
        support::supported_scalar_types()
    }

    pub fn aggregation_function_data_specs(&self) -> &'static HashMap<&'static str, DataSpec> {
        support::aggregation_function_data_specs()
    }

    pub fn is_constant_expr_supported(&self, expr: &TypedExpr) -> bool {
        support::is_constant_expr_supported(expr)
    }

    pub fn is_supported(&self, signature: &FunctionSignature) -> bool {
        support::is_supported_signature(signature)
    }

    /// Results come back as row batches, not only as materialized rows.
    pub fn supports_vector_results(&self) -> bool {
        true
    }

    pub fn to_sql(&self, plan: &PlanNode) -> Option<String> {
        refq_sql::to_sql(plan)
    }

    /// Runs `sql` as is, without materializing anything.
    pub async fn execute_sql(&self, sql: &str) -> Result<Vec<RowVector>> {
        self.client.execute(sql).await
    }

    pub async fn execute_sql_with_session(&self, sql: &str, session: &SessionProperties) -> Result<Vec<RowVector>> {
        self.client.execute_with_session(sql, session).await
    }

    /// Runs `plan` and returns its result batches.
    ///
    /// Plans that cannot be compiled are reported as unsupported without
    /// contacting the engine. Any failure after that is reported as a failed
    /// reference query, except for an unreachable engine, which is returned
    /// as an error.
    pub async fn execute(&self, plan: &PlanNode) -> Result<ReferenceQueryResult<Vec<RowVector>>> {
        let sql = match self.to_sql(plan) {
            Some(sql) => sql,
            None => {
                info!(node = plan.name(), node_id = plan.id(), "Query not supported by the reference engine");
                return Ok((None, ReferenceQueryErrorCode::ReferenceQueryUnsupported));
            }
        };

        match self.run(plan, &sql).await {
            Ok(results) => Ok((Some(results), ReferenceQueryErrorCode::Success)),
            Err(e) if e.is_connectivity_failure() => Err(e),
            Err(e) => {
                warn!(sql = %sql, error = %e, "Query failed in the reference engine");
                Ok((None, ReferenceQueryErrorCode::ReferenceQueryFail))
            }
        }
    }

    /// Like `execute`, with the results flattened into a sorted multiset of
    /// rows.
    pub async fn execute_rows(&self, plan: &PlanNode) -> Result<ReferenceQueryResult<Vec<Row>>> {
        let (results, code) = self.execute(plan).await?;
        Ok((results.map(|batches| materialize(&batches)), code))
    }

    async fn run(&self, plan: &PlanNode, sql: &str) -> Result<Vec<RowVector>> {
        for (table, values) in plan.tables() {
            if values.row_type.is_empty() {
                let placeholder = null_rows(&values.values, &format!("{}x", table));
                let row_type = placeholder.row_type().clone();
                self.materializer.materialize(&table, &row_type, &[placeholder]).await?;
            } else {
                self.materializer.materialize(&table, &values.row_type, &values.values).await?;
            }
        }

        if matches!(plan, PlanNode::TableWrite(_)) {
            self.client
                .execute(&format!("DROP TABLE IF EXISTS {}", TABLE_WRITE_TARGET))
                .await?;
        }

        self.client.execute(sql).await
    }
}
