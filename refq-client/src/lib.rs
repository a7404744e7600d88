// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Reference engine client
//!
//! Runs SQL through the reference engine's asynchronous statement protocol:
//! the statement is POSTed, then `nextUri` is followed until a response
//! without one arrives. Every response may carry base64 result pages, which
//! are decoded into `RowVector`s and accumulated in arrival order.

pub mod presto_page;
pub mod page_writer;
pub mod response;
pub mod transport;
pub mod mock;

pub use mock::MockTransport;
pub use page_writer::{encode_page, encode_page_base64};
pub use presto_page::{decode_page, decode_page_bytes};
pub use response::ServerResponse;
pub use transport::{HttpTransport, Method, StatementRequest, StatementTransport};

use refq_common::constants::*;
use refq_common::{Config, Result};
use refq_plan::RowVector;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Session properties sent with a statement
pub type SessionProperties = BTreeMap<String, String>;

/// `k1=v1,k2=v2`, or `None` when there is nothing to send.
fn session_header(properties: &SessionProperties) -> Option<String> {
    if properties.is_empty() {
        return None;
    }
    Some(
        properties
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(","),
    )
}

/// Client for one reference coordinator
pub struct PrestoClient {
    coordinator_uri: String,
    user: String,
    catalog: String,
    schema: String,
    session_properties: SessionProperties,
    transport: Arc<dyn StatementTransport>,
}

impl PrestoClient {
    /// Create a client that talks HTTP to `config.coordinator_uri`.
    pub fn new(config: &Config) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(config.timeout())?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: &Config, transport: Arc<dyn StatementTransport>) -> Self {
        Self {
            coordinator_uri: config.coordinator_uri.trim_end_matches('/').to_string(),
            user: config.user.clone(),
            catalog: config.catalog.clone(),
            schema: config.schema.clone(),
            session_properties: config.session_properties.clone(),
            transport,
        }
    }

    pub fn coordinator_uri(&self) -> &str {
        &self.coordinator_uri
    }

    /// Run `sql` with the configured session properties.
    pub async fn execute(&self, sql: &str) -> Result<Vec<RowVector>> {
        self.execute_with_session(sql, &SessionProperties::new()).await
    }

    /// Run `sql` with `session` layered over the configured session
    /// properties. Fails on the first response that carries an error, without
    /// following its `nextUri`.
    pub async fn execute_with_session(&self, sql: &str, session: &SessionProperties) -> Result<Vec<RowVector>> {
        info!(sql, "Execute reference sql");

        let mut properties = self.session_properties.clone();
        properties.extend(session.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut response = ServerResponse::parse(&self.start_query(sql, &properties).await?)?;
        response.check_error()?;

        let mut results = Vec::new();
        let mut polls = 0usize;
        loop {
            results.extend(response.query_results()?);

            let next_uri = match response.next_uri.take() {
                Some(uri) => uri,
                None => break,
            };

            polls += 1;
            response = ServerResponse::parse(&self.fetch_next(&next_uri).await?)?;
            response.check_error()?;
        }

        debug!(
            query_id = %response.id,
            "Query finished after {} continuation requests with {} result batches",
            polls,
            results.len()
        );
        Ok(results)
    }

    async fn start_query(&self, sql: &str, properties: &SessionProperties) -> Result<String> {
        let mut headers = vec![
            (HEADER_USER.to_string(), self.user.clone()),
            (HEADER_CATALOG.to_string(), self.catalog.clone()),
            (HEADER_SCHEMA.to_string(), self.schema.clone()),
            ("Content-Type".to_string(), "text/plain".to_string()),
        ];
        if let Some(session) = session_header(properties) {
            headers.push((HEADER_SESSION.to_string(), session));
        }

        self.transport
            .send(StatementRequest {
                method: Method::Post,
                uri: format!("{}{}", self.coordinator_uri, STATEMENT_PATH),
                headers,
                body: Some(sql.to_string()),
            })
            .await
    }

    async fn fetch_next(&self, next_uri: &str) -> Result<String> {
        self.transport
            .send(StatementRequest {
                method: Method::Get,
                uri: next_uri.to_string(),
                headers: vec![(HEADER_CLIENT_BINARY_RESULTS.to_string(), "true".to_string())],
                body: None,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refq_common::{ReferenceError, RowType, Type};
    use refq_plan::Value;

    fn int_page(values: &[i32]) -> String {
        let row_type = RowType::from_fields(vec![("c0", Type::Integer)]);
        let vector = RowVector::new(row_type, vec![values.iter().map(|v| Value::Integer(*v)).collect()]).unwrap();
        encode_page_base64(&vector).unwrap()
    }

    fn int_row_type() -> RowType {
        RowType::from_fields(vec![("c0", Type::Integer)])
    }

    fn client(mock: Arc<MockTransport>) -> PrestoClient {
        PrestoClient::with_transport(&Config::default(), mock)
    }

    #[tokio::test]
    async fn test_poll_loop_follows_every_next_uri_and_keeps_all_pages() {
        let mock = Arc::new(MockTransport::new());
        let n = 3;
        mock.push_response(&ServerResponse::running("q", "http://mock/next/1")).await.unwrap();
        for i in 1..n {
            let running = ServerResponse::running("q", format!("http://mock/next/{}", i + 1))
                .with_data(&int_row_type(), vec![int_page(&[i])]);
            mock.push_response(&running).await.unwrap();
        }
        mock.push_response(&ServerResponse::finished("q").with_data(&int_row_type(), vec![int_page(&[10, 11])]))
            .await
            .unwrap();

        let batches = client(mock.clone()).execute("SELECT c0 FROM t").await.unwrap();

        let requests = mock.requests().await;
        assert_eq!(requests.len(), 1 + n as usize);
        assert_eq!(requests.iter().filter(|r| r.method == Method::Get).count(), n as usize);
        assert_eq!(requests[3].uri, "http://mock/next/3");

        let rows = refq_plan::materialize(&batches);
        let values: Vec<Value> = rows.into_iter().map(|r| r.values[0].clone()).collect();
        assert_eq!(
            values,
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(10), Value::Integer(11)]
        );
    }

    #[tokio::test]
    async fn test_statement_request_shape() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(&ServerResponse::running("q", "http://mock/next/1")).await.unwrap();
        mock.push_response(&ServerResponse::finished("q")).await.unwrap();

        let mut config = Config::default();
        config.coordinator_uri = "http://presto:8080/".to_string();
        config.user = "fuzzer".to_string();
        let client = PrestoClient::with_transport(&config, mock.clone());
        client.execute("SELECT 1").await.unwrap();

        let requests = mock.requests().await;
        let post = &requests[0];
        assert_eq!(post.method, Method::Post);
        assert_eq!(post.uri, "http://presto:8080/v1/statement?binaryResults=true");
        assert_eq!(post.header(HEADER_USER), Some("fuzzer"));
        assert_eq!(post.header(HEADER_CATALOG), Some("hive"));
        assert_eq!(post.header(HEADER_SCHEMA), Some("tpch"));
        assert_eq!(post.header("Content-Type"), Some("text/plain"));
        assert_eq!(post.header(HEADER_SESSION), None);
        assert_eq!(post.body.as_deref(), Some("SELECT 1"));

        let get = &requests[1];
        assert_eq!(get.method, Method::Get);
        assert_eq!(get.header(HEADER_CLIENT_BINARY_RESULTS), Some("true"));
        assert_eq!(get.body, None);
    }

    #[tokio::test]
    async fn test_session_properties_are_sent() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(&ServerResponse::finished("q")).await.unwrap();

        let mut config = Config::default();
        config.session_properties.insert("query_max_run_time".to_string(), "1m".to_string());
        let client = PrestoClient::with_transport(&config, mock.clone());

        let mut session = SessionProperties::new();
        session.insert("hive.orc_use_column_names".to_string(), "true".to_string());
        client.execute_with_session("SELECT 1", &session).await.unwrap();

        let requests = mock.requests().await;
        assert_eq!(
            requests[0].header(HEADER_SESSION),
            Some("hive.orc_use_column_names=true,query_max_run_time=1m")
        );
    }

    #[tokio::test]
    async fn test_error_stops_polling() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(&ServerResponse::running("q", "http://mock/next/1")).await.unwrap();
        let mut failed = ServerResponse::failed("q", 47, "TABLE_NOT_FOUND", "Table hive.tpch.t_0 does not exist");
        failed.next_uri = Some("http://mock/next/2".to_string());
        mock.push_response(&failed).await.unwrap();
        mock.push_response(&ServerResponse::finished("q")).await.unwrap();

        let result = client(mock.clone()).execute("SELECT * FROM t_0").await;
        match result {
            Err(ReferenceError::QueryFailed { code, message, .. }) => {
                assert_eq!(code, 47);
                assert!(message.contains("does not exist"));
            }
            other => panic!("expected query failure, got {:?}", other),
        }
        assert_eq!(mock.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_mid_poll_aborts() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(&ServerResponse::running("q", "http://mock/next/1")).await.unwrap();
        mock.push_error(ReferenceError::HttpStatus {
            method: "GET",
            uri: "http://mock/next/1".to_string(),
            status: 503,
            body: "Service Unavailable".to_string(),
        })
        .await;

        let result = client(mock).execute("SELECT 1").await;
        assert!(matches!(result, Err(ReferenceError::HttpStatus { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_malformed_json_is_protocol_error() {
        let mock = Arc::new(MockTransport::new());
        mock.push_body("not json").await;

        let result = client(mock).execute("SELECT 1").await;
        assert!(matches!(result, Err(ReferenceError::Protocol(_))));
    }
}
