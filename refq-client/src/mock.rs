// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Mock reference engine for testing
//!
//! Replays scripted responses in order and records every request it
//! receives. When the script runs dry, an optional handler answers instead,
//! which lets tests emulate an engine that reacts to the SQL it is sent.

use crate::response::ServerResponse;
use crate::transport::{StatementRequest, StatementTransport};
use async_trait::async_trait;
use refq_common::{ReferenceError, Result};
use std::collections::VecDeque;
use tokio::sync::Mutex;

type Handler = Box<dyn Fn(&StatementRequest) -> Result<String> + Send + Sync>;

pub struct MockTransport {
    responses: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<StatementRequest>>,
    handler: Option<Handler>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            handler: None,
        }
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&StatementRequest) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::new()
        }
    }

    /// Queue a raw response body.
    pub async fn push_body(&self, body: impl Into<String>) {
        self.responses.lock().await.push_back(Ok(body.into()));
    }

    pub async fn push_response(&self, response: &ServerResponse) -> Result<()> {
        let body = response.to_json()?;
        self.push_body(body).await;
        Ok(())
    }

    /// Queue a transport failure.
    pub async fn push_error(&self, error: ReferenceError) {
        self.responses.lock().await.push_back(Err(error));
    }

    /// Requests received so far, in order.
    pub async fn requests(&self) -> Vec<StatementRequest> {
        self.requests.lock().await.clone()
    }

    /// SQL bodies of the POSTed statements, in order.
    pub async fn statements(&self) -> Vec<String> {
        self.requests
            .lock()
            .await
            .iter()
            .filter_map(|r| r.body.clone())
            .collect()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatementTransport for MockTransport {
    async fn send(&self, request: StatementRequest) -> Result<String> {
        self.requests.lock().await.push(request.clone());

        if let Some(scripted) = self.responses.lock().await.pop_front() {
            return scripted;
        }
        match &self.handler {
            Some(handler) => handler(&request),
            None => Err(ReferenceError::Protocol(format!(
                "Mock engine has no response for {} {}",
                request.method, request.uri
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Method;

    fn post(sql: &str) -> StatementRequest {
        StatementRequest {
            method: Method::Post,
            uri: "http://mock/v1/statement?binaryResults=true".to_string(),
            headers: Vec::new(),
            body: Some(sql.to_string()),
        }
    }

    #[tokio::test]
    async fn test_scripted_responses_replay_in_order() {
        let mock = MockTransport::new();
        mock.push_body("first").await;
        mock.push_error(ReferenceError::Protocol("boom".to_string())).await;

        assert_eq!(mock.send(post("SELECT 1")).await.unwrap(), "first");
        assert!(mock.send(post("SELECT 2")).await.is_err());
        assert!(mock.send(post("SELECT 3")).await.is_err());
        assert_eq!(mock.statements().await, vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
    }

    #[tokio::test]
    async fn test_handler_answers_when_script_is_empty() {
        let mock = MockTransport::with_handler(|request| {
            Ok(format!("echo {}", request.body.clone().unwrap_or_default()))
        });
        mock.push_body("scripted").await;

        assert_eq!(mock.send(post("a")).await.unwrap(), "scripted");
        assert_eq!(mock.send(post("b")).await.unwrap(), "echo b");
        assert_eq!(mock.requests().await.len(), 2);
    }
}
