// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! HTTP transport for the statement protocol

use async_trait::async_trait;
use refq_common::{ReferenceError, Result};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Get,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Post => "POST",
            Method::Get => "GET",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One round trip of the statement protocol
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRequest {
    pub method: Method,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl StatementRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Sends a request and returns the body of a `200` response.
///
/// Implementations report an endpoint that cannot be reached as
/// `ReferenceError::Unreachable`, any other status as
/// `ReferenceError::HttpStatus` and an expired request as
/// `ReferenceError::Timeout`.
#[async_trait]
pub trait StatementTransport: Send + Sync {
    async fn send(&self, request: StatementRequest) -> Result<String>;
}

/// `reqwest` transport with a per-request timeout
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReferenceError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, request: &StatementRequest, err: reqwest::Error) -> ReferenceError {
        if err.is_connect() {
            ReferenceError::Unreachable {
                uri: request.uri.clone(),
                message: err.to_string(),
            }
        } else if err.is_timeout() {
            ReferenceError::Timeout {
                uri: request.uri.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            ReferenceError::Protocol(format!("{} {} failed: {}", request.method, request.uri, err))
        }
    }
}

#[async_trait]
impl StatementTransport for HttpTransport {
    async fn send(&self, request: StatementRequest) -> Result<String> {
        let mut builder = match request.method {
            Method::Post => self.client.post(&request.uri),
            Method::Get => self.client.get(&request.uri),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| self.classify(&request, e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(&request, e))?;

        if status != reqwest::StatusCode::OK {
            return Err(ReferenceError::HttpStatus {
                method: request.method.as_str(),
                uri: request.uri,
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}
