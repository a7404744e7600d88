// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Error types for the reference-query bridge

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReferenceError {
    /// The reference engine could not be reached at all. Fatal for a whole
    /// fuzzing session, every later comparison would be meaningless.
    #[error("Couldn't connect to reference engine at {uri}: {message}")]
    Unreachable { uri: String, message: String },

    #[error("Request to {uri} timed out after {timeout_ms} ms")]
    Timeout { uri: String, timeout_ms: u64 },

    #[error("{method} {uri} failed with HTTP status {status}: {body}")]
    HttpStatus {
        method: &'static str,
        uri: String,
        status: u16,
        body: String,
    },

    #[error("Reference query failed: {code} {message}")]
    QueryFailed {
        code: i64,
        name: Option<String>,
        message: String,
    },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Type parse error: {0}")]
    TypeParse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReferenceError {
    /// True when the failure is attributable to the endpoint rather than to
    /// the query that was being run.
    pub fn is_connectivity_failure(&self) -> bool {
        matches!(self, ReferenceError::Unreachable { .. })
    }
}

pub type Result<T> = std::result::Result<T, ReferenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unreachable_is_connectivity_failure() {
        let unreachable = ReferenceError::Unreachable {
            uri: "http://127.0.0.1:8080/v1/statement".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(unreachable.is_connectivity_failure());

        let timeout = ReferenceError::Timeout {
            uri: "http://127.0.0.1:8080/v1/statement".to_string(),
            timeout_ms: 1000,
        };
        assert!(!timeout.is_connectivity_failure());

        let failed = ReferenceError::QueryFailed {
            code: 1,
            name: Some("SYNTAX_ERROR".to_string()),
            message: "line 1:1: mismatched input".to_string(),
        };
        assert!(!failed.is_connectivity_failure());
    }

    #[test]
    fn test_query_failed_message_embeds_code_and_message() {
        let err = ReferenceError::QueryFailed {
            code: 47,
            name: None,
            message: "Table hive.tpch.t_1 does not exist".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Reference query failed: 47 Table hive.tpch.t_1 does not exist"
        );
    }
}
