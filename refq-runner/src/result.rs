// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

use std::fmt;

/// Outcome of running a plan against the reference engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceQueryErrorCode {
    Success,
    /// The plan cannot be expressed for the reference engine; nothing ran.
    ReferenceQueryUnsupported,
    /// The reference engine rejected or failed the query.
    ReferenceQueryFail,
}

impl fmt::Display for ReferenceQueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceQueryErrorCode::Success => "SUCCESS",
            ReferenceQueryErrorCode::ReferenceQueryUnsupported => "REFERENCE_QUERY_UNSUPPORTED",
            ReferenceQueryErrorCode::ReferenceQueryFail => "REFERENCE_QUERY_FAIL",
        };
        f.write_str(name)
    }
}

/// Results, present only on success, and the outcome code
pub type ReferenceQueryResult<T> = (Option<T>, ReferenceQueryErrorCode);
