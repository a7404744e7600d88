// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Constants used throughout the reference-query bridge

/// Default reference coordinator
pub const DEFAULT_COORDINATOR_URI: &str = "http://127.0.0.1:8080";

/// Default principal
pub const DEFAULT_USER: &str = "user";

/// Catalog holding materialized input tables
pub const DEFAULT_CATALOG: &str = "hive";

/// Schema holding materialized input tables
pub const DEFAULT_SCHEMA: &str = "tpch";

/// Default per-request timeout (ms)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Storage format of materialized input tables
pub const DEFAULT_TABLE_FORMAT: &str = "PARQUET";

/// Statement submission path, relative to the coordinator URI
pub const STATEMENT_PATH: &str = "/v1/statement?binaryResults=true";

/// Protocol headers
pub const HEADER_USER: &str = "X-Presto-User";
pub const HEADER_CATALOG: &str = "X-Presto-Catalog";
pub const HEADER_SCHEMA: &str = "X-Presto-Schema";
pub const HEADER_SESSION: &str = "X-Presto-Session";
pub const HEADER_CLIENT_BINARY_RESULTS: &str = "X-Presto-Client-Binary-Results";

/// Table name written by compiled TableWrite plans
pub const TABLE_WRITE_TARGET: &str = "tmp_write";

/// Column the reference engine exposes with each row's file location
pub const PATH_PSEUDO_COLUMN: &str = "\"$path\"";

/// Extension of files written into materialized tables
pub const TABLE_FILE_EXTENSION: &str = "parquet";
