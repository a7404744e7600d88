// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Configuration management for the reference-query bridge

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::constants::*;
use crate::error::ReferenceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reference coordinator base URI, e.g. `http://127.0.0.1:8080`
    pub coordinator_uri: String,

    /// Principal sent with every statement
    pub user: String,

    /// Catalog the statements run in
    pub catalog: String,

    /// Schema the statements run in
    pub schema: String,

    /// Timeout for every individual HTTP request (ms)
    pub timeout_ms: u64,

    /// Storage format of materialized input tables
    pub table_format: String,

    /// Session properties sent with every statement
    pub session_properties: BTreeMap<String, String>,

    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coordinator_uri: DEFAULT_COORDINATOR_URI.to_string(),
            user: DEFAULT_USER.to_string(),
            catalog: DEFAULT_CATALOG.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            table_format: DEFAULT_TABLE_FORMAT.to_string(),
            session_properties: BTreeMap::new(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ReferenceError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Override fields from `REFQ_*` environment variables when present.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(uri) = std::env::var("REFQ_COORDINATOR_URI") {
            self.coordinator_uri = uri;
        }

        if let Ok(user) = std::env::var("REFQ_USER") {
            self.user = user;
        }

        if let Ok(timeout) = std::env::var("REFQ_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(ms) => self.timeout_ms = ms,
                Err(_) => tracing::warn!("Ignoring invalid REFQ_TIMEOUT_MS: {}", timeout),
            }
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !(self.coordinator_uri.starts_with("http://") || self.coordinator_uri.starts_with("https://")) {
            return Err(ReferenceError::Config(format!(
                "coordinator_uri must be an http(s) URI, got '{}'",
                self.coordinator_uri
            )));
        }
        if self.user.is_empty() {
            return Err(ReferenceError::Config("user cannot be empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ReferenceError::Config("timeout_ms cannot be 0".to_string()));
        }
        if self.table_format.is_empty() {
            return Err(ReferenceError::Config("table_format cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
