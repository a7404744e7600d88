// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Common foundation for the reference-query bridge
//!
//! This crate provides:
//! - Error types and result handling
//! - Configuration management
//! - The native type system and a parser for the reference engine's type text
//! - Constants
//! - Build metadata

pub mod error;
pub mod config;
pub mod types;
pub mod type_parser;
pub mod constants;
pub mod version;

pub use error::{ReferenceError, Result};
pub use config::Config;
pub use types::{RowType, Type};
pub use type_parser::parse_type;
