// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Plan to SQL compiler for the reference engine
//!
//! `to_sql` returns `None` when a plan, or anything it depends on, has no
//! equivalent in the reference dialect. That is an expected outcome which
//! tells the caller to skip the comparison. Plan kinds the compiler has no
//! case for at all panic instead.

pub mod compiler;
pub mod expr;
pub mod support;

pub use compiler::to_sql;
pub use expr::to_expr_sql;
pub use support::{
    aggregation_function_data_specs, is_constant_expr_supported, is_supported_signature,
    is_supported_storage_type, supported_scalar_types, DataSpec,
};
