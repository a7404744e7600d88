// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Differential reference-query runner
//!
//! Given a plan, `ReferenceQueryRunner` compiles it to SQL, recreates every
//! input table inside the reference engine with the plan's own data, runs the
//! query and hands back the result batches for comparison.

pub mod materializer;
pub mod parquet_writer;
pub mod result;
pub mod runner;

pub use materializer::TableMaterializer;
pub use result::{ReferenceQueryErrorCode, ReferenceQueryResult};
pub use runner::ReferenceQueryRunner;
