// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Plan IR consumed by the reference-query bridge
//!
//! - `vector`: cell values and columnar row batches
//! - `expr`: typed expressions
//! - `plan`: plan node tree
//! - `signature`: function signatures used to prune generated calls
//! - `write_target`: partition/bucket metadata of table writes

pub mod vector;
pub mod expr;
pub mod plan;
pub mod signature;
pub mod write_target;

pub use vector::{materialize, null_rows, Row, RowVector, Value};
pub use expr::{CallExpr, Field, SortOrder, TypedExpr};
pub use plan::{
    Aggregate, AggregationNode, AggregationStep, FilterNode, FrameBound, FrameKind,
    HashJoinNode, JoinType, LimitNode, NestedLoopJoinNode, OrderByNode, PlanNode,
    PlanNodeId, ProjectNode, RowNumberNode, TableScanNode, TableWriteNode, TopNRowNumberNode,
    ValuesNode, WindowFrame, WindowFunction, WindowNode,
};
pub use signature::{FunctionSignature, TypeSignature};
pub use write_target::{BucketProperty, HiveColumn, HiveInsertTarget, PartitionedWriteTarget, SortingColumn};
