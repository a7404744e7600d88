// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Plan node tree
//!
//! Single-source nodes own one boxed source, joins own two and Values /
//! TableScan are leaves, so every node has exactly the sources its kind
//! requires.

use crate::expr::{CallExpr, Field, SortOrder, TypedExpr};
use crate::vector::RowVector;
use crate::write_target::PartitionedWriteTarget;
use refq_common::{RowType, Type};
use std::collections::BTreeMap;
use std::sync::Arc;

pub type PlanNodeId = String;

#[derive(Debug, Clone)]
pub enum PlanNode {
    Project(ProjectNode),
    Aggregation(AggregationNode),
    Window(WindowNode),
    RowNumber(RowNumberNode),
    TopNRowNumber(TopNRowNumberNode),
    TableWrite(TableWriteNode),
    HashJoin(HashJoinNode),
    NestedLoopJoin(NestedLoopJoinNode),
    Values(ValuesNode),
    TableScan(TableScanNode),
    Filter(FilterNode),
    OrderBy(OrderByNode),
    Limit(LimitNode),
}

#[derive(Debug, Clone)]
pub struct ProjectNode {
    pub id: PlanNodeId,
    pub names: Vec<String>,
    pub projections: Vec<TypedExpr>,
    pub source: Box<PlanNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationStep {
    Partial,
    Final,
    Intermediate,
    Single,
}

#[derive(Debug, Clone)]
pub struct Aggregate {
    pub call: CallExpr,
    /// Boolean column; rows where it is false are skipped
    pub mask: Option<Field>,
    pub sorting_keys: Vec<Field>,
    pub sorting_orders: Vec<SortOrder>,
    pub distinct: bool,
}

impl Aggregate {
    pub fn new(call: CallExpr) -> Self {
        Self {
            call,
            mask: None,
            sorting_keys: Vec::new(),
            sorting_orders: Vec::new(),
            distinct: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregationNode {
    pub id: PlanNodeId,
    pub step: AggregationStep,
    pub grouping_keys: Vec<Field>,
    pub aggregate_names: Vec<String>,
    pub aggregates: Vec<Aggregate>,
    pub source: Box<PlanNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Rows,
    Range,
    Groups,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameBound {
    UnboundedPreceding,
    /// Offset is a constant or a column
    Preceding(TypedExpr),
    CurrentRow,
    Following(TypedExpr),
    UnboundedFollowing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
    pub kind: FrameKind,
    pub start: FrameBound,
    pub end: FrameBound,
}

impl Default for WindowFrame {
    /// `RANGE BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW`
    fn default() -> Self {
        Self {
            kind: FrameKind::Range,
            start: FrameBound::UnboundedPreceding,
            end: FrameBound::CurrentRow,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WindowFunction {
    pub call: CallExpr,
    pub frame: WindowFrame,
    pub ignore_nulls: bool,
}

#[derive(Debug, Clone)]
pub struct WindowNode {
    pub id: PlanNodeId,
    pub partition_keys: Vec<Field>,
    pub sorting_keys: Vec<Field>,
    pub sorting_orders: Vec<SortOrder>,
    pub window_column_names: Vec<String>,
    pub window_functions: Vec<WindowFunction>,
    pub source: Box<PlanNode>,
}

#[derive(Debug, Clone)]
pub struct RowNumberNode {
    pub id: PlanNodeId,
    pub partition_keys: Vec<Field>,
    /// Set when the node emits the row number as its last column
    pub row_number_column_name: Option<String>,
    pub limit: Option<u32>,
    pub source: Box<PlanNode>,
}

#[derive(Debug, Clone)]
pub struct TopNRowNumberNode {
    pub id: PlanNodeId,
    pub partition_keys: Vec<Field>,
    pub sorting_keys: Vec<Field>,
    pub sorting_orders: Vec<SortOrder>,
    pub row_number_column_name: Option<String>,
    pub limit: u32,
    pub source: Box<PlanNode>,
}

#[derive(Debug, Clone)]
pub struct TableWriteNode {
    pub id: PlanNodeId,
    pub column_names: Vec<String>,
    pub target: Arc<dyn PartitionedWriteTarget>,
    pub source: Box<PlanNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    /// Left rows with a match on the right
    LeftSemiFilter,
    /// All left rows plus a boolean match column
    LeftSemiProject,
    /// Left rows without a match on the right
    Anti,
}

#[derive(Debug, Clone)]
pub struct HashJoinNode {
    pub id: PlanNodeId,
    pub join_type: JoinType,
    pub null_aware: bool,
    pub left_keys: Vec<Field>,
    pub right_keys: Vec<Field>,
    pub filter: Option<TypedExpr>,
    pub left: Box<PlanNode>,
    pub right: Box<PlanNode>,
    pub output_type: RowType,
}

#[derive(Debug, Clone)]
pub struct NestedLoopJoinNode {
    pub id: PlanNodeId,
    pub join_type: JoinType,
    pub condition: Option<TypedExpr>,
    pub left: Box<PlanNode>,
    pub right: Box<PlanNode>,
    pub output_type: RowType,
}

#[derive(Debug, Clone)]
pub struct ValuesNode {
    pub id: PlanNodeId,
    pub row_type: RowType,
    pub values: Vec<RowVector>,
}

impl ValuesNode {
    /// Name of the table the values are materialized into.
    pub fn table_name(&self) -> String {
        format!("t_{}", self.id)
    }
}

#[derive(Debug, Clone)]
pub struct TableScanNode {
    pub id: PlanNodeId,
    pub table_name: String,
    pub output_type: RowType,
}

#[derive(Debug, Clone)]
pub struct FilterNode {
    pub id: PlanNodeId,
    pub filter: TypedExpr,
    pub source: Box<PlanNode>,
}

#[derive(Debug, Clone)]
pub struct OrderByNode {
    pub id: PlanNodeId,
    pub sorting_keys: Vec<Field>,
    pub sorting_orders: Vec<SortOrder>,
    pub source: Box<PlanNode>,
}

#[derive(Debug, Clone)]
pub struct LimitNode {
    pub id: PlanNodeId,
    pub offset: u64,
    pub count: u64,
    pub source: Box<PlanNode>,
}

fn append_field(row_type: RowType, name: &str, ty: Type) -> RowType {
    row_type.concat(&RowType::from_fields(vec![(name.to_string(), ty)]))
}

impl PlanNode {
    pub fn values(id: impl Into<String>, values: Vec<RowVector>) -> Self {
        let row_type = values
            .first()
            .map(|v| v.row_type().clone())
            .unwrap_or_default();
        PlanNode::Values(ValuesNode {
            id: id.into(),
            row_type,
            values,
        })
    }

    pub fn project(
        id: impl Into<String>,
        names: Vec<String>,
        projections: Vec<TypedExpr>,
        source: PlanNode,
    ) -> Self {
        PlanNode::Project(ProjectNode {
            id: id.into(),
            names,
            projections,
            source: Box::new(source),
        })
    }

    pub fn id(&self) -> &str {
        match self {
            PlanNode::Project(n) => &n.id,
            PlanNode::Aggregation(n) => &n.id,
            PlanNode::Window(n) => &n.id,
            PlanNode::RowNumber(n) => &n.id,
            PlanNode::TopNRowNumber(n) => &n.id,
            PlanNode::TableWrite(n) => &n.id,
            PlanNode::HashJoin(n) => &n.id,
            PlanNode::NestedLoopJoin(n) => &n.id,
            PlanNode::Values(n) => &n.id,
            PlanNode::TableScan(n) => &n.id,
            PlanNode::Filter(n) => &n.id,
            PlanNode::OrderBy(n) => &n.id,
            PlanNode::Limit(n) => &n.id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlanNode::Project(_) => "Project",
            PlanNode::Aggregation(_) => "Aggregation",
            PlanNode::Window(_) => "Window",
            PlanNode::RowNumber(_) => "RowNumber",
            PlanNode::TopNRowNumber(_) => "TopNRowNumber",
            PlanNode::TableWrite(_) => "TableWrite",
            PlanNode::HashJoin(_) => "HashJoin",
            PlanNode::NestedLoopJoin(_) => "NestedLoopJoin",
            PlanNode::Values(_) => "Values",
            PlanNode::TableScan(_) => "TableScan",
            PlanNode::Filter(_) => "Filter",
            PlanNode::OrderBy(_) => "OrderBy",
            PlanNode::Limit(_) => "Limit",
        }
    }

    pub fn sources(&self) -> Vec<&PlanNode> {
        match self {
            PlanNode::Project(n) => vec![n.source.as_ref()],
            PlanNode::Aggregation(n) => vec![n.source.as_ref()],
            PlanNode::Window(n) => vec![n.source.as_ref()],
            PlanNode::RowNumber(n) => vec![n.source.as_ref()],
            PlanNode::TopNRowNumber(n) => vec![n.source.as_ref()],
            PlanNode::TableWrite(n) => vec![n.source.as_ref()],
            PlanNode::HashJoin(n) => vec![n.left.as_ref(), n.right.as_ref()],
            PlanNode::NestedLoopJoin(n) => vec![n.left.as_ref(), n.right.as_ref()],
            PlanNode::Values(_) | PlanNode::TableScan(_) => Vec::new(),
            PlanNode::Filter(n) => vec![n.source.as_ref()],
            PlanNode::OrderBy(n) => vec![n.source.as_ref()],
            PlanNode::Limit(n) => vec![n.source.as_ref()],
        }
    }

    pub fn output_type(&self) -> RowType {
        match self {
            PlanNode::Project(n) => RowType::new(
                n.names.clone(),
                n.projections.iter().map(|p| p.ty().clone()).collect(),
            ),
            PlanNode::Aggregation(n) => {
                let keys = n.grouping_keys.iter().map(|k| (k.name.clone(), k.ty.clone()));
                let aggregates = n
                    .aggregate_names
                    .iter()
                    .zip(n.aggregates.iter())
                    .map(|(name, agg)| (name.clone(), agg.call.ty.clone()));
                RowType::from_fields(keys.chain(aggregates))
            }
            PlanNode::Window(n) => {
                let functions = RowType::from_fields(
                    n.window_column_names
                        .iter()
                        .zip(n.window_functions.iter())
                        .map(|(name, f)| (name.clone(), f.call.ty.clone())),
                );
                n.source.output_type().concat(&functions)
            }
            PlanNode::RowNumber(n) => match &n.row_number_column_name {
                Some(name) => append_field(n.source.output_type(), name, Type::BigInt),
                None => n.source.output_type(),
            },
            PlanNode::TopNRowNumber(n) => match &n.row_number_column_name {
                Some(name) => append_field(n.source.output_type(), name, Type::BigInt),
                None => n.source.output_type(),
            },
            PlanNode::TableWrite(_) => RowType::from_fields(vec![("rows", Type::BigInt)]),
            PlanNode::HashJoin(n) => n.output_type.clone(),
            PlanNode::NestedLoopJoin(n) => n.output_type.clone(),
            PlanNode::Values(n) => n.row_type.clone(),
            PlanNode::TableScan(n) => n.output_type.clone(),
            PlanNode::Filter(n) => n.source.output_type(),
            PlanNode::OrderBy(n) => n.source.output_type(),
            PlanNode::Limit(n) => n.source.output_type(),
        }
    }

    /// Every Values leaf in the tree, keyed by its table name.
    pub fn tables(&self) -> BTreeMap<String, &ValuesNode> {
        let mut tables = BTreeMap::new();
        self.collect_tables(&mut tables);
        tables
    }

    fn collect_tables<'a>(&'a self, tables: &mut BTreeMap<String, &'a ValuesNode>) {
        if let PlanNode::Values(values) = self {
            tables.insert(values.table_name(), values);
        }
        for source in self.sources() {
            source.collect_tables(tables);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Value;
    use crate::write_target::{HiveColumn, HiveInsertTarget};

    fn values_node(id: &str) -> PlanNode {
        let row_type = RowType::from_fields(vec![("c0", Type::Integer), ("c1", Type::Varchar)]);
        let vector = RowVector::new(
            row_type,
            vec![vec![Value::Integer(1)], vec![Value::Varchar("a".to_string())]],
        )
        .unwrap();
        PlanNode::values(id, vec![vector])
    }

    #[test]
    fn test_output_types() {
        let project = PlanNode::project(
            "1",
            vec!["x".to_string()],
            vec![TypedExpr::field("c0", Type::Integer)],
            values_node("0"),
        );
        assert_eq!(project.output_type(), RowType::from_fields(vec![("x", Type::Integer)]));

        let row_number = PlanNode::RowNumber(RowNumberNode {
            id: "2".to_string(),
            partition_keys: vec![],
            row_number_column_name: Some("rn".to_string()),
            limit: None,
            source: Box::new(values_node("0")),
        });
        let output = row_number.output_type();
        assert_eq!(output.len(), 3);
        assert_eq!(output.name_of(2), "rn");
        assert_eq!(output.child_at(2), &Type::BigInt);

        let write = PlanNode::TableWrite(TableWriteNode {
            id: "3".to_string(),
            column_names: vec!["c0".to_string(), "c1".to_string()],
            target: Arc::new(HiveInsertTarget::new(
                vec![HiveColumn::regular("c0", Type::Integer), HiveColumn::regular("c1", Type::Varchar)],
                "ORC",
            )),
            source: Box::new(values_node("0")),
        });
        assert_eq!(write.sources().len(), 1);
        assert_eq!(write.output_type().names(), &["rows".to_string()]);
    }

    #[test]
    fn test_tables_collects_every_values_leaf() {
        let join = PlanNode::NestedLoopJoin(NestedLoopJoinNode {
            id: "2".to_string(),
            join_type: JoinType::Inner,
            condition: None,
            left: Box::new(values_node("0")),
            right: Box::new(PlanNode::project(
                "3",
                vec!["c0".to_string()],
                vec![TypedExpr::field("c0", Type::Integer)],
                values_node("1"),
            )),
            output_type: RowType::default(),
        });

        let tables = join.tables();
        assert_eq!(tables.keys().cloned().collect::<Vec<_>>(), vec!["t_0", "t_1"]);
        assert_eq!(tables["t_1"].values[0].num_rows(), 1);
        assert_eq!(join.sources().len(), 2);
    }
}
