// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Plan tree to SQL
//!
//! Values leaves compile to their materialized table `t_<id>`, table scans to
//! their table name, and every other node to a subquery.

use crate::expr::{to_call_sql, to_expr_sql, to_inputs_sql};
use crate::support::is_supported_storage_row;
use refq_common::constants::TABLE_WRITE_TARGET;
use refq_common::types::quote_identifier;
use refq_common::RowType;
use refq_plan::{
    Aggregate, AggregationNode, AggregationStep, Field, FrameBound, FrameKind, HashJoinNode, JoinType,
    NestedLoopJoinNode, PlanNode, ProjectNode, RowNumberNode, SortOrder, TableWriteNode, TopNRowNumberNode,
    TypedExpr, Value, ValuesNode, WindowFrame, WindowNode,
};
use tracing::debug;

/// Compiles `plan` into a single statement. `None` means the plan cannot be
/// expressed in the reference dialect.
///
/// # Panics
///
/// On Filter, OrderBy and Limit nodes, and on aggregations whose step is
/// not `Single`.
pub fn to_sql(plan: &PlanNode) -> Option<String> {
    let sql = match plan {
        PlanNode::Project(node) => project_sql(node),
        PlanNode::Aggregation(node) => aggregation_sql(node),
        PlanNode::Window(node) => window_sql(node),
        PlanNode::RowNumber(node) => row_number_sql(node),
        PlanNode::TopNRowNumber(node) => top_n_row_number_sql(node),
        PlanNode::TableWrite(node) => table_write_sql(node),
        PlanNode::HashJoin(node) => hash_join_sql(node),
        PlanNode::NestedLoopJoin(node) => nested_loop_join_sql(node),
        PlanNode::Values(node) => values_table(node).map(|table| format!("SELECT * FROM {}", table)),
        PlanNode::TableScan(node) => Some(format!("SELECT * FROM {}", scan_table(&node.table_name))),
        PlanNode::Filter(_) | PlanNode::OrderBy(_) | PlanNode::Limit(_) => {
            unimplemented!("{} plan node {} cannot be compiled to SQL", plan.name(), plan.id())
        }
    };

    if sql.is_none() {
        debug!(node_id = plan.id(), node = plan.name(), "Plan node is not supported by the reference engine");
    }
    sql
}

/// Source of a `FROM` clause.
fn relation_sql(plan: &PlanNode) -> Option<String> {
    match plan {
        PlanNode::Values(node) => values_table(node),
        PlanNode::TableScan(node) => Some(scan_table(&node.table_name)),
        other => to_sql(other).map(|sql| format!("({})", sql)),
    }
}

fn values_table(node: &ValuesNode) -> Option<String> {
    if is_supported_storage_row(&node.row_type) {
        Some(quote_identifier(&node.table_name()))
    } else {
        None
    }
}

/// Quotes each part of a possibly qualified table name.
fn scan_table(name: &str) -> String {
    name.split('.').map(quote_identifier).collect::<Vec<_>>().join(".")
}

/// Whether the rows feeding a node can be stored in the reference engine.
fn storable_source(source: &PlanNode) -> bool {
    is_supported_storage_row(&source.output_type())
}

fn column_list(row_type: &RowType) -> Vec<String> {
    row_type.names().iter().map(|name| quote_identifier(name)).collect()
}

fn field_list(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|field| quote_identifier(&field.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn sort_list(keys: &[Field], orders: &[SortOrder]) -> String {
    keys.iter()
        .zip(orders.iter())
        .map(|(key, order)| format!("{} {}", quote_identifier(&key.name), order))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `PARTITION BY .. ORDER BY ..` of an `OVER` clause, possibly empty.
fn over_clause(partition_keys: &[Field], sorting_keys: &[Field], sorting_orders: &[SortOrder]) -> Vec<String> {
    let mut parts = Vec::new();
    if !partition_keys.is_empty() {
        parts.push(format!("PARTITION BY {}", field_list(partition_keys)));
    }
    if !sorting_keys.is_empty() {
        parts.push(format!("ORDER BY {}", sort_list(sorting_keys, sorting_orders)));
    }
    parts
}

fn project_sql(node: &ProjectNode) -> Option<String> {
    if node.projections.is_empty() {
        return None;
    }
    let mut items = Vec::with_capacity(node.projections.len());
    for (name, projection) in node.names.iter().zip(node.projections.iter()) {
        items.push(format!("{} AS {}", to_expr_sql(projection)?, quote_identifier(name)));
    }
    let source = relation_sql(&node.source)?;
    Some(format!("SELECT {} FROM {}", items.join(", "), source))
}

fn aggregate_call_sql(aggregate: &Aggregate) -> Option<String> {
    let mut sql = format!("{}(", aggregate.call.name);
    if aggregate.distinct {
        sql.push_str("DISTINCT ");
    }
    sql.push_str(&to_inputs_sql(&aggregate.call.inputs)?);
    if !aggregate.sorting_keys.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&sort_list(&aggregate.sorting_keys, &aggregate.sorting_orders));
    }
    sql.push(')');
    if let Some(mask) = &aggregate.mask {
        sql.push_str(&format!(" FILTER (WHERE {})", quote_identifier(&mask.name)));
    }
    Some(sql)
}

fn aggregation_sql(node: &AggregationNode) -> Option<String> {
    assert!(
        node.step == AggregationStep::Single,
        "Aggregation node {} must be single step, got {:?}",
        node.id,
        node.step
    );

    if !storable_source(&node.source) {
        return None;
    }

    let keys = field_list(&node.grouping_keys);
    let mut items = Vec::new();
    if !node.grouping_keys.is_empty() {
        items.push(keys.clone());
    }
    for (name, aggregate) in node.aggregate_names.iter().zip(node.aggregates.iter()) {
        items.push(format!("{} AS {}", aggregate_call_sql(aggregate)?, quote_identifier(name)));
    }
    if items.is_empty() {
        return None;
    }

    let mut sql = format!("SELECT {} FROM {}", items.join(", "), relation_sql(&node.source)?);
    if !node.grouping_keys.is_empty() {
        sql.push_str(&format!(" GROUP BY {}", keys));
    }
    Some(sql)
}

fn frame_bound_sql(bound: &FrameBound) -> Option<String> {
    let offset_sql = |offset: &TypedExpr| match offset {
        TypedExpr::Constant { value, .. } => match value {
            Value::TinyInt(_) | Value::SmallInt(_) | Value::Integer(_) | Value::BigInt(_) => {
                Some(value.to_string())
            }
            _ => to_expr_sql(offset),
        },
        _ => to_expr_sql(offset),
    };

    let sql = match bound {
        FrameBound::UnboundedPreceding => "UNBOUNDED PRECEDING".to_string(),
        FrameBound::Preceding(offset) => format!("{} PRECEDING", offset_sql(offset)?),
        FrameBound::CurrentRow => "CURRENT ROW".to_string(),
        FrameBound::Following(offset) => format!("{} FOLLOWING", offset_sql(offset)?),
        FrameBound::UnboundedFollowing => "UNBOUNDED FOLLOWING".to_string(),
    };
    Some(sql)
}

fn frame_sql(frame: &WindowFrame) -> Option<String> {
    let kind = match frame.kind {
        FrameKind::Rows => "ROWS",
        FrameKind::Range => "RANGE",
        FrameKind::Groups => "GROUPS",
    };
    Some(format!(
        "{} BETWEEN {} AND {}",
        kind,
        frame_bound_sql(&frame.start)?,
        frame_bound_sql(&frame.end)?
    ))
}

fn window_sql(node: &WindowNode) -> Option<String> {
    if !storable_source(&node.source) {
        return None;
    }

    let over = over_clause(&node.partition_keys, &node.sorting_keys, &node.sorting_orders);
    let mut items = column_list(&node.source.output_type());
    for (name, function) in node.window_column_names.iter().zip(node.window_functions.iter()) {
        let mut call = to_call_sql(&function.call)?;
        if function.ignore_nulls {
            call.push_str(" IGNORE NULLS");
        }
        let mut spec = over.clone();
        spec.push(frame_sql(&function.frame)?);
        items.push(format!("{} OVER ({}) AS {}", call, spec.join(" "), quote_identifier(name)));
    }

    Some(format!("SELECT {} FROM {}", items.join(", "), relation_sql(&node.source)?))
}

/// `SELECT <inputs>, row_number() OVER (..) AS <rn> FROM <source>`
fn numbered_rows_sql(source: &PlanNode, over: Vec<String>, row_number_column: &str) -> Option<String> {
    let mut items = column_list(&source.output_type());
    items.push(format!(
        "row_number() OVER ({}) AS {}",
        over.join(" "),
        quote_identifier(row_number_column)
    ));
    Some(format!("SELECT {} FROM {}", items.join(", "), relation_sql(source)?))
}

/// Keeps the first `limit` rows of each partition of `numbered`.
fn limit_row_numbers(
    numbered: String,
    source: &PlanNode,
    emits_row_number: bool,
    row_number_column: &str,
    limit: u32,
) -> Option<String> {
    let outputs = if emits_row_number {
        "*".to_string()
    } else {
        let columns = column_list(&source.output_type());
        if columns.is_empty() {
            return None;
        }
        columns.join(", ")
    };
    Some(format!(
        "SELECT {} FROM ({}) WHERE {} <= {}",
        outputs,
        numbered,
        quote_identifier(row_number_column),
        limit
    ))
}

fn row_number_sql(node: &RowNumberNode) -> Option<String> {
    if !storable_source(&node.source) {
        return None;
    }

    let row_number_column = node.row_number_column_name.as_deref().unwrap_or("row_number");
    let over = over_clause(&node.partition_keys, &[], &[]);
    let numbered = numbered_rows_sql(&node.source, over, row_number_column)?;
    match node.limit {
        Some(limit) => limit_row_numbers(
            numbered,
            &node.source,
            node.row_number_column_name.is_some(),
            row_number_column,
            limit,
        ),
        None => Some(numbered),
    }
}

fn top_n_row_number_sql(node: &TopNRowNumberNode) -> Option<String> {
    if !storable_source(&node.source) {
        return None;
    }

    let row_number_column = node.row_number_column_name.as_deref().unwrap_or("row_number");
    let over = over_clause(&node.partition_keys, &node.sorting_keys, &node.sorting_orders);
    let numbered = numbered_rows_sql(&node.source, over, row_number_column)?;
    limit_row_numbers(
        numbered,
        &node.source,
        node.row_number_column_name.is_some(),
        row_number_column,
        node.limit,
    )
}

fn string_array(items: impl IntoIterator<Item = String>) -> String {
    let quoted: Vec<String> = items
        .into_iter()
        .map(|item| format!("'{}'", item.replace('\'', "''")))
        .collect();
    format!("ARRAY[{}]", quoted.join(", "))
}

fn table_write_sql(node: &TableWriteNode) -> Option<String> {
    let target = &node.target;
    let mut properties = Vec::new();

    if target.is_partitioned() {
        properties.push(format!("PARTITIONED_BY = {}", string_array(target.partition_keys())));
    }
    if let Some(bucket) = target.bucket_property() {
        properties.push(format!("BUCKET_COUNT = {}", bucket.bucket_count));
        properties.push(format!("BUCKETED_BY = {}", string_array(bucket.bucketed_by.iter().cloned())));
        if !bucket.sorted_by.is_empty() {
            let sorted_by = bucket
                .sorted_by
                .iter()
                .map(|s| format!("{} {}", s.column, if s.ascending { "ASC" } else { "DESC" }));
            properties.push(format!("SORTED_BY = {}", string_array(sorted_by)));
        }
    }
    properties.push(format!("FORMAT = '{}'", target.storage_format()));

    Some(format!(
        "CREATE TABLE {} WITH ({}) AS SELECT * FROM {}",
        TABLE_WRITE_TARGET,
        properties.join(", "),
        relation_sql(&node.source)?
    ))
}

fn join_keyword(join_type: JoinType) -> Option<&'static str> {
    match join_type {
        JoinType::Inner => Some("INNER JOIN"),
        JoinType::Left => Some("LEFT JOIN"),
        JoinType::Right => Some("RIGHT JOIN"),
        JoinType::Full => Some("FULL OUTER JOIN"),
        JoinType::LeftSemiFilter | JoinType::LeftSemiProject | JoinType::Anti => None,
    }
}

/// `l1 = r1 AND l2 = r2 [AND filter]`, or `None` if there is nothing to match on.
fn join_condition(node: &HashJoinNode, filter: Option<&str>) -> Option<String> {
    let mut conditions: Vec<String> = node
        .left_keys
        .iter()
        .zip(node.right_keys.iter())
        .map(|(l, r)| format!("{} = {}", quote_identifier(&l.name), quote_identifier(&r.name)))
        .collect();
    if let Some(filter) = filter {
        conditions.push(filter.to_string());
    }
    if conditions.is_empty() {
        None
    } else {
        Some(conditions.join(" AND "))
    }
}

/// `lk [NOT] IN (SELECT rk FROM r [WHERE filter])`, single key only
fn membership_sql(node: &HashJoinNode, right: &str, filter: Option<&str>, negated: bool) -> Option<String> {
    let (left_key, right_key) = match (node.left_keys.as_slice(), node.right_keys.as_slice()) {
        ([l], [r]) => (l, r),
        _ => return None,
    };
    let mut subquery = format!("SELECT {} FROM {}", quote_identifier(&right_key.name), right);
    if let Some(filter) = filter {
        subquery.push_str(&format!(" WHERE {}", filter));
    }
    Some(format!(
        "{} {}IN ({})",
        quote_identifier(&left_key.name),
        if negated { "NOT " } else { "" },
        subquery
    ))
}

/// `[NOT] EXISTS (SELECT * FROM r WHERE <keys and filter>)`
fn exists_sql(node: &HashJoinNode, right: &str, filter: Option<&str>, negated: bool) -> Option<String> {
    let condition = join_condition(node, filter)?;
    Some(format!(
        "{}EXISTS (SELECT * FROM {} WHERE {})",
        if negated { "NOT " } else { "" },
        right,
        condition
    ))
}

fn hash_join_sql(node: &HashJoinNode) -> Option<String> {
    let filter = match &node.filter {
        Some(filter) => Some(to_expr_sql(filter)?),
        None => None,
    };
    let filter = filter.as_deref();

    let outputs = column_list(&node.output_type);
    if outputs.is_empty() {
        return None;
    }
    let left = relation_sql(&node.left)?;
    let right = relation_sql(&node.right)?;

    let sql = match node.join_type {
        JoinType::Inner | JoinType::Left | JoinType::Right | JoinType::Full => {
            let keyword = join_keyword(node.join_type)?;
            let condition = join_condition(node, filter).unwrap_or_else(|| "TRUE".to_string());
            format!("SELECT {} FROM {} {} {} ON {}", outputs.join(", "), left, keyword, right, condition)
        }
        JoinType::LeftSemiFilter => {
            let predicate = membership_sql(node, &right, filter, false)?;
            format!("SELECT {} FROM {} WHERE {}", outputs.join(", "), left, predicate)
        }
        JoinType::LeftSemiProject => {
            // Last output column carries the match flag
            let (match_column, left_outputs) = outputs.split_last()?;
            let predicate = if node.null_aware {
                membership_sql(node, &right, filter, false)?
            } else {
                exists_sql(node, &right, filter, false)?
            };
            let mut items = left_outputs.to_vec();
            items.push(format!("{} AS {}", predicate, match_column));
            format!("SELECT {} FROM {}", items.join(", "), left)
        }
        JoinType::Anti => {
            let predicate = if node.null_aware {
                membership_sql(node, &right, filter, true)?
            } else {
                exists_sql(node, &right, filter, true)?
            };
            format!("SELECT {} FROM {} WHERE {}", outputs.join(", "), left, predicate)
        }
    };
    Some(sql)
}

fn nested_loop_join_sql(node: &NestedLoopJoinNode) -> Option<String> {
    let keyword = join_keyword(node.join_type)?;
    let outputs = column_list(&node.output_type);
    if outputs.is_empty() {
        return None;
    }
    let condition = match &node.condition {
        Some(condition) => to_expr_sql(condition)?,
        None => "TRUE".to_string(),
    };
    Some(format!(
        "SELECT {} FROM {} {} {} ON {}",
        outputs.join(", "),
        relation_sql(&node.left)?,
        keyword,
        relation_sql(&node.right)?,
        condition
    ))
}
