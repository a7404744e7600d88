// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Typed expression to SQL text

use crate::support::is_constant_type_supported;
use chrono::{Duration, NaiveDate};
use refq_common::types::quote_identifier;
use refq_common::Type;
use refq_plan::{CallExpr, TypedExpr, Value};

/// Renders `expr`, or `None` when some part of it has no SQL equivalent.
pub fn to_expr_sql(expr: &TypedExpr) -> Option<String> {
    match expr {
        TypedExpr::FieldAccess(field) => Some(quote_identifier(&field.name)),
        TypedExpr::Dereference { input, name, .. } => {
            let input_sql = to_expr_sql(input)?;
            match input.as_ref() {
                TypedExpr::FieldAccess(_) => Some(format!("{}.{}", input_sql, quote_identifier(name))),
                _ => Some(format!("({}).{}", input_sql, quote_identifier(name))),
            }
        }
        TypedExpr::Call(call) => to_call_sql(call),
        TypedExpr::Cast { input, ty, is_try } => Some(format!(
            "{}({} as {})",
            if *is_try { "try_cast" } else { "cast" },
            to_expr_sql(input)?,
            ty.to_sql()
        )),
        TypedExpr::Concat { inputs, ty } => Some(format!(
            "cast(row({}) as {})",
            to_inputs_sql(inputs)?,
            ty.to_sql()
        )),
        TypedExpr::Constant { ty, value } => to_constant_sql(ty, value),
        TypedExpr::Lambda { .. } => None,
    }
}

/// Comma-separated inputs.
pub(crate) fn to_inputs_sql(inputs: &[TypedExpr]) -> Option<String> {
    let parts = inputs.iter().map(to_expr_sql).collect::<Option<Vec<_>>>()?;
    Some(parts.join(", "))
}

fn binary_operator(name: &str) -> Option<&'static str> {
    let op = match name {
        "plus" => "+",
        "minus" => "-",
        "multiply" => "*",
        "divide" => "/",
        "mod" => "%",
        "eq" => "=",
        "neq" => "<>",
        "lt" => "<",
        "lte" => "<=",
        "gt" => ">",
        "gte" => ">=",
        "distinct_from" => "IS DISTINCT FROM",
        _ => return None,
    };
    Some(op)
}

/// Operator calls render as parenthesized SQL operators, the rest as
/// `name(arg, ...)`.
pub fn to_call_sql(call: &CallExpr) -> Option<String> {
    let inputs = call
        .inputs
        .iter()
        .map(to_expr_sql)
        .collect::<Option<Vec<_>>>()?;

    if let Some(op) = binary_operator(&call.name) {
        if inputs.len() == 2 {
            return Some(format!("({} {} {})", inputs[0], op, inputs[1]));
        }
    }

    let sql = match (call.name.as_str(), inputs.as_slice()) {
        ("and", [_, _, ..]) => format!("({})", inputs.join(" AND ")),
        ("or", [_, _, ..]) => format!("({})", inputs.join(" OR ")),
        ("not", [input]) => format!("(NOT {})", input),
        ("negate", [input]) => format!("(- {})", input),
        ("is_null", [input]) => format!("({} IS NULL)", input),
        ("like", [input, pattern]) => format!("({} LIKE {})", input, pattern),
        ("like", [input, pattern, escape]) => format!("({} LIKE {} ESCAPE {})", input, pattern, escape),
        ("between", [input, low, high]) => format!("({} BETWEEN {} AND {})", input, low, high),
        ("in", [input, list @ ..]) if !list.is_empty() => format!("({} IN ({}))", input, list.join(", ")),
        ("subscript", [base, index]) => format!("{}[{}]", base, index),
        ("switch" | "if", [_, _, ..]) => case_sql(&inputs),
        ("row_constructor", _) => format!("row({})", inputs.join(", ")),
        ("array_constructor", _) => format!("ARRAY[{}]", inputs.join(", ")),
        (name, _) => format!("{}({})", name, inputs.join(", ")),
    };
    Some(sql)
}

/// `switch(c1, v1, c2, v2, ..., [else])`
fn case_sql(inputs: &[String]) -> String {
    let mut sql = String::from("CASE");
    let mut pairs = inputs.chunks_exact(2);
    for pair in pairs.by_ref() {
        sql.push_str(&format!(" WHEN {} THEN {}", pair[0], pair[1]));
    }
    if let [otherwise] = pairs.remainder() {
        sql.push_str(&format!(" ELSE {}", otherwise));
    }
    sql.push_str(" END");
    sql
}

fn quote_string(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

fn decimal_text(unscaled: i128, scale: u8) -> String {
    let digits = unscaled.unsigned_abs().to_string();
    let scale = scale as usize;
    let sign = if unscaled < 0 { "-" } else { "" };
    if scale == 0 {
        return format!("{}{}", sign, digits);
    }
    let padded = format!("{:0>width$}", digits, width = scale + 1);
    let (whole, fraction) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, whole, fraction)
}

fn floating_sql(value: f64, ty: &Type) -> String {
    let literal = if value.is_nan() {
        "nan()".to_string()
    } else if value == f64::INFINITY {
        "infinity()".to_string()
    } else if value == f64::NEG_INFINITY {
        "-infinity()".to_string()
    } else {
        format!("{:e}", value)
    };
    format!("cast({} as {})", literal, ty.to_sql())
}

/// Renders a literal of type `ty`. Types whose literals mean something else
/// in the reference dialect, and values that do not fit `ty`, give `None`.
pub fn to_constant_sql(ty: &Type, value: &Value) -> Option<String> {
    if !is_constant_type_supported(ty) {
        return None;
    }

    let sql = match (ty, value) {
        (Type::Unknown, Value::Null) => "NULL".to_string(),
        (Type::HugeInt, _) => return None,
        (_, Value::Null) => format!("cast(null as {})", ty.to_sql()),
        (Type::Boolean, Value::Boolean(true)) => "TRUE".to_string(),
        (Type::Boolean, Value::Boolean(false)) => "FALSE".to_string(),
        (Type::TinyInt, Value::TinyInt(v)) => format!("cast({} as TINYINT)", v),
        (Type::SmallInt, Value::SmallInt(v)) => format!("cast({} as SMALLINT)", v),
        (Type::Integer, Value::Integer(v)) => format!("cast({} as INTEGER)", v),
        (Type::BigInt, Value::BigInt(v)) => format!("cast({} as BIGINT)", v),
        (Type::Real, Value::Real(v)) => floating_sql(*v as f64, ty),
        (Type::Double, Value::Double(v)) => floating_sql(*v, ty),
        (Type::Varchar, Value::Varchar(v)) => quote_string(v),
        (Type::Varbinary, Value::Varbinary(v)) => format!("X'{}'", hex(v)),
        (Type::Date, Value::Date(days)) => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
            let date = epoch.checked_add_signed(Duration::days(*days as i64))?;
            format!("DATE '{}'", date.format("%Y-%m-%d"))
        }
        (Type::Decimal { scale, .. }, Value::Decimal(unscaled)) => {
            format!("cast({} as {})", quote_string(&decimal_text(*unscaled, *scale)), ty.to_sql())
        }
        _ => return None,
    };
    Some(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use refq_common::RowType;

    fn int(name: &str) -> TypedExpr {
        TypedExpr::field(name, Type::Integer)
    }

    #[test]
    fn test_operators_are_parenthesized() {
        let sum = TypedExpr::call("plus", Type::Integer, vec![int("c0"), int("c1")]);
        let product = TypedExpr::call("multiply", Type::Integer, vec![sum, int("c2")]);
        assert_eq!(to_expr_sql(&product).unwrap(), "((c0 + c1) * c2)");

        let cmp = TypedExpr::call("distinct_from", Type::Boolean, vec![int("c0"), int("c1")]);
        assert_eq!(to_expr_sql(&cmp).unwrap(), "(c0 IS DISTINCT FROM c1)");

        let and = TypedExpr::call(
            "and",
            Type::Boolean,
            vec![
                TypedExpr::call("lt", Type::Boolean, vec![int("c0"), int("c1")]),
                TypedExpr::call("neq", Type::Boolean, vec![int("c1"), int("c2")]),
                TypedExpr::call("is_null", Type::Boolean, vec![int("c2")]),
            ],
        );
        assert_eq!(to_expr_sql(&and).unwrap(), "((c0 < c1) AND (c1 <> c2) AND (c2 IS NULL))");
    }

    #[test]
    fn test_special_forms() {
        let varchar = |name: &str| TypedExpr::field(name, Type::Varchar);
        let like = TypedExpr::call(
            "like",
            Type::Boolean,
            vec![varchar("s"), varchar("p"), TypedExpr::constant(Type::Varchar, Value::Varchar("#".to_string()))],
        );
        assert_eq!(to_expr_sql(&like).unwrap(), "(s LIKE p ESCAPE '#')");

        let between = TypedExpr::call("between", Type::Boolean, vec![int("a"), int("b"), int("c")]);
        assert_eq!(to_expr_sql(&between).unwrap(), "(a BETWEEN b AND c)");

        let in_list = TypedExpr::call("in", Type::Boolean, vec![int("a"), int("b"), int("c")]);
        assert_eq!(to_expr_sql(&in_list).unwrap(), "(a IN (b, c))");

        let switch = TypedExpr::call(
            "switch",
            Type::Integer,
            vec![TypedExpr::field("p", Type::Boolean), int("a"), int("b")],
        );
        assert_eq!(to_expr_sql(&switch).unwrap(), "CASE WHEN p THEN a ELSE b END");

        let array = TypedExpr::call("array_constructor", Type::Array(Box::new(Type::Integer)), vec![int("a"), int("b")]);
        let subscript = TypedExpr::call("subscript", Type::Integer, vec![array, int("i")]);
        assert_eq!(to_expr_sql(&subscript).unwrap(), "ARRAY[a, b][i]");

        let generic = TypedExpr::call("coalesce", Type::Integer, vec![int("a"), TypedExpr::null(Type::Integer)]);
        assert_eq!(to_expr_sql(&generic).unwrap(), "coalesce(a, cast(null as INTEGER))");
    }

    #[test]
    fn test_casts_and_concat() {
        assert_eq!(
            to_expr_sql(&TypedExpr::try_cast(int("c0"), Type::Varchar)).unwrap(),
            "try_cast(c0 as VARCHAR)"
        );
        let row_type = Type::Row(RowType::from_fields(vec![("x", Type::Integer), ("y", Type::Integer)]));
        let concat = TypedExpr::Concat {
            inputs: vec![int("a"), int("b")],
            ty: row_type.clone(),
        };
        assert_eq!(to_expr_sql(&concat).unwrap(), "cast(row(a, b) as ROW(x INTEGER, y INTEGER))");

        let deref = TypedExpr::Dereference {
            input: Box::new(TypedExpr::field("r", row_type)),
            name: "x".to_string(),
            ty: Type::Integer,
        };
        assert_eq!(to_expr_sql(&deref).unwrap(), "r.x");
    }

    #[test]
    fn test_constants() {
        let sql = |ty: Type, value: Value| to_expr_sql(&TypedExpr::constant(ty, value)).unwrap();

        assert_eq!(sql(Type::Varchar, Value::Varchar("it's".to_string())), "'it''s'");
        assert_eq!(sql(Type::Varbinary, Value::Varbinary(vec![0x0a, 0xff])), "X'0AFF'");
        assert_eq!(sql(Type::Boolean, Value::Boolean(true)), "TRUE");
        assert_eq!(sql(Type::BigInt, Value::BigInt(-7)), "cast(-7 as BIGINT)");
        assert_eq!(sql(Type::Double, Value::Double(1.5)), "cast(1.5e0 as DOUBLE)");
        assert_eq!(sql(Type::Double, Value::Double(f64::NAN)), "cast(nan() as DOUBLE)");
        assert_eq!(sql(Type::Real, Value::Real(f32::NEG_INFINITY)), "cast(-infinity() as REAL)");
        assert_eq!(sql(Type::Date, Value::Date(19723)), "DATE '2024-01-01'");
        assert_eq!(
            sql(Type::Decimal { precision: 10, scale: 2 }, Value::Decimal(-12345)),
            "cast('-123.45' as DECIMAL(10, 2))"
        );
        assert_eq!(
            sql(Type::Decimal { precision: 5, scale: 3 }, Value::Decimal(7)),
            "cast('0.007' as DECIMAL(5, 3))"
        );
        assert_eq!(sql(Type::Unknown, Value::Null), "NULL");
    }

    #[test]
    fn test_unsupported_expressions() {
        assert!(to_expr_sql(&TypedExpr::null(Type::Timestamp)).is_none());
        assert!(to_expr_sql(&TypedExpr::null(Type::Array(Box::new(Type::Integer)))).is_none());
        assert!(to_expr_sql(&TypedExpr::constant(Type::Integer, Value::Varchar("1".to_string()))).is_none());

        let lambda = TypedExpr::Lambda {
            signature: RowType::from_fields(vec![("x", Type::Integer)]),
            body: Box::new(int("x")),
            ty: Type::Integer,
        };
        let call = TypedExpr::call("transform", Type::Integer, vec![int("a"), lambda]);
        assert!(to_expr_sql(&call).is_none());
    }
}
