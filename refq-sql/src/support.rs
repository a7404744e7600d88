// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Gates that let a fuzzer prune what it generates before compiling

use lazy_static::lazy_static;
use refq_common::{RowType, Type};
use refq_plan::{FunctionSignature, TypedExpr};
use std::collections::HashMap;

/// Constraints on generated input for one function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSpec {
    pub allow_nan: bool,
    pub allow_infinity: bool,
}

impl DataSpec {
    const fn new(allow_nan: bool, allow_infinity: bool) -> Self {
        Self {
            allow_nan,
            allow_infinity,
        }
    }
}

lazy_static! {
    // Functions whose results diverge at NaN / Infinity inputs
    static ref AGGREGATION_FUNCTION_DATA_SPECS: HashMap<&'static str, DataSpec> = {
        let mut specs = HashMap::new();
        for name in [
            "regr_avgx",
            "regr_avgy",
            "regr_r2",
            "regr_sxx",
            "regr_syy",
            "regr_sxy",
            "regr_slope",
            "regr_replacement",
        ] {
            specs.insert(name, DataSpec::new(false, false));
        }
        specs.insert("covar_pop", DataSpec::new(true, false));
        specs.insert("covar_samp", DataSpec::new(true, false));
        specs
    };

    static ref SUPPORTED_SCALAR_TYPES: Vec<Type> = vec![
        Type::Boolean,
        Type::TinyInt,
        Type::SmallInt,
        Type::Integer,
        Type::BigInt,
        Type::Real,
        Type::Double,
        Type::Varchar,
        Type::Varbinary,
        Type::Timestamp,
    ];
}

/// Scalar types the reference engine can take as generated input.
pub fn supported_scalar_types() -> &'static [Type] {
    &SUPPORTED_SCALAR_TYPES
}

pub fn aggregation_function_data_specs() -> &'static HashMap<&'static str, DataSpec> {
    &AGGREGATION_FUNCTION_DATA_SPECS
}

/// Types that cannot appear anywhere in a signature.
const UNSUPPORTED_TYPE_NAMES: &[&str] = &[
    "bingtile",
    "interval year to month",
    "hugeint",
    "hyperloglog",
    "tdigest",
];

/// Types that cannot be arguments: the reference engine requires valid
/// literals of them and cannot store them in input tables.
const UNSUPPORTED_INPUT_TYPE_NAMES: &[&str] = &["json", "ipaddress", "ipprefix", "uuid"];

/// Whether calls with this signature can be compared against the reference
/// engine. Type names match case-insensitively at any nesting depth.
pub fn is_supported_signature(signature: &FunctionSignature) -> bool {
    !(UNSUPPORTED_TYPE_NAMES
        .iter()
        .any(|name| signature.uses_type_name(name))
        || UNSUPPORTED_INPUT_TYPE_NAMES
            .iter()
            .any(|name| signature.uses_input_type_name(name)))
}

/// Whether a constant of `ty` has a literal whose meaning is the same in the
/// reference dialect.
pub fn is_constant_type_supported(ty: &Type) -> bool {
    ty.is_primitive()
        && !matches!(
            ty,
            Type::Timestamp
                | Type::Json
                | Type::IntervalDayTime
                | Type::IntervalYearMonth
                | Type::IpAddress
                | Type::IpPrefix
                | Type::Uuid
        )
}

/// Non-constant expressions are always accepted.
pub fn is_constant_expr_supported(expr: &TypedExpr) -> bool {
    match expr {
        TypedExpr::Constant { ty, .. } => is_constant_type_supported(ty),
        _ => true,
    }
}

/// Whether a column of `ty` can be stored in a materialized input table.
pub fn is_supported_storage_type(ty: &Type) -> bool {
    match ty {
        Type::Boolean
        | Type::TinyInt
        | Type::SmallInt
        | Type::Integer
        | Type::BigInt
        | Type::Real
        | Type::Double
        | Type::Varchar
        | Type::Varbinary
        | Type::Timestamp
        | Type::Date
        | Type::Decimal { .. } => true,
        Type::Array(element) => is_supported_storage_type(element),
        Type::Map(key, value) => {
            key.is_primitive() && is_supported_storage_type(key) && is_supported_storage_type(value)
        }
        Type::Row(row_type) => is_supported_storage_row(row_type),
        _ => false,
    }
}

pub fn is_supported_storage_row(row_type: &RowType) -> bool {
    row_type.types().iter().all(is_supported_storage_type)
}
