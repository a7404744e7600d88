// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Typed expressions

use crate::vector::Value;
use refq_common::{RowType, Type};
use std::fmt;

/// Reference to an input column
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Function call
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub inputs: Vec<TypedExpr>,
    pub ty: Type,
}

impl CallExpr {
    pub fn new(name: impl Into<String>, ty: Type, inputs: Vec<TypedExpr>) -> Self {
        Self {
            name: name.into(),
            inputs,
            ty,
        }
    }
}

/// Expression tree node; every node carries its result type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedExpr {
    FieldAccess(Field),
    /// Field `name` of a ROW-typed input
    Dereference {
        input: Box<TypedExpr>,
        name: String,
        ty: Type,
    },
    Call(CallExpr),
    Cast {
        input: Box<TypedExpr>,
        ty: Type,
        is_try: bool,
    },
    /// Builds a ROW from its inputs; `ty` names the fields.
    Concat {
        inputs: Vec<TypedExpr>,
        ty: Type,
    },
    Constant {
        ty: Type,
        value: Value,
    },
    Lambda {
        signature: RowType,
        body: Box<TypedExpr>,
        ty: Type,
    },
}

impl TypedExpr {
    pub fn field(name: impl Into<String>, ty: Type) -> Self {
        TypedExpr::FieldAccess(Field::new(name, ty))
    }

    pub fn call(name: impl Into<String>, ty: Type, inputs: Vec<TypedExpr>) -> Self {
        TypedExpr::Call(CallExpr::new(name, ty, inputs))
    }

    pub fn cast(input: TypedExpr, ty: Type) -> Self {
        TypedExpr::Cast {
            input: Box::new(input),
            ty,
            is_try: false,
        }
    }

    pub fn try_cast(input: TypedExpr, ty: Type) -> Self {
        TypedExpr::Cast {
            input: Box::new(input),
            ty,
            is_try: true,
        }
    }

    pub fn constant(ty: Type, value: Value) -> Self {
        TypedExpr::Constant { ty, value }
    }

    pub fn null(ty: Type) -> Self {
        TypedExpr::Constant {
            ty,
            value: Value::Null,
        }
    }

    pub fn ty(&self) -> &Type {
        match self {
            TypedExpr::FieldAccess(field) => &field.ty,
            TypedExpr::Dereference { ty, .. }
            | TypedExpr::Cast { ty, .. }
            | TypedExpr::Concat { ty, .. }
            | TypedExpr::Constant { ty, .. }
            | TypedExpr::Lambda { ty, .. } => ty,
            TypedExpr::Call(call) => &call.ty,
        }
    }

    pub fn inputs(&self) -> Vec<&TypedExpr> {
        match self {
            TypedExpr::FieldAccess(_) | TypedExpr::Constant { .. } => Vec::new(),
            TypedExpr::Dereference { input, .. } | TypedExpr::Cast { input, .. } => vec![input.as_ref()],
            TypedExpr::Call(call) => call.inputs.iter().collect(),
            TypedExpr::Concat { inputs, .. } => inputs.iter().collect(),
            TypedExpr::Lambda { body, .. } => vec![body.as_ref()],
        }
    }
}

/// Sort direction and null placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub ascending: bool,
    pub nulls_first: bool,
}

impl SortOrder {
    pub const ASC_NULLS_FIRST: SortOrder = SortOrder { ascending: true, nulls_first: true };
    pub const ASC_NULLS_LAST: SortOrder = SortOrder { ascending: true, nulls_first: false };
    pub const DESC_NULLS_FIRST: SortOrder = SortOrder { ascending: false, nulls_first: true };
    pub const DESC_NULLS_LAST: SortOrder = SortOrder { ascending: false, nulls_first: false };
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} NULLS {}",
            if self.ascending { "ASC" } else { "DESC" },
            if self.nulls_first { "FIRST" } else { "LAST" }
        )
    }
}
