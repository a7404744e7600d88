// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Function signatures

use refq_common::Type;
use std::fmt;

/// Type in a function signature: a base name plus type parameters, which may
/// be type variables such as `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSignature {
    pub base_name: String,
    pub parameters: Vec<TypeSignature>,
}

impl TypeSignature {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameters(base_name: impl Into<String>, parameters: Vec<TypeSignature>) -> Self {
        Self {
            base_name: base_name.into(),
            parameters,
        }
    }

    /// True if this signature or any nested parameter has base name `name`,
    /// ignoring case.
    pub fn uses_type_name(&self, name: &str) -> bool {
        self.base_name.eq_ignore_ascii_case(name)
            || self.parameters.iter().any(|p| p.uses_type_name(name))
    }
}

impl From<&Type> for TypeSignature {
    fn from(ty: &Type) -> Self {
        TypeSignature {
            base_name: ty.base_name().to_string(),
            parameters: ty.children().into_iter().map(TypeSignature::from).collect(),
        }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_name)?;
        if !self.parameters.is_empty() {
            let params: Vec<String> = self.parameters.iter().map(|p| p.to_string()).collect();
            write!(f, "({})", params.join(","))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub return_type: TypeSignature,
    pub argument_types: Vec<TypeSignature>,
    pub variable_arity: bool,
}

impl FunctionSignature {
    pub fn new(return_type: TypeSignature, argument_types: Vec<TypeSignature>) -> Self {
        Self {
            return_type,
            argument_types,
            variable_arity: false,
        }
    }

    pub fn uses_type_name(&self, name: &str) -> bool {
        self.return_type.uses_type_name(name) || self.uses_input_type_name(name)
    }

    pub fn uses_input_type_name(&self, name: &str) -> bool {
        self.argument_types.iter().any(|t| t.uses_type_name(name))
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.argument_types.iter().map(|t| t.to_string()).collect();
        write!(
            f,
            "({}{}) -> {}",
            args.join(", "),
            if self.variable_arity { "..." } else { "" },
            self.return_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_type_name_is_nested_and_case_insensitive() {
        let sig = FunctionSignature::new(
            TypeSignature::new("bigint"),
            vec![TypeSignature::with_parameters(
                "array",
                vec![TypeSignature::with_parameters(
                    "map",
                    vec![TypeSignature::new("varchar"), TypeSignature::new("HugeInt")],
                )],
            )],
        );
        assert!(sig.uses_type_name("hugeint"));
        assert!(sig.uses_input_type_name("HUGEINT"));
        assert!(!sig.uses_type_name("json"));
        assert_eq!(sig.to_string(), "(array(map(varchar,HugeInt))) -> bigint");
    }

    #[test]
    fn test_from_type() {
        let ty = Type::Map(Box::new(Type::IntervalYearMonth), Box::new(Type::Json));
        let sig = TypeSignature::from(&ty);
        assert!(sig.uses_type_name("interval year to month"));
        assert!(sig.uses_type_name("json"));
    }
}
