use serde_json::{Map, Value};

use crate::coerce;
use crate::error::{ContractError, SchemaError};
use crate::typemap::{self, RepresentationType, TypeMapping, Usage};
use crate::types::{ArgumentSpec, FieldSpec, FieldType, Schema};
use crate::value::TypedValue;

/// One positional parameter of a compiled signature.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub index: usize,
    pub name: String,
    pub arg_type: FieldType,
    pub mapping: TypeMapping,
}

/// Compiled function signature: positional parameter types plus declared
/// return type. Variadic functions are not supported.
#[derive(Debug, Clone)]
pub struct Signature {
    params: Vec<Parameter>,
    return_type: FieldType,
}

impl Signature {
    pub fn compile(args: &[ArgumentSpec], return_type: FieldType) -> Result<Self, SchemaError> {
        let schema = Schema::new(args.iter().cloned().map(FieldSpec::from).collect())?;
        let params = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(index, spec)| Parameter {
                index,
                name: spec.name.clone(),
                arg_type: spec.field_type,
                mapping: typemap::resolve(spec.field_type, Usage::Argument),
            })
            .collect();
        Ok(Self {
            params,
            return_type,
        })
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn return_type(&self) -> FieldType {
        self.return_type
    }

    /// Parameter representation types in declaration order, and the
    /// variadic flag (always `false`).
    pub fn sig(&self) -> (Vec<RepresentationType>, bool) {
        (
            self.params.iter().map(|p| p.mapping.representation).collect(),
            false,
        )
    }

    /// Validate arity, then coerce each parameter positionally.
    ///
    /// A count mismatch fails before any coercion. Coercion stops at the
    /// first failing parameter.
    pub fn coerce_params(&self, params: &[Value]) -> Result<Vec<TypedValue>, ContractError> {
        if params.len() != self.params.len() {
            return Err(ContractError::ArityMismatch {
                expected: self.params.len(),
                actual: params.len(),
            });
        }

        self.params
            .iter()
            .zip(params)
            .map(|(param, raw)| {
                param
                    .mapping
                    .apply(raw)
                    .map_err(|source| ContractError::ArgumentCoercion {
                        index: param.index,
                        argument: param.name.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// A stand-in result whose type matches the declared return type.
    pub fn placeholder_return(&self) -> TypedValue {
        placeholder(self.return_type)
    }
}

#[allow(clippy::approx_constant)]
pub fn placeholder(return_type: FieldType) -> TypedValue {
    match return_type {
        FieldType::String => TypedValue::from("function result"),
        FieldType::Int => TypedValue::Int64(42),
        FieldType::Number => TypedValue::Float64(3.14),
        FieldType::Boolean => TypedValue::Bool(true),
        FieldType::Object => TypedValue::Object(Map::new()),
        FieldType::DateTime => TypedValue::DateTime(coerce::epoch()),
        FieldType::Any => TypedValue::Any(Value::from("default result")),
    }
}
