use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coerce;
use crate::error::CoercionError;
use crate::types::FieldType;
use crate::value::TypedValue;

/// Concrete type a declared field is held in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentationType {
    String,
    Float64,
    Bool,
    Int64,
    DateTime,
    Object,
    Any,
}

impl RepresentationType {
    /// The value an unset field of this type projects to.
    pub fn zero_value(&self) -> TypedValue {
        match self {
            RepresentationType::String => TypedValue::String(String::new()),
            RepresentationType::Float64 => TypedValue::Float64(0.0),
            RepresentationType::Bool => TypedValue::Bool(false),
            RepresentationType::Int64 => TypedValue::Int64(0),
            RepresentationType::DateTime => TypedValue::DateTime(coerce::epoch()),
            RepresentationType::Object => TypedValue::Object(Map::new()),
            RepresentationType::Any => TypedValue::Any(Value::Null),
        }
    }

    /// Rust type used when rendering generated source.
    pub fn rust_type(&self) -> &'static str {
        match self {
            RepresentationType::String => "String",
            RepresentationType::Float64 => "f64",
            RepresentationType::Bool => "bool",
            RepresentationType::Int64 => "i64",
            RepresentationType::DateTime => "chrono::DateTime<chrono::FixedOffset>",
            RepresentationType::Object => "serde_json::Map<String, serde_json::Value>",
            RepresentationType::Any => "serde_json::Value",
        }
    }
}

impl fmt::Display for RepresentationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepresentationType::String => "string",
            RepresentationType::Float64 => "float64",
            RepresentationType::Bool => "bool",
            RepresentationType::Int64 => "int64",
            RepresentationType::DateTime => "datetime",
            RepresentationType::Object => "object",
            RepresentationType::Any => "any",
        };
        f.write_str(name)
    }
}

/// Where a declared type is used. Datetime resolves differently in each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Usage {
    /// A Settings, Input, Output or HandlerSettings record field.
    Field,
    /// A positional function argument.
    Argument,
}

pub type CoerceFn = fn(&Value) -> Result<TypedValue, CoercionError>;

/// Resolved representation and coercion for one declared type.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapping {
    pub representation: RepresentationType,
    pub coerce: CoerceFn,
    /// Name of the coercion routine, for rendering and diagnostics.
    pub coerce_name: &'static str,
}

impl TypeMapping {
    const fn new(
        representation: RepresentationType,
        coerce: CoerceFn,
        coerce_name: &'static str,
    ) -> Self {
        Self {
            representation,
            coerce,
            coerce_name,
        }
    }

    pub fn apply(&self, raw: &Value) -> Result<TypedValue, CoercionError> {
        (self.coerce)(raw)
    }
}

/// Total lookup from declared type to representation and coercion.
pub fn resolve(field_type: FieldType, usage: Usage) -> TypeMapping {
    use RepresentationType as R;

    match (field_type, usage) {
        (FieldType::String, _) => TypeMapping::new(R::String, coerce::to_string, "to_string"),
        (FieldType::Number, _) => TypeMapping::new(R::Float64, coerce::to_float64, "to_float64"),
        (FieldType::Boolean, _) => TypeMapping::new(R::Bool, coerce::to_bool, "to_bool"),
        (FieldType::Int, _) => TypeMapping::new(R::Int64, coerce::to_int64, "to_int64"),
        // Records keep datetimes as plain strings; only arguments get structure.
        (FieldType::DateTime, Usage::Field) => {
            TypeMapping::new(R::String, coerce::to_string, "to_string")
        }
        (FieldType::DateTime, Usage::Argument) => {
            TypeMapping::new(R::DateTime, coerce::to_datetime, "to_datetime")
        }
        (FieldType::Object, _) => TypeMapping::new(R::Object, coerce::to_object, "to_object"),
        // Explicit fallback for anything outside the declared set.
        (FieldType::Any, Usage::Field) => {
            TypeMapping::new(R::Object, coerce::to_object, "to_object")
        }
        (FieldType::Any, Usage::Argument) => {
            TypeMapping::new(R::Any, coerce::passthrough, "passthrough")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_table() {
        let expected = [
            (FieldType::String, RepresentationType::String),
            (FieldType::Number, RepresentationType::Float64),
            (FieldType::Boolean, RepresentationType::Bool),
            (FieldType::Int, RepresentationType::Int64),
            (FieldType::DateTime, RepresentationType::String),
            (FieldType::Object, RepresentationType::Object),
            (FieldType::Any, RepresentationType::Object),
        ];
        for (declared, repr) in expected {
            assert_eq!(resolve(declared, Usage::Field).representation, repr, "{declared}");
        }
    }

    #[test]
    fn datetime_is_structured_only_as_argument() {
        let field = resolve(FieldType::DateTime, Usage::Field);
        let arg = resolve(FieldType::DateTime, Usage::Argument);
        assert_eq!(field.coerce_name, "to_string");
        assert_eq!(arg.representation, RepresentationType::DateTime);
        assert_eq!(arg.coerce_name, "to_datetime");
    }

    #[test]
    fn unknown_type_falls_back_to_object_field() {
        let mapping = resolve(FieldType::parse("money"), Usage::Field);
        assert_eq!(mapping.representation, RepresentationType::Object);
        assert!(mapping.apply(&Value::Null).unwrap().as_object().unwrap().is_empty());
    }

    #[test]
    fn any_argument_passes_through() {
        let mapping = resolve(FieldType::Any, Usage::Argument);
        let raw = serde_json::json!([1, "two"]);
        assert_eq!(mapping.apply(&raw).unwrap(), TypedValue::Any(raw));
    }

    #[test]
    fn zero_values_match_representation() {
        for t in FieldType::ALL {
            for usage in [Usage::Field, Usage::Argument] {
                let repr = resolve(t, usage).representation;
                assert_eq!(repr.zero_value().representation(), repr);
            }
        }
    }
}
