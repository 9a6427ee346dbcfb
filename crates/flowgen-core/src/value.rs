use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

use crate::typemap::RepresentationType;

/// A value held in its representation type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Float64(f64),
    Bool(bool),
    Int64(i64),
    DateTime(DateTime<FixedOffset>),
    Object(Map<String, Value>),
    Any(Value),
}

impl TypedValue {
    pub fn representation(&self) -> RepresentationType {
        match self {
            TypedValue::String(_) => RepresentationType::String,
            TypedValue::Float64(_) => RepresentationType::Float64,
            TypedValue::Bool(_) => RepresentationType::Bool,
            TypedValue::Int64(_) => RepresentationType::Int64,
            TypedValue::DateTime(_) => RepresentationType::DateTime,
            TypedValue::Object(_) => RepresentationType::Object,
            TypedValue::Any(_) => RepresentationType::Any,
        }
    }

    /// Project into the host's loosely-typed form.
    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::String(s) => Value::String(s.clone()),
            TypedValue::Float64(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            TypedValue::Bool(b) => Value::Bool(*b),
            TypedValue::Int64(i) => Value::from(*i),
            TypedValue::DateTime(dt) => Value::String(dt.to_rfc3339()),
            TypedValue::Object(map) => Value::Object(map.clone()),
            TypedValue::Any(v) => v.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Float64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Int64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            TypedValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            TypedValue::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::String(s.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::String(s)
    }
}

impl From<f64> for TypedValue {
    fn from(f: f64) -> Self {
        TypedValue::Float64(f)
    }
}

impl From<i64> for TypedValue {
    fn from(i: i64) -> Self {
        TypedValue::Int64(i)
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Bool(b)
    }
}

impl From<Map<String, Value>> for TypedValue {
    fn from(map: Map<String, Value>) -> Self {
        TypedValue::Object(map)
    }
}

impl From<DateTime<FixedOffset>> for TypedValue {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        TypedValue::DateTime(dt)
    }
}
