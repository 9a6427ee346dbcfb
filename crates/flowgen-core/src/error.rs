use thiserror::Error;

use crate::typemap::RepresentationType;

/// A single loosely-typed value could not be converted to its representation type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unable to coerce {value} to {target}{}", detail(.reason))]
pub struct CoercionError {
    /// Compact JSON rendering of the offending value.
    pub value: String,
    pub target: RepresentationType,
    pub reason: Option<String>,
}

impl CoercionError {
    pub fn new(value: &serde_json::Value, target: RepresentationType) -> Self {
        Self {
            value: value.to_string(),
            target,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

fn detail(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    #[error("unable to coerce field {index} ({field}): {source}")]
    FieldCoercion {
        index: usize,
        field: String,
        #[source]
        source: CoercionError,
    },

    #[error("expected {expected} parameters, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("unable to coerce parameter {index} ({argument}): {source}")]
    ArgumentCoercion {
        index: usize,
        argument: String,
        #[source]
        source: CoercionError,
    },

    #[error("contract {contract} has no field '{field}'")]
    UnknownField { contract: String, field: String },

    #[error("field {field} holds {expected}, not {actual}")]
    TypeMismatch {
        field: String,
        expected: RepresentationType,
        actual: RepresentationType,
    },

    #[error("field {field} cannot hold non-finite number {value}")]
    NonFiniteNumber { field: String, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("duplicate field name '{name}' at position {index}")]
    DuplicateField { name: String, index: usize },

    #[error("field names '{other}' and '{name}' both map to identifier {ident}")]
    IdentifierCollision {
        name: String,
        other: String,
        ident: String,
    },
}
