//! Record contracts compiled from a [`Schema`].
//!
//! A [`Contract`] is the record type; a [`Record`] is one per-invocation
//! instance of it. `to_map` never fails. `from_map` walks fields in schema
//! order and stops at the first coercion failure.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ContractError;
use crate::typemap::{self, RepresentationType, TypeMapping, Usage};
use crate::types::{FieldType, Schema};
use crate::value::TypedValue;

/// One compiled record field.
#[derive(Debug, Clone)]
pub struct ContractField {
    /// Map key, exactly as declared.
    pub name: String,
    /// Exported identifier: the capitalized name, made valid as Rust.
    pub ident: String,
    pub field_type: FieldType,
    pub mapping: TypeMapping,
}

impl ContractField {
    pub fn representation(&self) -> RepresentationType {
        self.mapping.representation
    }
}

#[derive(Debug)]
struct ContractInner {
    name: String,
    fields: Vec<ContractField>,
}

/// A compiled record type. Cheap to clone; shared by every record built from it.
#[derive(Debug, Clone)]
pub struct Contract {
    inner: Arc<ContractInner>,
}

impl Contract {
    /// Compile a schema into a record contract.
    pub fn compile(name: impl Into<String>, schema: &Schema) -> Self {
        let fields = schema
            .fields()
            .iter()
            .map(|spec| ContractField {
                name: spec.name.clone(),
                ident: spec.ident(),
                field_type: spec.field_type,
                mapping: typemap::resolve(spec.field_type, Usage::Field),
            })
            .collect();
        Self {
            inner: Arc::new(ContractInner {
                name: name.into(),
                fields,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn fields(&self) -> &[ContractField] {
        &self.inner.fields
    }

    pub fn field(&self, name: &str) -> Option<&ContractField> {
        self.inner.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.inner.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.fields.is_empty()
    }

    /// A record with every field unset.
    pub fn new_record(&self) -> Record {
        Record {
            contract: self.clone(),
            values: vec![None; self.len()],
        }
    }

    /// Reconstruct a fully populated record from a raw map.
    ///
    /// On failure the partially filled record is dropped; it is never
    /// handed to the caller.
    pub fn from_map(&self, raw: &Map<String, Value>) -> Result<Record, ContractError> {
        let mut record = self.new_record();
        record.fill_from_map(raw)?;
        Ok(record)
    }

    fn index_of(&self, name: &str) -> Result<usize, ContractError> {
        self.inner
            .fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| ContractError::UnknownField {
                contract: self.name().to_string(),
                field: name.to_string(),
            })
    }
}

/// One instance of a [`Contract`].
#[derive(Debug, Clone)]
pub struct Record {
    contract: Contract,
    values: Vec<Option<TypedValue>>,
}

impl Record {
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Value of a field by its declared name. `None` if unknown or unset.
    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        let index = self.contract.index_of(name).ok()?;
        self.values[index].as_ref()
    }

    /// Value of a field by its exported identifier.
    pub fn get_by_ident(&self, ident: &str) -> Option<&TypedValue> {
        let index = self.contract.fields().iter().position(|f| f.ident == ident)?;
        self.values[index].as_ref()
    }

    /// Assign a field. The value must already be in the field's representation,
    /// and numbers must be finite so that `to_map` can project them.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<TypedValue>,
    ) -> Result<&mut Self, ContractError> {
        let index = self.contract.index_of(name)?;
        let value = value.into();
        let expected = self.contract.fields()[index].representation();
        if value.representation() != expected {
            return Err(ContractError::TypeMismatch {
                field: name.to_string(),
                expected,
                actual: value.representation(),
            });
        }
        if let Some(f) = value.as_f64().filter(|f| !f.is_finite()) {
            return Err(ContractError::NonFiniteNumber {
                field: name.to_string(),
                value: f,
            });
        }
        self.values[index] = Some(value);
        Ok(self)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether every field holds a value.
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    /// Project to a map keyed by declared field names, in schema order.
    /// Unset fields project their representation's zero value.
    pub fn to_map(&self) -> Map<String, Value> {
        self.contract
            .fields()
            .iter()
            .zip(&self.values)
            .map(|(field, value)| {
                let json = match value {
                    Some(v) => v.to_json(),
                    None => field.representation().zero_value().to_json(),
                };
                (field.name.clone(), json)
            })
            .collect()
    }

    /// Populate fields in schema order from a raw map.
    ///
    /// Missing keys are coerced from `null`. On the first coercion failure
    /// this returns immediately: earlier fields stay assigned, later fields
    /// are untouched, and the record must not be used further.
    pub fn fill_from_map(&mut self, raw: &Map<String, Value>) -> Result<(), ContractError> {
        for (index, field) in self.contract.inner.fields.iter().enumerate() {
            let value = raw.get(&field.name).unwrap_or(&Value::Null);
            let typed = field
                .mapping
                .apply(value)
                .map_err(|source| ContractError::FieldCoercion {
                    index,
                    field: field.name.clone(),
                    source,
                })?;
            self.values[index] = Some(typed);
        }
        Ok(())
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.contract.inner, &other.contract.inner) && self.values == other.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.contract.name(), Value::Object(self.to_map()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldSpec;
    use serde_json::json;

    fn contract(fields: &[(&str, FieldType)]) -> Contract {
        let schema = Schema::new(
            fields
                .iter()
                .map(|(n, t)| FieldSpec::new(*n, *t))
                .collect(),
        )
        .unwrap();
        Contract::compile("Input", &schema)
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn to_map_keeps_declared_names_and_order() {
        let c = contract(&[("zeta", FieldType::Int), ("alpha", FieldType::String)]);
        let mut record = c.new_record();
        record.set("zeta", 3i64).unwrap().set("alpha", "a").unwrap();

        let keys: Vec<_> = record.to_map().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(c.fields()[0].ident, "Zeta");
    }

    #[test]
    fn to_map_projects_zero_values_for_unset_fields() {
        let c = contract(&[
            ("s", FieldType::String),
            ("n", FieldType::Number),
            ("b", FieldType::Boolean),
            ("i", FieldType::Int),
            ("o", FieldType::Object),
        ]);
        let map = c.new_record().to_map();
        assert_eq!(
            Value::Object(map),
            json!({"s": "", "n": 0.0, "b": false, "i": 0, "o": {}})
        );
    }

    #[test]
    fn from_map_coerces_missing_keys_conservatively() {
        let c = contract(&[("name", FieldType::String), ("count", FieldType::Int)]);
        let record = c.from_map(&Map::new()).unwrap();
        assert_eq!(record.get("name"), Some(&TypedValue::from("")));
        assert_eq!(record.get("count"), Some(&TypedValue::Int64(0)));
        assert!(record.is_complete());
    }

    #[test]
    fn fill_stops_at_first_failure() {
        let c = contract(&[
            ("first", FieldType::String),
            ("second", FieldType::Int),
            ("third", FieldType::Boolean),
        ]);
        let raw = as_map(json!({"first": "ok", "second": "not a number", "third": true}));

        let mut record = c.new_record();
        let err = record.fill_from_map(&raw).unwrap_err();
        match err {
            ContractError::FieldCoercion { index, field, .. } => {
                assert_eq!(index, 1);
                assert_eq!(field, "second");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(record.is_set("first"));
        assert!(!record.is_set("second"));
        assert!(!record.is_set("third"));
        assert!(!record.is_complete());
    }

    #[test]
    fn set_rejects_wrong_representation() {
        let c = contract(&[("count", FieldType::Int)]);
        let mut record = c.new_record();
        let err = record.set("count", "three").unwrap_err();
        assert!(matches!(err, ContractError::TypeMismatch { .. }));
        let err = record.set("missing", 1i64).unwrap_err();
        assert!(matches!(err, ContractError::UnknownField { .. }));
    }

    #[test]
    fn set_rejects_non_finite_numbers() {
        let c = contract(&[("ratio", FieldType::Number)]);
        let mut record = c.new_record();
        for f in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let err = record.set("ratio", f).unwrap_err();
            assert!(matches!(err, ContractError::NonFiniteNumber { .. }));
        }
        assert!(!record.is_set("ratio"));
    }

    #[test]
    fn fallback_field_holds_objects() {
        let c = contract(&[("payload", FieldType::parse("blob"))]);
        let raw = as_map(json!({"payload": {"nested": [1, 2]}}));
        let record = c.from_map(&raw).unwrap();
        assert_eq!(record.to_map(), raw);
    }

    #[test]
    fn get_by_ident_uses_capitalized_name() {
        let c = contract(&[("anInputString", FieldType::String)]);
        let record = c
            .from_map(&as_map(json!({"anInputString": "hi"})))
            .unwrap();
        assert_eq!(record.get_by_ident("AnInputString"), Some(&TypedValue::from("hi")));
        assert_eq!(record.get_by_ident("anInputString"), None);
    }
}
