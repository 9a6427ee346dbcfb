use flowgen_core::{Contract, Record};
use serde_json::{Map, Value};

use crate::error::RuntimeError;

/// Resolves raw configuration into a settings record.
///
/// Used for Activity settings and Trigger (handler) settings. This is a
/// separate path from a contract's `from_map`, which only serves
/// per-invocation Input/Output records.
pub trait SettingsResolver: Send + Sync {
    fn resolve(
        &self,
        raw: &Map<String, Value>,
        target: &Contract,
        strict: bool,
    ) -> Result<Record, RuntimeError>;
}

/// Default resolver driven by the contract's field metadata.
///
/// Every field is required: in strict mode a missing key fails resolution.
/// Present values are coerced with the contract's own type table.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataResolver;

impl SettingsResolver for MetadataResolver {
    fn resolve(
        &self,
        raw: &Map<String, Value>,
        target: &Contract,
        strict: bool,
    ) -> Result<Record, RuntimeError> {
        let mut record = target.new_record();
        for field in target.fields() {
            let value = match raw.get(&field.name) {
                Some(value) => value,
                None if strict => {
                    return Err(RuntimeError::SettingsResolution {
                        contract: target.name().to_string(),
                        field: field.name.clone(),
                        reason: "required value is missing".into(),
                    });
                }
                None => &Value::Null,
            };
            let typed = field
                .mapping
                .apply(value)
                .map_err(|e| RuntimeError::SettingsResolution {
                    contract: target.name().to_string(),
                    field: field.name.clone(),
                    reason: e.to_string(),
                })?;
            record.set(&field.name, typed)?;
        }
        Ok(record)
    }
}
