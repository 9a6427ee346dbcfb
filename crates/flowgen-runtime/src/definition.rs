use flowgen_core::{ArgumentSpec, FieldType, Schema};
use serde::{Deserialize, Serialize};

/// Declared schemas of an Activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDefinition {
    pub name: String,
    #[serde(default)]
    pub settings: Schema,
    #[serde(default)]
    pub input: Schema,
    #[serde(default)]
    pub output: Schema,
}

/// Declared schemas of a Trigger. `handler` describes each handler's settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    pub name: String,
    #[serde(default)]
    pub settings: Schema,
    #[serde(default)]
    pub handler: Schema,
    #[serde(default)]
    pub output: Schema,
}

/// Declared signature of a Function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
    #[serde(rename = "returnType", default)]
    pub return_type: FieldType,
}
